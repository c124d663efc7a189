//! Model-card text signal extractors.
//!
//! Pure functions over Markdown text. Headings inside fenced code blocks are
//! ignored, so a `# comment` in a Python snippet never opens a section.

use regex::Regex;
use std::sync::LazyLock;

/// ATX heading: `## Title` with optional closing hashes.
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})[ \t]*(.+?)[ \t]*#*[ \t]*$").unwrap());

/// Fenced Python block, capturing the body.
static PYTHON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*(?i:python|py|pycon|python3)[^\n]*\n(.*?)```").unwrap()
});

/// Interactive-session prompt marker.
static REPL_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(>>>|\.\.\.)[ \t]?").unwrap());

/// Statement that opens a runnable demo.
static IMPORT_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(import|from)\s+\w+").unwrap());

/// First training-data keyword in free text, for the fallback window.
static DATA_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(training data|datasets?|data sets?)").unwrap());

/// Heading title that marks a training-data section. A bare "data" only
/// counts as a whole word that ends the title or precedes a connector, so
/// "Metadata" and "Data Collator" do not qualify.
static DATA_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:training[ \t]+(?:data|sets?)|datasets?|data[ \t]+sets?)\b|\bdata[ \t]*(?:$|[:(&/,-]|and\b|sources?\b|used\b)",
    )
    .unwrap()
});

/// Characters kept before the first keyword when no heading matches.
const FALLBACK_BEFORE: usize = 200;
/// Characters kept after the first keyword when no heading matches.
const FALLBACK_AFTER: usize = 1200;

/// A Markdown heading with byte offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    /// Offset of the `#` that opens the heading line.
    pub start: usize,
    /// Offset just past the heading line (including its newline).
    pub body_start: usize,
}

/// Every heading outside fenced code blocks, in document order.
pub fn headings(text: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut in_fence = false;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        if content.trim_start().starts_with("```") || content.trim_start().starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        if let Some(caps) = HEADING.captures(content) {
            found.push(Heading {
                level: caps[1].len(),
                title: caps[2].trim().to_string(),
                start,
                body_start: offset,
            });
        }
    }

    found
}

/// Byte offset where the section opened by `headings[index]` ends: the next
/// heading of equal or higher level, or the end of the text.
fn section_end(text: &str, headings: &[Heading], index: usize) -> usize {
    let level = headings[index].level;
    headings[index + 1..]
        .iter()
        .find(|h| h.level <= level)
        .map(|h| h.start)
        .unwrap_or(text.len())
}

/// Body of the first section whose heading title satisfies `matches`,
/// excluding the heading line itself.
pub fn section_body<'a>(text: &'a str, matches: impl Fn(&str) -> bool) -> Option<&'a str> {
    let all = headings(text);
    let index = all.iter().position(|h| matches(&h.title.to_lowercase()))?;
    Some(&text[all[index].body_start..section_end(text, &all, index)])
}

/// Body of the "License" section, if the card has one.
pub fn license_section(text: &str) -> Option<&str> {
    section_body(text, |title| matches!(title, "license" | "licence" | "licensing"))
}

/// Case-insensitive substring match of any allow-listed license identifier.
pub fn license_matches(text: &str, allow_list: &[String]) -> bool {
    let lower = text.to_lowercase();
    allow_list
        .iter()
        .any(|lic| !lic.is_empty() && lower.contains(&lic.to_lowercase()))
}

/// Excerpt describing the training data.
///
/// Prefers the first section whose heading mentions data, including its
/// heading line. Otherwise falls back to a window around the first keyword
/// occurrence anywhere in the text.
pub fn training_data_excerpt(text: &str) -> Option<&str> {
    let all = headings(text);
    if let Some(index) = all.iter().position(|h| DATA_HEADING.is_match(&h.title)) {
        return Some(&text[all[index].start..section_end(text, &all, index)]);
    }

    let found = DATA_KEYWORD.find(text)?;
    let start = floor_char_boundary(text, found.start().saturating_sub(FALLBACK_BEFORE));
    let end = floor_char_boundary(text, (found.end() + FALLBACK_AFTER).min(text.len()));
    Some(&text[start..end])
}

/// Demo snippets that look like an interactive session.
///
/// Only `>>>` and `...` lines are kept, with the prompt stripped; a block
/// qualifies when the stripped code starts with an import statement.
pub fn demo_code_blocks(text: &str) -> Vec<String> {
    PYTHON_FENCE
        .captures_iter(text)
        .filter_map(|caps| {
            let cleaned = caps[1]
                .lines()
                .map(str::trim)
                .filter(|line| REPL_PREFIX.is_match(line))
                .map(|line| REPL_PREFIX.replace(line, "").into_owned())
                .collect::<Vec<_>>()
                .join("\n");
            let cleaned = cleaned.trim();
            IMPORT_START.is_match(cleaned).then(|| cleaned.to_string())
        })
        .collect()
}

/// Truncate to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow() -> Vec<String> {
        ["mit", "bsd", "lgpl", "apache-2.0"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_license_section_bounded_by_next_heading() {
        let card = "# Model\nintro\n## License\nMIT\n## Other\napache-2.0 mentioned elsewhere\n";
        assert_eq!(license_section(card), Some("MIT\n"));
    }

    #[test]
    fn test_license_section_includes_deeper_subsections() {
        let card = "## License\n### Details\nBSD-3-Clause\n## Citation\n";
        let section = license_section(card).unwrap();
        assert!(section.contains("BSD-3-Clause"));
        assert!(!section.contains("Citation"));
    }

    #[test]
    fn test_no_license_heading() {
        assert_eq!(license_section("# Model\nLicensed under MIT.\n"), None);
    }

    #[test]
    fn test_headings_inside_code_fences_ignored() {
        let card = "## Usage\n```python\n# License\nprint(1)\n```\n## License\nlgpl\n";
        let all = headings(card);
        assert_eq!(all.len(), 2);
        assert_eq!(license_section(card), Some("lgpl\n"));
    }

    #[test]
    fn test_license_matches_case_insensitive() {
        assert!(license_matches("Released under the MIT License", &allow()));
        assert!(license_matches("APACHE-2.0", &allow()));
        assert!(!license_matches("cc-by-nc-4.0", &allow()));
    }

    #[test]
    fn test_training_data_heading() {
        let card = "# Intro\nhi\n## Training Data\nWikipedia and BookCorpus.\n### Preprocessing\nlowercased\n## Evaluation\nGLUE\n";
        let excerpt = training_data_excerpt(card).unwrap();
        assert!(excerpt.starts_with("## Training Data"));
        assert!(excerpt.contains("Preprocessing"));
        assert!(!excerpt.contains("GLUE"));
    }

    #[test]
    fn test_data_heading_needs_whole_word() {
        for title in ["Training Data", "Data", "Datasets", "Data Sources", "Training and evaluation data", "Data: overview"] {
            assert!(DATA_HEADING.is_match(title), "{title}");
        }
        for title in ["Metadata", "Data Collator", "Model Details", "Update log"] {
            assert!(!DATA_HEADING.is_match(title), "{title}");
        }

        let card = "# Model\n## Metadata\nlibrary: transformers\n## Data Collator\npads batches\n## Training Data\nWikipedia dump.\n";
        let excerpt = training_data_excerpt(card).unwrap();
        assert!(excerpt.starts_with("## Training Data"));
        assert!(!excerpt.contains("pads batches"));
    }

    #[test]
    fn test_training_data_fallback_window() {
        let prefix = "x".repeat(500);
        let suffix = "y".repeat(2000);
        let card = format!("{prefix} trained on the Pile dataset {suffix}");
        let excerpt = training_data_excerpt(&card).unwrap();
        assert!(excerpt.contains("dataset"));
        assert!(excerpt.len() <= FALLBACK_BEFORE + FALLBACK_AFTER + "dataset".len());
    }

    #[test]
    fn test_training_data_absent() {
        assert_eq!(training_data_excerpt("# Model\nA small model.\n"), None);
    }

    #[test]
    fn test_demo_blocks_keep_repl_lines() {
        let card = "```python\n>>> from transformers import pipeline\n>>> nlp = pipeline('fill-mask')\nOutput line\n```\n\
                    ```python\nimport torch\n```\n\
                    ```python\n>>> print('no import')\n```\n";
        let blocks = demo_code_blocks(card);
        assert_eq!(blocks, vec!["from transformers import pipeline\nnlp = pipeline('fill-mask')".to_string()]);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
