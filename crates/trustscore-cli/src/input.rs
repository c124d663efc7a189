//! URL file parsing.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::debug;

/// One model to score, with its optional dataset and code links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub code: Option<String>,
    pub dataset: Option<String>,
    pub model: String,
}

pub fn read_url_file(path: &Path) -> Result<Vec<UrlEntry>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read URL file {}", path.display()))?;
    parse_url_lines(&contents)
}

/// Parse `code_url,dataset_url,model_url` lines.
///
/// Lines without a comma or without a model URL are skipped. A blank dataset
/// inherits the most recent dataset seen. More than three fields is an error.
pub fn parse_url_lines(contents: &str) -> Result<Vec<UrlEntry>> {
    let mut entries = Vec::new();
    let mut last_dataset: Option<String> = None;

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || !line.contains(',') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() > 3 {
            bail!("line {}: too many fields in {:?}", number + 1, line);
        }
        let field = |i: usize| fields.get(i).copied().filter(|f| !f.is_empty());

        let Some(model) = field(2) else {
            debug!("line {}: no model URL, skipping", number + 1);
            continue;
        };
        if let Some(dataset) = field(1) {
            last_dataset = Some(dataset.to_string());
        }

        entries.push(UrlEntry {
            code: field(0).map(str::to_string),
            dataset: last_dataset.clone(),
            model: model.to_string(),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "https://huggingface.co/google-bert/bert-base-uncased";
    const DATASET: &str = "https://huggingface.co/datasets/bookcorpus/bookcorpus";
    const CODE: &str = "https://github.com/google-research/bert";

    #[test]
    fn test_full_line() {
        let entries = parse_url_lines(&format!("{CODE},{DATASET},{MODEL}\n")).unwrap();
        assert_eq!(
            entries,
            vec![UrlEntry {
                code: Some(CODE.into()),
                dataset: Some(DATASET.into()),
                model: MODEL.into(),
            }]
        );
    }

    #[test]
    fn test_dataset_carries_forward() {
        let text = format!(",{DATASET},{MODEL}\n\n,,https://huggingface.co/openai/whisper-tiny\n");
        let entries = parse_url_lines(&text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].dataset.as_deref(), Some(DATASET));
        assert_eq!(entries[1].code, None);
    }

    #[test]
    fn test_lines_without_model_are_skipped() {
        let text = format!("{CODE},{DATASET},\n{MODEL}\n");
        assert!(parse_url_lines(&text).unwrap().is_empty());
    }

    #[test]
    fn test_skipped_line_still_sets_dataset() {
        let text = format!(",{DATASET},\n,,{MODEL}\n");
        let entries = parse_url_lines(&text).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].dataset, None);
    }

    #[test]
    fn test_too_many_fields() {
        let err = parse_url_lines("a,b,c,d\n").unwrap_err();
        assert!(err.to_string().contains("too many fields"));
    }

    #[test]
    fn test_read_url_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, format!(",,{MODEL}\n")).unwrap();
        assert_eq!(read_url_file(&path).unwrap().len(), 1);
        assert!(read_url_file(&dir.path().join("missing.txt")).is_err());
    }
}
