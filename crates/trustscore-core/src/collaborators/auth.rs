//! Credential and token resolution.
//!
//! The completion credential is supplied per evaluation. Hub and GitHub
//! tokens are optional and resolved once from the environment when the live
//! collaborators are built.

use std::fmt;
use tracing::debug;

/// HuggingFace environment variable for authentication tokens.
const HF_TOKEN_ENV_VAR: &str = "HF_TOKEN";

/// GitHub environment variable for authentication tokens.
const GITHUB_TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Environment variable holding the completion API key.
const API_KEY_ENV_VAR: &str = "API_KEY";

/// Credential forwarded to the completion collaborator.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    api_key: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        Self {
            api_key: (!key.trim().is_empty()).then(|| key.trim().to_string()),
        }
    }

    /// No credential; completion calls will be unauthenticated.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Read the key from `API_KEY`.
    pub fn from_env() -> Self {
        match non_empty_env(API_KEY_ENV_VAR) {
            Some(key) => Self::new(key),
            None => {
                debug!("{} not set, completions will be unauthenticated", API_KEY_ENV_VAR);
                Self::anonymous()
            }
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Resolve a HuggingFace token.
///
/// Checks in order:
/// 1. `HF_TOKEN` environment variable
/// 2. HuggingFace CLI cache (`~/.cache/huggingface/token`)
pub fn resolve_hf_token() -> Option<String> {
    if let Some(token) = non_empty_env(HF_TOKEN_ENV_VAR) {
        debug!("Using HuggingFace token from {}", HF_TOKEN_ENV_VAR);
        return Some(token);
    }

    let path = dirs::home_dir()?.join(".cache").join("huggingface").join("token");
    let token = std::fs::read_to_string(path).ok()?;
    let token = token.trim().to_string();
    if token.is_empty() {
        None
    } else {
        debug!("Using HuggingFace token from CLI cache");
        Some(token)
    }
}

/// Resolve a GitHub token from `GITHUB_TOKEN`.
pub fn resolve_github_token() -> Option<String> {
    non_empty_env(GITHUB_TOKEN_ENV_VAR)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
