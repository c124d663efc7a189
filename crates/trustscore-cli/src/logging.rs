//! Log setup driven by `LOG_LEVEL` and `LOG_FILE`.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_LEVEL_ENV_VAR: &str = "LOG_LEVEL";
pub const LOG_FILE_ENV_VAR: &str = "LOG_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// 0 = silent, 1 = info, 2 = debug.
    pub level: u8,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env(debug: bool) -> Self {
        let level = if debug {
            2
        } else {
            parse_level(std::env::var(LOG_LEVEL_ENV_VAR).ok().as_deref())
        };
        let file = std::env::var(LOG_FILE_ENV_VAR)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        Self { level, file }
    }

    fn directive(&self) -> &'static str {
        match self.level {
            0 => "off",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Unset or unparseable values mean silent; anything above 2 means debug.
pub fn parse_level(raw: Option<&str>) -> u8 {
    raw.and_then(|v| v.trim().parse::<u8>().ok()).map_or(0, |v| v.min(2))
}

/// Install the global subscriber. The log file is truncated even when
/// logging is silent.
pub fn init(settings: &LogSettings) -> Result<()> {
    let file = match &settings.file {
        Some(path) => Some(
            File::create(path).with_context(|| format!("cannot open log file {}", path.display()))?,
        ),
        None => None,
    };

    if settings.level == 0 {
        return Ok(());
    }

    let filter = EnvFilter::new(settings.directive());
    let installed = match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install log subscriber: {}", e))
}
