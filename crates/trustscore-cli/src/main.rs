//! TrustScore CLI - scores every model listed in a URL file.
//!
//! Each input line is `code_url,dataset_url,model_url`. One JSON score record
//! per model is written to stdout (NDJSON); logs go to stderr or `LOG_FILE`.

mod input;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use trustscore_core::{
    ArtifactCatalog, Collaborators, Credentials, ModelTarget, RegistryFileCatalog, ScoringConfig,
    ScoringEngine, StaticCatalog,
};

#[derive(Parser, Debug)]
#[command(name = "trustscore")]
#[command(about = "Score ML model artifacts and print one NDJSON record per model")]
struct Args {
    /// Text file with one `code_url,dataset_url,model_url` entry per line
    url_file: PathBuf,

    /// Artifact registry (JSON) consulted for lineage
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Scoring configuration (JSON); missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging (overrides LOG_LEVEL)
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init(&logging::LogSettings::from_env(args.debug)) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Score every entry; `Ok(false)` when at least one model could not be scored.
async fn run(args: Args) -> Result<bool> {
    let entries = input::read_url_file(&args.url_file)?;

    let config = match &args.config {
        Some(path) => ScoringConfig::from_json_file(path)
            .with_context(|| format!("invalid scoring config {}", path.display()))?,
        None => ScoringConfig::default(),
    };
    let catalog: Arc<dyn ArtifactCatalog> = match &args.registry {
        Some(path) => Arc::new(RegistryFileCatalog::new(path)),
        None => Arc::new(StaticCatalog::empty()),
    };
    let engine = ScoringEngine::builder(Collaborators::live(catalog)?)
        .config(config)
        .build()?;
    let credentials = Credentials::from_env();

    info!("Scoring {} models from {}", entries.len(), args.url_file.display());
    let mut all_scored = true;
    for entry in entries {
        let target = match ModelTarget::parse(&entry.model, entry.dataset.as_deref(), entry.code.as_deref()) {
            Ok(target) => target,
            Err(e) => {
                error!("Skipping {}: {}", entry.model, e);
                all_scored = false;
                continue;
            }
        };

        match engine.evaluate(&target, &credentials).await {
            Ok(record) => println!("{}", serde_json::to_string(&record)?),
            Err(e) => {
                error!("Failed to score {}: {}", entry.model, e);
                all_scored = false;
            }
        }
    }

    Ok(all_scored)
}
