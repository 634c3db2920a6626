//! Register a local file as an artifact, e.g. the raw listings download.

use std::path::PathBuf;

use anyhow::{Context, Result};
use basic_cleaning::artifact::{Artifact, ArtifactStore, LocalArtifactStore};
use clap::Parser;

#[derive(Parser)]
#[command(name = "log-artifact", version, about, long_about = None)]
struct Cli {
    /// File to register
    file: PathBuf,

    /// Artifact name (defaults to the file name)
    #[arg(long)]
    name: Option<String>,

    /// Artifact type
    #[arg(long = "type", default_value = "raw_data")]
    artifact_type: String,

    /// Artifact description
    #[arg(long, default_value = "")]
    description: String,

    /// Root directory of the artifact store (created if missing)
    #[arg(long, env = "CLEANING_ARTIFACT_ROOT", default_value = "artifacts")]
    artifact_root: PathBuf,
}

fn run(cli: Cli) -> Result<()> {
    let name = match cli.name {
        Some(name) => name,
        None => cli
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("{} has no file name", cli.file.display()))?,
    };

    let store = LocalArtifactStore::create(&cli.artifact_root)
        .with_context(|| format!("opening store at {}", cli.artifact_root.display()))?;
    let manifest = store
        .log_artifact(&Artifact::new(name, cli.artifact_type, cli.description, cli.file))
        .context("uploading artifact")?;

    log::info!("Logged {} ({})", manifest.reference(), manifest.digest);
    println!("{}", manifest.reference());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
