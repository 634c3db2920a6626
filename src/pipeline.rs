use anyhow::{Context, Result};

use crate::artifact::{Artifact, ArtifactManifest, ArtifactRef, ArtifactStore};
use crate::config::CleaningConfig;
use crate::data::filter::{clean, CleaningReport};
use crate::data::{loader, writer};
use crate::run::{Run, RunRecord};

pub const JOB_TYPE: &str = "basic_cleaning";

/// Outcome of one cleaning run.
#[derive(Debug, Clone)]
pub struct CleaningSummary {
    pub report: CleaningReport,
    pub artifact: ArtifactManifest,
    pub run: RunRecord,
}

/// Download the input artifact, clean it, and log the cleaned table.
///
/// A malformed input table fails before anything is written.
pub fn go(store: &dyn ArtifactStore, cfg: &CleaningConfig) -> Result<CleaningSummary> {
    let input: ArtifactRef = cfg
        .input_artifact
        .parse()
        .context("parsing input artifact")?;
    crate::artifact::validate_name(&cfg.output_artifact).context("parsing output artifact")?;

    let mut run = Run::init(store, JOB_TYPE, cfg)?;

    let resolved = run
        .use_artifact(&input)
        .with_context(|| format!("fetching {input}"))?;
    let df = loader::load_file(&resolved.path)
        .with_context(|| format!("loading {}", resolved.path.display()))?;
    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        df.len(),
        df.columns,
        resolved.manifest.reference()
    );

    let (df, report) = clean(&df, cfg.price_range()).context("cleaning dataset")?;

    let tmp_artifact_path = cfg.tmp_directory.join(&cfg.output_artifact);
    writer::write_delimited(&df, &tmp_artifact_path)?;
    log::info!("Temporary artifact saved to {}", tmp_artifact_path.display());

    let artifact = Artifact::new(
        cfg.output_artifact.as_str(),
        cfg.output_type.as_str(),
        cfg.output_description.as_str(),
        &tmp_artifact_path,
    );
    let manifest = run
        .log_artifact(&artifact)
        .with_context(|| format!("uploading {}", cfg.output_artifact))?;
    log::info!("Uploaded the cleaned dataset as {}", manifest.reference());

    let record = run.finish().context("recording run")?;
    Ok(CleaningSummary {
        report,
        artifact: manifest,
        run: record,
    })
}
