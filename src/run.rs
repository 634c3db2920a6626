use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::{Artifact, ArtifactManifest, ArtifactRef, ArtifactStore, ResolvedArtifact};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Run record
// ---------------------------------------------------------------------------

/// What a finished run leaves behind in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub job_type: String,
    /// The job's configuration, as passed on the command line.
    pub config: serde_json::Value,
    /// Versioned references (`name:vN`) of consumed artifacts.
    pub used_artifacts: Vec<String>,
    /// Versioned references of produced artifacts.
    pub logged_artifacts: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// One execution of a job against an artifact store.
///
/// Artifacts used and logged through the run are recorded as its lineage;
/// [`Run::finish`] persists the record.
pub struct Run<'a> {
    store: &'a dyn ArtifactStore,
    record: RunRecord,
}

impl<'a> Run<'a> {
    pub fn init(
        store: &'a dyn ArtifactStore,
        job_type: &str,
        config: &impl Serialize,
    ) -> Result<Self> {
        let started_at = Utc::now();
        let id = format!(
            "{}-{}",
            started_at.format("%Y%m%dT%H%M%S%3f"),
            std::process::id()
        );
        log::info!("Started {job_type} run {id}");
        Ok(Run {
            store,
            record: RunRecord {
                id,
                job_type: job_type.to_string(),
                config: serde_json::to_value(config)?,
                used_artifacts: Vec::new(),
                logged_artifacts: Vec::new(),
                started_at,
                finished_at: None,
            },
        })
    }

    pub fn use_artifact(&mut self, reference: &ArtifactRef) -> Result<ResolvedArtifact> {
        let resolved = self.store.use_artifact(reference)?;
        self.record
            .used_artifacts
            .push(resolved.manifest.reference().to_string());
        Ok(resolved)
    }

    /// Register `artifact`; blocks until the store reports it durable.
    pub fn log_artifact(&mut self, artifact: &Artifact) -> Result<ArtifactManifest> {
        let manifest = self.store.log_artifact(artifact)?;
        self.record
            .logged_artifacts
            .push(manifest.reference().to_string());
        Ok(manifest)
    }

    pub fn finish(mut self) -> Result<RunRecord> {
        self.record.finished_at = Some(Utc::now());
        self.store.record_run(&self.record)?;
        Ok(self.record)
    }
}
