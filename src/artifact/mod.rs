//! Versioned artifacts and the store that tracks them.
//!
//! An artifact is a named, immutable file. Every registration under the same
//! name creates a new version `v0`, `v1`, ... unless the content is
//! byte-identical to the newest version and carries the same type and
//! description.

pub mod local;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CleaningError, Result};
use crate::run::RunRecord;

pub use local::LocalArtifactStore;

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// Which version of an artifact a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alias {
    Latest,
    Version(u32),
}

/// `name[:alias]`, e.g. `sample.csv:latest` or `clean_sample.csv:v3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub name: String,
    pub alias: Alias,
}

impl FromStr for ArtifactRef {
    type Err = CleaningError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, alias) = match s.rsplit_once(':') {
            Some((name, alias)) => (name, alias),
            None => (s, "latest"),
        };
        validate_name(name)?;
        let alias = match alias {
            "latest" => Alias::Latest,
            v => v
                .strip_prefix('v')
                .and_then(|n| n.parse().ok())
                .map(Alias::Version)
                .ok_or_else(|| CleaningError::InvalidReference(s.to_string()))?,
        };
        Ok(ArtifactRef {
            name: name.to_string(),
            alias,
        })
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alias {
            Alias::Latest => write!(f, "{}:latest", self.name),
            Alias::Version(v) => write!(f, "{}:v{v}", self.name),
        }
    }
}

/// Artifact names become directory names, so they must be a single path
/// component.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', ':']);
    if bad {
        return Err(CleaningError::InvalidReference(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// A file to be registered.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub artifact_type: String,
    pub description: String,
    pub file: PathBuf,
}

impl Artifact {
    pub fn new(
        name: impl Into<String>,
        artifact_type: impl Into<String>,
        description: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Artifact {
            name: name.into(),
            artifact_type: artifact_type.into(),
            description: description.into(),
            file: file.into(),
        }
    }
}

/// What the store knows about one registered version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub name: String,
    pub version: u32,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    pub file_name: String,
    /// `sha256:<hex>` of the file contents.
    pub digest: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

impl ArtifactManifest {
    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef {
            name: self.name.clone(),
            alias: Alias::Version(self.version),
        }
    }
}

/// A resolved artifact with its local file.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub manifest: ArtifactManifest,
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The tracking service as seen by a job.
pub trait ArtifactStore {
    /// Resolve a reference to a local, readable file.
    fn use_artifact(&self, reference: &ArtifactRef) -> Result<ResolvedArtifact>;

    /// Register a file. Returns once the new version is durable.
    fn log_artifact(&self, artifact: &Artifact) -> Result<ArtifactManifest>;

    /// Persist the record of a finished run.
    fn record_run(&self, record: &RunRecord) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_references() {
        let r: ArtifactRef = "sample.csv".parse().unwrap();
        assert_eq!(r.name, "sample.csv");
        assert_eq!(r.alias, Alias::Latest);

        let r: ArtifactRef = "clean_sample.csv:v3".parse().unwrap();
        assert_eq!(r.alias, Alias::Version(3));
        assert_eq!(r.to_string(), "clean_sample.csv:v3");

        assert_eq!(
            "sample.csv:latest".parse::<ArtifactRef>().unwrap().to_string(),
            "sample.csv:latest"
        );
    }

    #[test]
    fn rejects_bad_references() {
        for bad in ["", ":latest", "a/b:v1", "sample.csv:prod", "sample.csv:v", "..:v0"] {
            assert!(bad.parse::<ArtifactRef>().is_err(), "{bad}");
        }
    }
}
