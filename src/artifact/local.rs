use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};

use super::{Alias, Artifact, ArtifactManifest, ArtifactRef, ArtifactStore, ResolvedArtifact};
use crate::error::{CleaningError, Result};
use crate::run::RunRecord;

const MANIFEST_FILE: &str = "manifest.json";
const FILES_DIR: &str = "files";

/// Directory-backed artifact store.
///
/// Layout:
/// ```text
/// <root>/artifacts/<name>/v<N>/manifest.json
/// <root>/artifacts/<name>/v<N>/files/<file>
/// <root>/runs/<run_id>.json
/// ```
///
/// A version directory without a manifest is an unfinished upload and is
/// ignored.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Open an existing store. A missing root means the store is unavailable.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CleaningError::StoreUnavailable(root.display().to_string()));
        }
        Ok(LocalArtifactStore { root })
    }

    /// Open a store, creating its root first if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(LocalArtifactStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_dir(&self, name: &str) -> PathBuf {
        self.root.join("artifacts").join(name)
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.artifact_dir(name).join(format!("v{version}"))
    }

    fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    /// All completed versions of `name`, oldest first.
    pub fn versions(&self, name: &str) -> Result<Vec<u32>> {
        let dir = self.artifact_dir(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions: Vec<u32> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(MANIFEST_FILE).is_file())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|n| n.strip_prefix('v'))
                    .and_then(|n| n.parse().ok())
            })
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }

    fn read_manifest(&self, name: &str, version: u32) -> Result<ArtifactManifest> {
        let text = fs::read_to_string(self.version_dir(name, version).join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn resolve(&self, reference: &ArtifactRef) -> Result<ArtifactManifest> {
        let versions = self.versions(&reference.name)?;
        let version = match reference.alias {
            Alias::Latest => versions.last().copied(),
            Alias::Version(v) => versions.contains(&v).then_some(v),
        }
        .ok_or_else(|| CleaningError::ArtifactNotFound(reference.to_string()))?;
        self.read_manifest(&reference.name, version)
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn use_artifact(&self, reference: &ArtifactRef) -> Result<ResolvedArtifact> {
        let manifest = self.resolve(reference)?;
        let path = self
            .version_dir(&manifest.name, manifest.version)
            .join(FILES_DIR)
            .join(&manifest.file_name);
        if !path.is_file() {
            return Err(CleaningError::ArtifactNotFound(manifest.reference().to_string()));
        }
        log::debug!("Resolved {reference} to {}", path.display());
        Ok(ResolvedArtifact { manifest, path })
    }

    fn log_artifact(&self, artifact: &Artifact) -> Result<ArtifactManifest> {
        super::validate_name(&artifact.name)?;
        let bytes = fs::read(&artifact.file)?;
        let digest = format!("sha256:{}", hex::encode(Sha256::digest(&bytes)));

        let versions = self.versions(&artifact.name)?;
        if let Some(&latest) = versions.last() {
            let manifest = self.read_manifest(&artifact.name, latest)?;
            if manifest.digest == digest
                && manifest.artifact_type == artifact.artifact_type
                && manifest.description == artifact.description
            {
                log::info!(
                    "Artifact {} unchanged, reusing v{}",
                    artifact.name,
                    manifest.version
                );
                return Ok(manifest);
            }
        }

        let mut version = versions.last().map_or(0, |v| v + 1);
        while self.version_dir(&artifact.name, version).exists() {
            version += 1;
        }
        let dir = self.version_dir(&artifact.name, version);
        fs::create_dir_all(self.artifact_dir(&artifact.name))?;
        fs::create_dir(&dir)?;
        fs::create_dir(dir.join(FILES_DIR))?;

        let file_name = artifact
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&artifact.name)
            .to_string();
        atomic_write(&dir.join(FILES_DIR).join(&file_name), &bytes)?;

        let manifest = ArtifactManifest {
            name: artifact.name.clone(),
            version,
            artifact_type: artifact.artifact_type.clone(),
            description: artifact.description.clone(),
            file_name,
            digest,
            size: bytes.len() as u64,
            created_at: Utc::now(),
        };
        // The manifest lands last: its presence marks the version complete.
        atomic_write(
            &dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?.as_bytes(),
        )?;
        Ok(manifest)
    }

    fn record_run(&self, record: &RunRecord) -> Result<()> {
        let dir = self.runs_dir();
        fs::create_dir_all(&dir)?;
        atomic_write(
            &dir.join(format!("{}.json", record.id)),
            serde_json::to_string_pretty(record)?.as_bytes(),
        )
    }
}

/// Write to a sibling temp file, fsync, then rename over `path`.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension(format!("tmp-{}", std::process::id()));
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
