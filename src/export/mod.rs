//! Artifact export.
//!
//! The only externalization path: the finished snapshot, policy included,
//! serialized into one JSON document and written to a local file. No
//! network transmission, no server-side persistence.

mod scrub;

pub use scrub::ScrubConfig;

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::EngineError;
use crate::snapshot::Snapshot;
use crate::util::paths;

pub const ARTIFACT_PREFIX: &str = "snapshot";

pub struct Exporter {
    out_dir: PathBuf,
}

impl Exporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Exporter writing to the default directory (~/.statecap/exports).
    pub fn default_dir() -> Self {
        Self::new(paths::exports_dir())
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Serialize and deliver the snapshot as a timestamped JSON file.
    ///
    /// A serialization failure here is terminal: all steps already ran,
    /// but no artifact can be produced.
    pub fn export(&self, snapshot: &Snapshot) -> Result<PathBuf, EngineError> {
        let mut document = serde_json::to_string_pretty(snapshot)?;

        if snapshot.metadata.policy.redact {
            document = ScrubConfig::default_redactions().scrub_str(&document);
        }

        std::fs::create_dir_all(&self.out_dir)?;
        let filename = format!(
            "{ARTIFACT_PREFIX}-{}.json",
            snapshot.metadata.timestamp.format("%Y%m%d-%H%M%S")
        );
        let path = self.out_dir.join(filename);

        // Write through a temp file so a failed export never leaves a
        // half-written artifact behind.
        let mut file = NamedTempFile::new_in(&self.out_dir)?;
        file.write_all(document.as_bytes())?;
        file.persist(&path).map_err(|err| EngineError::Io(err.error))?;

        tracing::info!(path = %path.display(), bytes = document.len(), "snapshot exported");
        Ok(path)
    }
}
