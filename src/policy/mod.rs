//! Capture policy: the thresholds and limits that keep the artifact bounded.
//!
//! The active policy is embedded verbatim in the exported artifact's
//! metadata so a consumer can interpret truncation markers without access
//! to the engine or its configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tunable limits applied uniformly across capture sources.
///
/// Field names follow the artifact schema (camelCase) since the policy is
/// serialized into the snapshot metadata as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotPolicy {
    /// Values larger than this many bytes are truncated.
    pub max_raw_length: usize,
    /// Number of characters retained in the preview of a truncated value.
    pub preview_length: usize,
    /// Keep the full raw value even when it exceeds `max_raw_length`.
    pub include_raw: bool,
    /// Attach a depth-limited projection of parsed values.
    pub include_parsed_limited: bool,
    /// Depth at which parsed values collapse to count placeholders.
    pub max_depth: usize,
    /// Arrays longer than this are sliced with a trailing sentinel.
    pub max_array_items: usize,
    /// Cached response bodies larger than this many bytes are truncated.
    /// Deliberately larger than `max_raw_length`: bodies are read rarely
    /// and only for allow-listed content types.
    pub max_body_length: usize,
    /// Content-type substrings for which cached bodies are downloaded.
    pub allowed_content_types: Vec<String>,
    /// Run the redaction pass over the serialized artifact before delivery.
    pub redact: bool,
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self {
            max_raw_length: 4096,
            preview_length: 200,
            include_raw: true,
            include_parsed_limited: true,
            max_depth: 4,
            max_array_items: 50,
            max_body_length: 65536,
            allowed_content_types: vec![
                "javascript".to_string(),
                "json".to_string(),
                "css".to_string(),
                "html".to_string(),
                "xml".to_string(),
                "svg".to_string(),
            ],
            redact: true,
        }
    }
}

impl SnapshotPolicy {
    /// Load a policy from a TOML file, falling back to defaults.
    ///
    /// A missing file yields the default policy; a malformed file is
    /// logged and also yields the default policy. Individual missing keys
    /// take their default values.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };

        match toml::from_str(&contents) {
            Ok(policy) => policy,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to parse policy file, using defaults"
                );
                Self::default()
            }
        }
    }

    /// True when `content_type` matches the body-download allow-list.
    pub fn allows_content_type(&self, content_type: &str) -> bool {
        let lower = content_type.to_lowercase();
        self.allowed_content_types
            .iter()
            .any(|allowed| lower.contains(allowed.as_str()))
    }
}
