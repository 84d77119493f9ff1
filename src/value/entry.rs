use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policy::SnapshotPolicy;
use crate::value::limit::limit_depth;

/// Marker appended to the preview of a truncated value.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// One processed scalar value as it appears in the artifact.
///
/// `size` is always the UTF-8 byte length of the raw string, independent
/// of truncation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueEntry {
    pub size: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_at: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_preview: Option<Value>,
}

/// Apply the truncation/projection policy to one raw string value.
pub fn process(raw: &str, policy: &SnapshotPolicy) -> ValueEntry {
    let size = raw.len();
    let mut entry = ValueEntry {
        size,
        value: Some(raw.to_string()),
        ..Default::default()
    };

    if size > policy.max_raw_length {
        entry.truncated = true;
        entry.truncated_at = Some(policy.max_raw_length);
        entry.original_length = Some(size);
        let head: String = raw.chars().take(policy.preview_length).collect();
        entry.preview = Some(format!("{head}{PREVIEW_ELLIPSIS}"));
        if !policy.include_raw {
            entry.value = None;
        }
    }

    // Parse failure is silent: non-JSON values simply stay raw.
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        if policy.include_parsed_limited {
            entry.parsed_preview =
                Some(limit_depth(&parsed, policy.max_depth, policy.max_array_items));
        }
        entry.parsed = Some(parsed);
    }

    entry
}
