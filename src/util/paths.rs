//! Path utilities for statecap data directories

use std::path::PathBuf;

/// Get the base statecap data directory (~/.statecap)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".statecap"))
        .unwrap_or_else(|| PathBuf::from(".statecap"))
}

/// Get the default export directory for snapshot artifacts (~/.statecap/exports)
pub fn exports_dir() -> PathBuf {
    data_dir().join("exports")
}

/// Get the default policy file path (~/.statecap/policy.toml)
pub fn policy_path() -> PathBuf {
    data_dir().join("policy.toml")
}
