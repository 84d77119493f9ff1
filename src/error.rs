use thiserror::Error;

/// Terminal failures that prevent artifact delivery.
///
/// Per-step and per-entry capture failures never surface here; they are
/// recorded on the snapshot itself and the run continues.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Cancellation observed at a step boundary. The partial snapshot is
    /// discarded, not exported.
    #[error("capture cancelled before completion")]
    Cancelled,

    /// The assembled snapshot could not be serialized.
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The artifact could not be written to disk.
    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
}
