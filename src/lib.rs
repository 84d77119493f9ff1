pub mod capture;
pub mod engine;
pub mod error;
pub mod export;
pub mod host;
pub mod policy;
pub mod snapshot;
pub mod util;
pub mod value;

pub use capture::{
    CookieCapture, KeyValueStoreCapture, NetworkActivityCapture, NetworkObserver,
    RecordDatabaseCapture, ResponseCacheCapture, RuntimeIntrospectionCapture,
};
pub use engine::{CancelFlag, EngineDeps, EngineEvent, SnapshotEngine, CAPTURE_STEPS};
pub use error::EngineError;
pub use export::Exporter;
pub use policy::SnapshotPolicy;
pub use snapshot::{CaptureStepResult, Snapshot, StepStatus};
pub use value::{limit_depth, process, ValueEntry};
