//! Value processor: sizing, truncation and bounded-depth projection.
//!
//! Every capture source that handles scalar/string payloads goes through
//! this module, so the artifact stays bounded under a single policy even
//! when the underlying data is effectively unbounded.

mod entry;
mod limit;

pub use entry::{process, ValueEntry, PREVIEW_ELLIPSIS};
pub use limit::limit_depth;
