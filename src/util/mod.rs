pub mod paths;

pub use paths::{data_dir, exports_dir, policy_path};
