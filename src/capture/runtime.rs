use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::capture::{CaptureSource, ProgressFn};
use crate::host::RuntimeHost;
use crate::snapshot::StateSection;

/// Best-effort runtime introspection: framework debug-hook presence,
/// application globals, and flat navigation state.
///
/// Walking framework internals is out of scope; hooks are reported as
/// existence plus version only.
pub struct RuntimeIntrospectionCapture {
    host: Arc<dyn RuntimeHost>,
}

impl RuntimeIntrospectionCapture {
    pub fn new(host: Arc<dyn RuntimeHost>) -> Self {
        Self { host }
    }
}

fn unavailable(message: &str) -> Value {
    Value::String(format!("[unavailable: {message}]"))
}

#[async_trait]
impl CaptureSource for RuntimeIntrospectionCapture {
    type Section = StateSection;

    fn name(&self) -> &'static str {
        "state"
    }

    async fn run(&self, _progress: ProgressFn<'_>) -> Result<StateSection> {
        let mut section = StateSection {
            frameworks: self.host.debug_hooks(),
            navigation: self.host.navigation(),
            ..Default::default()
        };

        for (name, access) in self.host.app_globals() {
            let value = match access {
                Ok(value) => value,
                Err(message) => {
                    // One throwing access must not abort the scan.
                    tracing::debug!(global = %name, error = %message, "global access failed");
                    unavailable(&message)
                }
            };
            section.globals.insert(name, value);
        }

        Ok(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::StaticRuntimeHost;
    use crate::snapshot::{DebugHook, NavigationState};
    use serde_json::json;

    #[tokio::test]
    async fn captures_hooks_globals_and_navigation() {
        let host = StaticRuntimeHost {
            hooks: vec![DebugHook {
                name: "component-inspector".to_string(),
                version: Some("4.2.1".to_string()),
            }],
            globals: vec![
                ("appConfig".to_string(), Ok(json!({"env": "prod"}))),
                ("appSecrets".to_string(), Err("access denied".to_string())),
            ],
            navigation: NavigationState {
                path: "/search".to_string(),
                query: "q=rust".to_string(),
                fragment: String::new(),
                history: Some(json!({"depth": 3})),
            },
            ..Default::default()
        };

        let capture = RuntimeIntrospectionCapture::new(Arc::new(host));
        let section = capture.run(&|_, _| {}).await.unwrap();

        assert_eq!(section.frameworks.len(), 1);
        assert_eq!(section.frameworks[0].version.as_deref(), Some("4.2.1"));
        assert_eq!(section.globals["appConfig"], json!({"env": "prod"}));
        // A throwing access yields an error marker, not an aborted scan.
        assert_eq!(
            section.globals["appSecrets"],
            json!("[unavailable: access denied]")
        );
        assert_eq!(section.navigation.path, "/search");
    }

    #[test]
    fn empty_host_yields_empty_section() {
        let capture = RuntimeIntrospectionCapture::new(Arc::new(StaticRuntimeHost::default()));
        let section = tokio_test::block_on(capture.run(&|_, _| {})).unwrap();
        assert!(section.frameworks.is_empty());
        assert!(section.globals.is_empty());
    }
}
