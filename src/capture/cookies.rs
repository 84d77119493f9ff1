use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::capture::{CaptureSource, ProgressFn};
use crate::host::CookieSource;
use crate::snapshot::CookieEntry;

/// Captures session cookies from the host's delimited cookie string.
/// Values pass through unparsed and unbounded (platform-bounded already).
pub struct CookieCapture {
    source: Arc<dyn CookieSource>,
}

impl CookieCapture {
    pub fn new(source: Arc<dyn CookieSource>) -> Self {
        Self { source }
    }
}

pub(crate) fn parse_cookies(raw: &str) -> Vec<CookieEntry> {
    let mut cookies = Vec::new();
    for segment in raw.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((name, value)) if !name.is_empty() => cookies.push(CookieEntry {
                name: name.to_string(),
                value: value.to_string(),
            }),
            _ => tracing::debug!(segment, "skipping malformed cookie segment"),
        }
    }
    cookies
}

#[async_trait]
impl CaptureSource for CookieCapture {
    type Section = Vec<CookieEntry>;

    fn name(&self) -> &'static str {
        "cookies"
    }

    async fn run(&self, _progress: ProgressFn<'_>) -> Result<Vec<CookieEntry>> {
        let raw = match self.source.cookie_string() {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "cookie access failed");
                return Ok(Vec::new());
            }
        };
        Ok(parse_cookies(&raw))
    }
}
