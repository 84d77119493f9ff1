use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::capture::{CaptureSource, ProgressFn};
use crate::host::{CachedRequest, ResponseCacheHost};
use crate::policy::SnapshotPolicy;
use crate::snapshot::{CacheEntry, CacheGroup, CacheStats, CachedResponse, CachesSection};

/// Captures every named response cache.
///
/// Request/response metadata is always recorded; bodies are only read for
/// allow-listed content types. Most cached bundle content is large and not
/// analytically interesting, so the allow-list is a bandwidth control on
/// top of the body-size threshold.
pub struct ResponseCacheCapture {
    host: Arc<dyn ResponseCacheHost>,
    policy: SnapshotPolicy,
}

impl ResponseCacheCapture {
    pub fn new(host: Arc<dyn ResponseCacheHost>, policy: SnapshotPolicy) -> Self {
        Self { host, policy }
    }

    async fn capture_entry(
        &self,
        cache: &str,
        request: CachedRequest,
        stats: &mut CacheStats,
    ) -> CacheEntry {
        let mut response = CachedResponse {
            status: request.status,
            status_text: request.status_text,
            headers: header_map(&request.response_headers),
            content_type: request.content_type.clone(),
            body_size: None,
            body: None,
            body_truncated: None,
            original_size: None,
            body_skipped: None,
            skip_reason: None,
            body_error: None,
        };

        match &request.content_type {
            Some(content_type) if self.policy.allows_content_type(content_type) => {
                match self.host.read_body(cache, &request.url).await {
                    Ok(body) => {
                        stats.downloaded += 1;
                        attach_body(&mut response, body, self.policy.max_body_length);
                    }
                    Err(err) => {
                        // Entry-level failure only; siblings keep processing.
                        tracing::debug!(cache, url = %request.url, error = %err, "body read failed");
                        response.body_error = Some(err.to_string());
                    }
                }
            }
            Some(content_type) => {
                stats.skipped += 1;
                response.body_skipped = Some(true);
                response.skip_reason = Some(format!("content type not allow-listed: {content_type}"));
            }
            None => {
                stats.skipped += 1;
                response.body_skipped = Some(true);
                response.skip_reason = Some("no content type".to_string());
            }
        }

        CacheEntry {
            url: request.url,
            method: request.method,
            headers: header_map(&request.request_headers),
            response: Some(response),
        }
    }
}

fn header_map(headers: &[(String, String)]) -> BTreeMap<String, String> {
    headers.iter().cloned().collect()
}

fn attach_body(response: &mut CachedResponse, body: String, max_body_length: usize) {
    let full = body.len();
    if full > max_body_length {
        let mut cut = max_body_length;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        response.body = Some(body[..cut].to_string());
        response.body_size = Some(cut);
        response.body_truncated = Some(true);
        response.original_size = Some(full);
    } else {
        response.body_size = Some(full);
        response.body = Some(body);
    }
}

#[async_trait]
impl CaptureSource for ResponseCacheCapture {
    type Section = CachesSection;

    fn name(&self) -> &'static str {
        "caches"
    }

    async fn run(&self, progress: ProgressFn<'_>) -> Result<CachesSection> {
        let mut section = CachesSection::default();

        // Enumeration failure fails the whole step; per-cache listings and
        // per-entry body reads below are contained.
        let names = self.host.cache_names().await?;

        // List every cache first so the entry total is known up front.
        let mut listed = Vec::with_capacity(names.len());
        for name in names {
            let entries = match self.host.entries(&name).await {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(cache = %name, error = %err, "cache listing failed");
                    Vec::new()
                }
            };
            listed.push((name, entries));
        }

        let total: usize = listed.iter().map(|(_, entries)| entries.len()).sum();
        section.stats.total = total;
        let mut completed = 0usize;
        progress(completed, total);

        for (name, requests) in listed {
            let mut group = CacheGroup {
                name: name.clone(),
                count: requests.len(),
                entries: Vec::with_capacity(requests.len()),
            };
            for request in requests {
                let entry = self.capture_entry(&name, request, &mut section.stats).await;
                group.entries.push(entry);
                completed += 1;
                progress(completed, total);
            }
            section.caches.push(group);
        }

        Ok(section)
    }
}
