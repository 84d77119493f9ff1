use regex::Regex;

/// Redaction pass applied to the serialized artifact before delivery.
#[derive(Debug, Clone)]
pub struct ScrubConfig {
    patterns: Vec<Regex>,
}

impl ScrubConfig {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    pub fn default_patterns() -> Vec<Regex> {
        // Keep patterns simple: the Rust `regex` crate doesn't support look-behind.
        let raw = [
            r"sk-[A-Za-z0-9]{10,}",
            r"Bearer\s+[A-Za-z0-9._-]{10,}",
            r"(?i)api[_-]?key['\x22]?\s*[:=]\s*['\x22]?[A-Za-z0-9._-]{10,}",
            r"eyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9._-]{10,}",
        ];
        raw.into_iter().filter_map(|p| Regex::new(p).ok()).collect()
    }

    pub fn default_redactions() -> Self {
        Self::new(Self::default_patterns())
    }

    pub fn scrub_str(&self, input: &str) -> String {
        let mut out = input.to_string();
        for re in &self.patterns {
            out = re.replace_all(&out, "[REDACTED]").into_owned();
        }
        out
    }
}
