//! Client configuration loaded from environment variables.

use std::time::Duration;

use url::Url;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base of generated share links.
    /// Env: `BURNLINK_ORIGIN`
    /// Default: `http://localhost:3000`
    pub origin: String,

    /// Storage server the client talks to.
    /// Env: `BURNLINK_SERVER_URL`
    /// Default: `http://localhost:8080`
    pub server_url: String,

    /// Fall back to client-only links when the server is unreachable.
    /// Env: `BURNLINK_ALLOW_FALLBACK` (true/false)
    /// Default: `true`
    pub allow_fallback: bool,

    /// Per-request timeout against the storage server.
    /// Env: `BURNLINK_TIMEOUT_SECS`
    /// Default: 15
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            server_url: "http://localhost:8080".to_string(),
            allow_fallback: true,
            timeout: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(origin) = lookup("BURNLINK_ORIGIN") {
            match Url::parse(origin.trim()) {
                Ok(_) => config.origin = origin.trim().trim_end_matches('/').to_string(),
                Err(e) => tracing::warn!(value = %origin, error = %e, "Invalid BURNLINK_ORIGIN, using default"),
            }
        }

        if let Some(server) = lookup("BURNLINK_SERVER_URL") {
            match Url::parse(server.trim()) {
                Ok(_) => config.server_url = server.trim().to_string(),
                Err(e) => tracing::warn!(value = %server, error = %e, "Invalid BURNLINK_SERVER_URL, using default"),
            }
        }

        if let Some(val) = lookup("BURNLINK_ALLOW_FALLBACK") {
            match parse_bool(&val) {
                Some(allow) => config.allow_fallback = allow,
                None => tracing::warn!(value = %val, "Invalid BURNLINK_ALLOW_FALLBACK, using default"),
            }
        }

        if let Some(val) = lookup("BURNLINK_TIMEOUT_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid BURNLINK_TIMEOUT_SECS, using default"),
            }
        }

        config
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    let val = val.trim();
    if ["true", "1", "yes", "on"].iter().any(|t| val.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if ["false", "0", "no", "off"].iter().any(|f| val.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}
