//! Client configuration.

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://dummyjson.com";
pub const DEFAULT_JOBS_URL: &str = "https://dummyjson.com/c/2dd7-62ed-4140-83df";
pub const DEFAULT_ADMIN_JOBS_URL: &str = "https://dummyjson.com/c/8fe0-3952-4183-9c20";
pub const DEFAULT_USERS_URL: &str = "https://dummyjson.com/c/a505-93b9-4aea-b1d8";

/// Lifetime requested for access tokens minted by `/auth/refresh`.
pub const REFRESH_EXPIRES_IN_MINS: u32 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the `/auth/*` endpoints
    pub api_base_url: String,
    /// Fixed collection endpoints; fetched as-is, no query parameters
    pub jobs_url: String,
    pub admin_jobs_url: String,
    pub users_url: String,
    pub refresh_expires_in_mins: u32,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            jobs_url: DEFAULT_JOBS_URL.to_string(),
            admin_jobs_url: DEFAULT_ADMIN_JOBS_URL.to_string(),
            users_url: DEFAULT_USERS_URL.to_string(),
            refresh_expires_in_mins: REFRESH_EXPIRES_IN_MINS,
            timeout: Duration::from_secs(40),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    let value = std::env::var(name).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.trim_end_matches('/').to_string())
    }
}

impl ClientConfig {
    /// Defaults, overridden by `JOBBOARD_*` environment variables when set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env_string("JOBBOARD_API_BASE_URL").unwrap_or(defaults.api_base_url),
            jobs_url: env_string("JOBBOARD_JOBS_URL").unwrap_or(defaults.jobs_url),
            admin_jobs_url: env_string("JOBBOARD_ADMIN_JOBS_URL")
                .unwrap_or(defaults.admin_jobs_url),
            users_url: env_string("JOBBOARD_USERS_URL").unwrap_or(defaults.users_url),
            refresh_expires_in_mins: defaults.refresh_expires_in_mins,
            timeout: env_string("JOBBOARD_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            connect_timeout: defaults.connect_timeout,
        }
    }

    /// Points every endpoint at one server; the collection paths mirror the
    /// default ones.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            api_base_url: base.to_string(),
            jobs_url: format!("{base}/c/2dd7-62ed-4140-83df"),
            admin_jobs_url: format!("{base}/c/8fe0-3952-4183-9c20"),
            users_url: format!("{base}/c/a505-93b9-4aea-b1d8"),
            ..Self::default()
        }
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_demo_api() {
        let config = ClientConfig::default();
        assert_eq!(config.auth_url("/auth/login"), "https://dummyjson.com/auth/login");
        assert_eq!(config.refresh_expires_in_mins, 30);
    }

    #[test]
    fn with_base_url_rewrites_every_endpoint() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.auth_url("auth/me"), "http://127.0.0.1:9000/auth/me");
        assert!(config.jobs_url.starts_with("http://127.0.0.1:9000/c/"));
        assert!(config.users_url.starts_with("http://127.0.0.1:9000/c/"));
    }
}
