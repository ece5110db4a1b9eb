//! Centralized configuration for Spindrift.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::time::Duration;

/// Central configuration for all Spindrift components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct SpindriftConfig {
    pub tracker: TrackerConfig,
    pub network: NetworkConfig,
}

/// Tracker-site endpoints and submission defaults.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Tracker site root, without trailing slash
    pub base_url: String,
    /// Announce endpoint written into submitted artifacts
    pub announce_url: String,
    /// Permanent announce endpoint for the post-acceptance patch,
    /// when it differs from the submission one
    pub public_announce_url: Option<String>,
    /// Session cookie value; `None` means not authenticated
    pub session_cookie: Option<String>,
    /// Tracker-level anonymity default (a release's own flag wins)
    pub anonymous: bool,
    /// Attribution line appended to composed descriptions (empty = none)
    pub signature: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nyaa.si".to_string(),
            announce_url: "http://nyaa.tracker.wf:7777/announce".to_string(),
            public_announce_url: None,
            session_cookie: None,
            anonymous: false,
            signature: String::new(),
        }
    }
}

impl TrackerConfig {
    /// Announce endpoint embedded once the tracker has accepted the upload.
    pub fn permanent_announce_url(&self) -> &str {
        self.public_announce_url
            .as_deref()
            .unwrap_or(&self.announce_url)
    }
}

/// Network communication configuration.
///
/// Every outbound call carries one of these timeouts explicitly; there is
/// no internal retry policy.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Timeout for auth-check and search requests
    pub request_timeout: Duration,
    /// Timeout for the multipart upload request
    pub upload_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            upload_timeout: Duration::from_secs(90),
            user_agent: "spindrift/0.1.0",
        }
    }
}

impl SpindriftConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(cookie) = std::env::var("SPINDRIFT_SESSION_COOKIE") {
            if !cookie.is_empty() {
                config.tracker.session_cookie = Some(cookie);
            }
        }

        if let Ok(base_url) = std::env::var("SPINDRIFT_BASE_URL") {
            config.tracker.base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Ok(announce) = std::env::var("SPINDRIFT_ANNOUNCE_URL") {
            config.tracker.announce_url = announce;
        }

        if let Ok(anonymous) = std::env::var("SPINDRIFT_ANONYMOUS") {
            config.tracker.anonymous = anonymous.parse().unwrap_or(false);
        }

        if let Ok(timeout) = std::env::var("SPINDRIFT_REQUEST_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.network.request_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(timeout) = std::env::var("SPINDRIFT_UPLOAD_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.network.upload_timeout = Duration::from_secs(seconds);
            }
        }

        config
    }

    /// Creates a configuration optimized for testing: short timeouts and a
    /// fixed session cookie so no test talks to the real tracker.
    pub fn for_testing() -> Self {
        Self {
            tracker: TrackerConfig {
                base_url: "http://127.0.0.1:0".to_string(),
                session_cookie: Some("test-session".to_string()),
                ..TrackerConfig::default()
            },
            network: NetworkConfig {
                request_timeout: Duration::from_secs(5),
                upload_timeout: Duration::from_secs(5),
                ..NetworkConfig::default()
            },
        }
    }
}
