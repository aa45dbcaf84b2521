//! Client settings.

use serde::{Deserialize, Serialize};

/// Largest page JIRA returns from the search endpoint unless the server
/// administrator raised it.
pub const DEFAULT_SERVER_MAX_RESULTS: u32 = 100;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts for transient transport failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Settings shared by every service of one client handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Page size used by the search pager. Never above `server_max_results`.
    pub max_issues_per_request: u32,
    /// The server's own `maxResults` ceiling.
    pub server_max_results: u32,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts for rate-limited, 5xx and network failures (1 = no retry).
    pub max_retries: u32,
    /// Address users by `accountId` (cloud) instead of `username`.
    pub user_privacy_mode: bool,
}

impl ClientSettings {
    /// Set the search page size, clamped to `1..=server_max_results`.
    pub fn with_max_issues_per_request(mut self, max: u32) -> Self {
        self.max_issues_per_request = max;
        self.normalize()
    }

    /// Set the server ceiling, pulling the page size down with it.
    pub fn with_server_max_results(mut self, max: u32) -> Self {
        self.server_max_results = max.max(1);
        self.normalize()
    }

    /// Set the number of transport attempts.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// The effective page size.
    pub fn page_size(&self) -> u32 {
        self.max_issues_per_request.clamp(1, self.server_max_results.max(1))
    }

    /// Clamp loaded values into their valid ranges.
    pub fn normalize(mut self) -> Self {
        self.server_max_results = self.server_max_results.max(1);
        self.max_issues_per_request = self.page_size();
        self.max_retries = self.max_retries.max(1);
        self
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            max_issues_per_request: DEFAULT_SERVER_MAX_RESULTS,
            server_max_results: DEFAULT_SERVER_MAX_RESULTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            user_privacy_mode: true,
        }
    }
}
