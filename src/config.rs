//! Fixed audit configuration: endpoints, timeout and rule thresholds

use std::time::Duration;

/// Backend under audit
pub const BASE_URL: &str = "http://localhost:8080";

pub const PERFORMANCE_PATH: &str = "/api/diagnostics/performance";
pub const HISTORY_PATH: &str = "/api/diagnostics/history";
pub const SLOWEST_PATH: &str = "/api/diagnostics/history/slowest";

/// Single-attempt timeout applied to every request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Records requested from the slowest-requests endpoint
pub const SLOWEST_LIMIT: usize = 10;

/// Directory the JSON report is written to
pub const REPORT_DIR: &str = ".";

/// Rule thresholds. Durations in milliseconds, ratios in percent.
pub struct Thresholds;

impl Thresholds {
    pub const SLOW_QUERY_AVG_MS: f64 = 100.0;
    pub const CRITICAL_QUERY_MS: f64 = 500.0;
    pub const SLOW_REQUEST_MEAN_MS: f64 = 500.0;
    pub const VERY_SLOW_ENDPOINT_MS: f64 = 3000.0;
    pub const INCONSISTENT_LATENCY_FACTOR: f64 = 3.0;
    pub const INCONSISTENT_LATENCY_MIN_MEAN_MS: f64 = 100.0;

    pub const MEMORY_CRITICAL_PCT: f64 = 85.0;
    pub const MEMORY_WARNING_PCT: f64 = 70.0;
    pub const CACHE_HIT_RATIO_WARNING_PCT: f64 = 70.0;
    pub const SLOW_REQUEST_SHARE_WARNING_PCT: f64 = 10.0;
    pub const SLOW_REQUEST_SHARE_CRITICAL_PCT: f64 = 20.0;

    pub const N_PLUS_ONE_EXECUTIONS: u64 = 10;
    pub const THREAD_COUNT_WARNING: u64 = 100;
    pub const LAZY_LOADING_FETCH_FACTOR: u64 = 2;

    pub const HISTORY_WARNING_MS: u64 = 1000;
    pub const HISTORY_REPORTABLE_MS: u64 = 3000;
    pub const HISTORY_CRITICAL_MS: u64 = 5000;
}

/// How many entries of each list the passes inspect
pub struct Limits;

impl Limits {
    pub const TOP_QUERIES: usize = 5;
    pub const TOP_ENDPOINTS: usize = 10;
    pub const TOP_HISTORY: usize = 5;
    pub const CONSOLE_RECOMMENDATIONS: usize = 10;
    pub const QUERY_TEXT_CHARS: usize = 80;
    pub const SLOWEST_QUERY_TEXT_CHARS: usize = 100;
}

/// Absolute URLs of the three diagnostics endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub performance: String,
    pub history: String,
    pub slowest: String,
}

impl Endpoints {
    /// Build the endpoint set relative to `base`
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            performance: format!("{}{}", base, PERFORMANCE_PATH),
            history: format!("{}{}", base, HISTORY_PATH),
            slowest: format!("{}{}", base, SLOWEST_PATH),
        }
    }

    /// Slowest-requests URL with the fixed record limit
    pub fn slowest_with_limit(&self) -> String {
        format!("{}?limit={}", self.slowest, SLOWEST_LIMIT)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::with_base(BASE_URL)
    }
}
