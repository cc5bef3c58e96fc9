//! Diagnostics payload models
//!
//! Every section and field of the backend's diagnostics documents is optional.
//! Missing or `null` values resolve to explicit defaults at parse time, and
//! unit-suffixed strings (`"123ms"`, `"87.5%"`) are parsed once into
//! [`Measured`] values that remember both the raw text and the outcome.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// Unit suffix carried by a metric string
pub trait Unit {
    const SUFFIX: &'static str;
    const NAME: &'static str;
}

/// Milliseconds, serialized as `"<n>ms"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Millis;

impl Unit for Millis {
    const SUFFIX: &'static str = "ms";
    const NAME: &'static str = "duration";
}

/// Percentage, serialized as `"<n>%"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Percent;

impl Unit for Percent {
    const SUFFIX: &'static str = "%";
    const NAME: &'static str = "percentage";
}

/// A unit-suffixed metric whose numeric part could not be read
#[derive(Debug, Clone, PartialEq, Error)]
#[error("malformed {unit} metric: {raw:?}")]
pub struct MalformedMetric {
    pub raw: String,
    pub unit: &'static str,
}

/// Strip `suffix` from `raw` and parse the remainder as a number.
///
/// The suffix is optional. A lone decimal comma is accepted.
pub fn parse_suffixed(raw: &str, suffix: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let body = trimmed.strip_suffix(suffix).unwrap_or(trimmed).trim();

    let parsed = body.parse::<f64>().ok().or_else(|| {
        if body.matches(',').count() == 1 && !body.contains('.') {
            body.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    });

    parsed.filter(|value| value.is_finite())
}

/// A metric parsed once from its unit-suffixed wire form
#[derive(Debug, Clone, PartialEq)]
pub struct Measured<U> {
    raw: String,
    value: Result<f64, MalformedMetric>,
    unit: PhantomData<U>,
}

impl<U: Unit> Measured<U> {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let value = parse_suffixed(&raw, U::SUFFIX).ok_or_else(|| MalformedMetric {
            raw: raw.clone(),
            unit: U::NAME,
        });
        Self {
            raw,
            value,
            unit: PhantomData,
        }
    }

    /// Text exactly as the backend sent it
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> Result<f64, MalformedMetric> {
        self.value.clone()
    }
}

impl<U: Unit> Default for Measured<U> {
    fn default() -> Self {
        Self::parse(format!("0{}", U::SUFFIX))
    }
}

impl<U> fmt::Display for Measured<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl<'de, U: Unit> Deserialize<'de> for Measured<U> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Self::default(),
            Value::String(raw) => Self::parse(raw),
            Value::Number(number) => match number.as_f64() {
                Some(value) => Self {
                    raw: format!("{}{}", number, U::SUFFIX),
                    value: Ok(value),
                    unit: PhantomData,
                },
                None => Self::parse(number.to_string()),
            },
            other => Self::parse(other.to_string()),
        })
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn count_of(value: Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
            .unwrap_or(0),
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Counters arrive as JSON integers, occasionally as floats or `null`
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Value::deserialize(deserializer).map(count_of)
}

/// Name → counter map whose values follow the `lenient_count` rules
fn lenient_counts<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, u64>, D::Error> {
    let entries = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name, count_of(value)))
        .collect())
}

/// Placeholder shown for absent text fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Text of an optional field, or `N/A`
pub fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}

// ============================================================================
// Primary performance snapshot
// ============================================================================

/// GET /api/diagnostics/performance
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsSnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub hibernate: HibernateStats,
    #[serde(deserialize_with = "null_as_default")]
    pub queries: QueryStats,
    #[serde(deserialize_with = "null_as_default")]
    pub http: HttpStats,
    #[serde(deserialize_with = "null_as_default")]
    pub jvm: JvmStats,
    #[serde(deserialize_with = "null_as_default")]
    pub cache: CacheStats,
}

/// Primary snapshot as received plus its typed view
#[derive(Debug, Clone)]
pub struct PrimarySnapshot {
    /// Document exactly as received, persisted into the report
    pub raw: Value,
    pub snapshot: DiagnosticsSnapshot,
}

impl PrimarySnapshot {
    pub fn from_value(raw: Value) -> serde_json::Result<Self> {
        let snapshot = DiagnosticsSnapshot::deserialize(&raw)?;
        Ok(Self { raw, snapshot })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HibernateStats {
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub queries: HibernateQueryStats,
    #[serde(deserialize_with = "null_as_default")]
    pub entities: EntityStats,
    #[serde(deserialize_with = "null_as_default")]
    pub collections: CollectionStats,
    #[serde(deserialize_with = "null_as_default")]
    pub second_level_cache: SecondLevelCacheStats,
    #[serde(deserialize_with = "null_as_default")]
    pub sessions: SessionStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HibernateQueryStats {
    #[serde(deserialize_with = "lenient_count")]
    pub total: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub cache_hits: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub cache_misses: u64,
    pub max_execution_time: Measured<Millis>,
    pub slowest_query: Option<String>,
}

impl HibernateQueryStats {
    /// Slowest query text, when the backend recorded a real one
    pub fn slowest_query_text(&self) -> Option<&str> {
        self.slowest_query
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty() && *text != NOT_AVAILABLE)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntityStats {
    #[serde(deserialize_with = "lenient_count")]
    pub loads: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub fetches: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub inserts: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub updates: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub deletes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollectionStats {
    #[serde(deserialize_with = "lenient_count")]
    pub loads: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub fetches: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub updates: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub removes: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub recreates: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecondLevelCacheStats {
    #[serde(deserialize_with = "lenient_count")]
    pub hits: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub misses: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub puts: u64,
}

impl SecondLevelCacheStats {
    /// hits / (hits + misses) * 100, or `None` without lookups
    pub fn hit_ratio(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            return None;
        }
        Some(self.hits as f64 * 100.0 / total as f64)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    #[serde(deserialize_with = "lenient_count")]
    pub opened: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub closed: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub transactions: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub successful_transactions: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryStats {
    #[serde(deserialize_with = "null_as_default")]
    pub top_executed: Vec<QueryEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub slowest: Vec<QueryEntry>,
    #[serde(deserialize_with = "lenient_count")]
    pub total_unique_queries: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub query: String,
    #[serde(deserialize_with = "lenient_count")]
    pub count: u64,
    pub avg_time: Measured<Millis>,
    pub total_time: Measured<Millis>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpStats {
    #[serde(deserialize_with = "null_as_default")]
    pub endpoints: Vec<EndpointStats>,
    #[serde(deserialize_with = "lenient_count")]
    pub total_requests: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub slow_requests: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub exceptions: u64,
    #[serde(deserialize_with = "lenient_counts")]
    pub exceptions_by_type: BTreeMap<String, u64>,
    pub slow_percentage: Option<Measured<Percent>>,
    pub slowest_endpoint: Option<EndpointStats>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl HttpStats {
    /// slowRequests / totalRequests * 100, or `None` without traffic
    pub fn slow_request_share(&self) -> Option<f64> {
        if self.total_requests == 0 {
            return None;
        }
        Some(self.slow_requests as f64 * 100.0 / self.total_requests as f64)
    }

    pub fn has_data(&self) -> bool {
        self.total_requests > 0 || !self.endpoints.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointStats {
    pub uri: Option<String>,
    pub method: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub count: u64,
    pub mean: Measured<Millis>,
    pub max: Measured<Millis>,
    pub total: Measured<Millis>,
}

impl EndpointStats {
    /// `METHOD /uri`
    pub fn route(&self) -> String {
        format!("{} {}", or_na(&self.method), or_na(&self.uri))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JvmStats {
    #[serde(deserialize_with = "null_as_default")]
    pub memory: MemoryStats,
    #[serde(deserialize_with = "null_as_default")]
    pub threads: ThreadStats,
    #[serde(deserialize_with = "null_as_default")]
    pub runtime: RuntimeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryStats {
    #[serde(deserialize_with = "null_as_default")]
    pub heap: HeapStats,
    #[serde(deserialize_with = "null_as_default")]
    pub non_heap: NonHeapStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeapStats {
    pub used: Option<String>,
    pub committed: Option<String>,
    pub max: Option<String>,
    pub usage_percent: Measured<Percent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NonHeapStats {
    pub used: Option<String>,
    pub committed: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadStats {
    #[serde(deserialize_with = "lenient_count")]
    pub current: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub peak: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub daemon: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub total_started: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeInfo {
    pub uptime: Option<String>,
    pub vm_name: Option<String>,
    pub vm_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheStats {
    #[serde(deserialize_with = "null_as_default")]
    pub caches: Vec<CacheInfo>,
    pub total_caches: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheInfo {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// ============================================================================
// Request history
// ============================================================================

/// GET /api/diagnostics/history
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistorySnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub stats: HistoryStats,
    #[serde(deserialize_with = "null_as_default")]
    pub recent_requests: Vec<RequestRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryStats {
    #[serde(deserialize_with = "lenient_count")]
    pub total_requests: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub avg_duration: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub max_duration: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub min_duration: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub slow_requests: u64,
    #[serde(rename = "nPlusOneRequests", deserialize_with = "lenient_count")]
    pub n_plus_one_requests: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub total_queries: u64,
}

/// GET /api/diagnostics/history/slowest, sorted by duration descending
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlowestSnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub slowest: Vec<RequestRecord>,
    #[serde(deserialize_with = "lenient_count")]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestRecord {
    pub timestamp: Value,
    pub method: Option<String>,
    pub uri: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub status: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub duration_ms: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub query_count: u64,
    #[serde(rename = "hadNPlusOne", deserialize_with = "null_as_default")]
    pub had_n_plus_one: bool,
    #[serde(deserialize_with = "lenient_count")]
    pub slow_queries: u64,
}

impl RequestRecord {
    /// `METHOD /uri`
    pub fn route(&self) -> String {
        format!("{} {}", or_na(&self.method), or_na(&self.uri))
    }

    /// Timestamp as text; date arrays (`[2024, 5, 1, 13, 2, 7, ...]`) become ISO-8601
    pub fn timestamp_text(&self) -> String {
        match &self.timestamp {
            Value::Null => NOT_AVAILABLE.to_string(),
            Value::String(text) => text.clone(),
            Value::Array(parts) if parts.len() >= 3 && parts.iter().all(Value::is_u64) => {
                let part = |i: usize| parts.get(i).and_then(Value::as_u64).unwrap_or(0);
                format!(
                    "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                    part(0),
                    part(1),
                    part(2),
                    part(3),
                    part(4),
                    part(5)
                )
            }
            other => other.to_string(),
        }
    }
}
