//! Issues and recommendations accumulated during an audit run

use serde::{Serialize, Serializer};

/// How bad a detected problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn emoji(self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::Warning => "🟠",
            Severity::Info => "🟡",
        }
    }
}

/// Tag identifying which rule produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    SlowQuery,
    CacheEfficiency,
    LazyLoading,
    NPlusOne,
    SlowRequests,
    HttpExceptions,
    VerySlowEndpoint,
    SlowEndpoint,
    InconsistentLatency,
    VerySlowHistoricalRequest,
    MemoryUsage,
    ThreadCount,
}

/// A detected problem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Issue {
    pub fn new(severity: Severity, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            query: None,
            endpoint: None,
            timestamp: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// Recommendation urgency. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn emoji(self) -> &'static str {
        match self {
            Priority::Critical => "🔴",
            Priority::High => "🟠",
            Priority::Medium => "🟡",
            Priority::Low => "🟢",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

/// Expected improvement, serialized as `"85%"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impact(pub u8);

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Serialize for Impact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A suggested optimization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
}

impl Recommendation {
    pub fn new(priority: Priority, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            priority,
            title: title.into(),
            description: description.into(),
            impact: None,
        }
    }

    pub fn with_impact(mut self, percent: u8) -> Self {
        self.impact = Some(Impact(percent));
        self
    }
}

/// Append-only accumulator shared by the analysis passes.
///
/// Discovery order is preserved. Nothing is ever removed or deduplicated:
/// two rules firing on the same underlying query yield two entries.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    issues: Vec<Issue>,
    recommendations: Vec<Recommendation>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn recommend(&mut self, recommendation: Recommendation) {
        self.recommendations.push(recommendation);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn into_parts(self) -> (Vec<Issue>, Vec<Recommendation>) {
        (self.issues, self.recommendations)
    }
}
