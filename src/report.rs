//! Final audit report: summary, console rendering and JSON persistence

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Limits;
use crate::error::{AuditError, Result};
use crate::findings::{Findings, Issue, Recommendation, Severity};
use crate::passes::truncate;

const RULE: &str = "================================================================================";

/// Issue counts persisted with the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub critical_issues: usize,
    pub warnings: usize,
    pub total_issues: usize,
}

impl Summary {
    pub fn of(findings: &Findings) -> Self {
        Self {
            critical_issues: findings.count(Severity::Critical),
            warnings: findings.count(Severity::Warning),
            total_issues: findings.issues().len(),
        }
    }
}

/// Overall health of the audited backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    StableWithImprovementAreas,
    RequiresImmediateAttention,
}

impl Verdict {
    pub fn from_summary(summary: &Summary) -> Self {
        match (summary.critical_issues, summary.warnings) {
            (0, 0) => Verdict::Healthy,
            (0, _) => Verdict::StableWithImprovementAreas,
            _ => Verdict::RequiresImmediateAttention,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Healthy => "healthy",
            Verdict::StableWithImprovementAreas => "stable with improvement areas",
            Verdict::RequiresImmediateAttention => "requires immediate attention",
        }
    }

    fn console_line(self) -> &'static str {
        match self {
            Verdict::Healthy => "✅ Sistema está saudável!",
            Verdict::StableWithImprovementAreas => "🟠 Sistema estável mas com áreas de melhoria",
            Verdict::RequiresImmediateAttention => "🔴 Sistema requer atenção imediata!",
        }
    }
}

/// Recommendations ordered critical → low, discovery order kept within a priority
pub fn prioritized(recommendations: &[Recommendation]) -> Vec<&Recommendation> {
    let mut sorted: Vec<&Recommendation> = recommendations.iter().collect();
    sorted.sort_by_key(|rec| rec.priority);
    sorted
}

/// Immutable result of one audit run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    timestamp: DateTime<Local>,
    summary: Summary,
    issues: Vec<Issue>,
    recommendations: Vec<Recommendation>,
    raw_data: Value,
}

impl Report {
    /// Build the report once all passes have run
    pub fn build(findings: Findings, raw_data: Value, generated_at: DateTime<Local>) -> Self {
        let summary = Summary::of(&findings);
        let (issues, recommendations) = findings.into_parts();
        Self {
            timestamp: generated_at,
            summary,
            issues,
            recommendations,
            raw_data,
        }
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_summary(&self.summary)
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    /// `performance_report_<YYYYMMDD_HHMMSS>.json`
    pub fn file_name(&self) -> String {
        format!(
            "performance_report_{}.json",
            self.timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    /// Console rendering; only the top recommendations are shown
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "\n{}", RULE)?;
        writeln!(out, "🎯 RELATÓRIO DE ANÁLISE DE PERFORMANCE")?;
        writeln!(out, "{}", RULE)?;

        writeln!(out, "\n📊 Resumo:")?;
        writeln!(out, "  🔴 Problemas Críticos: {}", self.summary.critical_issues)?;
        writeln!(out, "  🟠 Avisos: {}", self.summary.warnings)?;
        writeln!(out, "  Total de Issues: {}", self.summary.total_issues)?;

        if !self.issues.is_empty() {
            writeln!(out, "\n🚨 Problemas Identificados:")?;
            self.render_issues(out, Severity::Critical, "CRÍTICOS")?;
            self.render_issues(out, Severity::Warning, "AVISOS")?;
        }

        if !self.recommendations.is_empty() {
            writeln!(out, "\n🎯 Recomendações de Otimização (Priorizadas):")?;
            let shown = prioritized(&self.recommendations);
            for (i, rec) in shown.iter().take(Limits::CONSOLE_RECOMMENDATIONS).enumerate() {
                writeln!(
                    out,
                    "\n  {}. {} [{}] {}",
                    i + 1,
                    rec.priority.emoji(),
                    rec.priority.label(),
                    rec.title
                )?;
                writeln!(out, "     {}", rec.description)?;
                if let Some(impact) = rec.impact {
                    writeln!(out, "     Impacto Esperado: {} de melhoria", impact)?;
                }
            }
        }

        writeln!(out, "\n📊 Status Geral:")?;
        writeln!(out, "  {}", self.verdict().console_line())?;
        writeln!(out, "\n{}\n", RULE)?;
        Ok(())
    }

    fn render_issues(&self, out: &mut impl Write, severity: Severity, heading: &str) -> io::Result<()> {
        let mut matching = self.issues.iter().filter(|i| i.severity == severity).peekable();
        if matching.peek().is_none() {
            return Ok(());
        }

        writeln!(out, "\n  {} {}:", severity.emoji(), heading)?;
        for issue in matching {
            writeln!(out, "    • {}", issue.message)?;
            if severity == Severity::Critical {
                if let Some(query) = &issue.query {
                    writeln!(out, "      Query: {}...", truncate(query, Limits::QUERY_TEXT_CHARS))?;
                }
            }
        }
        Ok(())
    }

    /// Write the full report as pretty JSON into `dir`
    pub fn persist(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());

        let document = serde_json::to_vec_pretty(self).map_err(|e| AuditError::Persist {
            path: path.clone(),
            source: e.into(),
        })?;

        std::fs::write(&path, document).map_err(|source| {
            error!(path = %path.display(), error = %source, "Failed to write report");
            AuditError::Persist {
                path: path.clone(),
                source,
            }
        })?;

        info!(
            path = %path.display(),
            issues = self.summary.total_issues,
            recommendations = self.recommendations.len(),
            "Report saved"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{IssueKind, Priority};
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 13, 2, 7).unwrap()
    }

    fn issue(severity: Severity) -> Issue {
        Issue::new(severity, IssueKind::SlowQuery, "issue")
    }

    fn mixed_recommendations() -> Findings {
        // 3 critical, 3 high, 4 medium, 5 low, interleaved
        let priorities = [
            Priority::Low,
            Priority::Medium,
            Priority::Critical,
            Priority::High,
            Priority::Low,
            Priority::Medium,
            Priority::Critical,
            Priority::Low,
            Priority::High,
            Priority::Medium,
            Priority::Low,
            Priority::Critical,
            Priority::Medium,
            Priority::High,
            Priority::Low,
        ];
        let mut findings = Findings::new();
        for (i, priority) in priorities.into_iter().enumerate() {
            findings.recommend(Recommendation::new(priority, format!("rec-{:02}", i), "d"));
        }
        findings
    }

    #[test]
    fn test_summary_counts() {
        let mut findings = Findings::new();
        for severity in [
            Severity::Critical,
            Severity::Warning,
            Severity::Warning,
            Severity::Info,
        ] {
            findings.push_issue(issue(severity));
        }
        assert_eq!(
            Summary::of(&findings),
            Summary { critical_issues: 1, warnings: 2, total_issues: 4 }
        );
    }

    #[test]
    fn test_verdicts() {
        let summary = |critical_issues, warnings| Summary {
            critical_issues,
            warnings,
            total_issues: critical_issues + warnings,
        };
        assert_eq!(Verdict::from_summary(&summary(0, 0)), Verdict::Healthy);
        assert_eq!(
            Verdict::from_summary(&summary(0, 3)),
            Verdict::StableWithImprovementAreas
        );
        assert_eq!(
            Verdict::from_summary(&summary(1, 0)),
            Verdict::RequiresImmediateAttention
        );
        assert_eq!(
            Verdict::RequiresImmediateAttention.as_str(),
            "requires immediate attention"
        );
    }

    #[test]
    fn test_info_issues_do_not_affect_verdict() {
        let mut findings = Findings::new();
        findings.push_issue(issue(Severity::Info));
        let report = Report::build(findings, json!({}), fixed_time());
        assert_eq!(report.verdict(), Verdict::Healthy);
        assert_eq!(report.summary().total_issues, 1);
    }

    #[test]
    fn test_prioritized_is_stable() {
        let findings = mixed_recommendations();
        let sorted = prioritized(findings.recommendations());

        let titles: Vec<&str> = sorted.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "rec-02", "rec-06", "rec-11", "rec-03", "rec-08", "rec-13", "rec-01", "rec-05",
                "rec-09", "rec-12", "rec-00", "rec-04", "rec-07", "rec-10", "rec-14",
            ]
        );
    }

    #[test]
    fn test_console_shows_top_ten_and_file_keeps_all() {
        let report = Report::build(mixed_recommendations(), json!({ "jvm": {} }), fixed_time());

        let mut out = Vec::new();
        report.render(&mut out).unwrap();
        let console = String::from_utf8(out).unwrap();

        let shown: Vec<&str> = console
            .lines()
            .filter_map(|line| line.split("] ").nth(1))
            .collect();
        assert_eq!(
            shown,
            vec![
                "rec-02", "rec-06", "rec-11", "rec-03", "rec-08", "rec-13", "rec-01", "rec-05",
                "rec-09", "rec-12",
            ]
        );
        assert!(!console.contains("[LOW]"));

        let dir = tempfile::tempdir().unwrap();
        let path = report.persist(dir.path()).unwrap();
        let saved: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(saved["recommendations"].as_array().unwrap().len(), 15);
        // persisted list keeps discovery order
        assert_eq!(saved["recommendations"][0]["title"], "rec-00");
    }

    #[test]
    fn test_file_name_and_document_shape() {
        let mut findings = Findings::new();
        findings.push_issue(issue(Severity::Critical).with_query("select ç"));
        let report = Report::build(findings, json!({ "hibernate": { "enabled": true } }), fixed_time());

        assert_eq!(report.file_name(), "performance_report_20240501_130207.json");

        let dir = tempfile::tempdir().unwrap();
        let path = report.persist(dir.path()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("select ç"));

        let saved: Value = serde_json::from_str(&text).unwrap();
        assert!(saved["timestamp"].as_str().unwrap().starts_with("2024-05-01T13:02:07"));
        assert_eq!(
            saved["summary"],
            json!({ "critical_issues": 1, "warnings": 0, "total_issues": 1 })
        );
        assert_eq!(saved["issues"][0]["type"], "slow_query");
        assert_eq!(saved["raw_data"], json!({ "hibernate": { "enabled": true } }));
    }

    #[test]
    fn test_persist_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let report = Report::build(Findings::new(), json!({}), fixed_time());

        match report.persist(&missing) {
            Err(AuditError::Persist { path, .. }) => assert!(path.starts_with(&missing)),
            other => panic!("expected persist failure, got {:?}", other),
        }
    }
}
