//! Query frequency and latency pass

use std::io::{self, Write};

use super::{measured, section_header, truncate};
use crate::config::{Limits, Thresholds};
use crate::findings::{Findings, Issue, IssueKind, Priority, Recommendation, Severity};
use crate::models::QueryStats;

pub fn analyze(stats: &QueryStats, findings: &mut Findings, out: &mut impl Write) -> io::Result<()> {
    section_header(out, "ANÁLISE DE QUERIES")?;

    writeln!(out, "Total de queries únicas: {}", stats.total_unique_queries)?;

    if !stats.top_executed.is_empty() {
        writeln!(out, "\n🔥 Top 5 Queries Mais Executadas:")?;
        for (i, entry) in stats.top_executed.iter().take(Limits::TOP_QUERIES).enumerate() {
            let query = truncate(&entry.query, Limits::QUERY_TEXT_CHARS);
            writeln!(
                out,
                "  {}. Count: {} | Avg: {} | {}...",
                i + 1,
                entry.count,
                entry.avg_time,
                query
            )?;

            if entry.count > Thresholds::N_PLUS_ONE_EXECUTIONS {
                findings.push_issue(
                    Issue::new(
                        Severity::Critical,
                        IssueKind::NPlusOne,
                        format!("Possível N+1: Query executada {} vezes", entry.count),
                    )
                    .with_query(query),
                );
                findings.recommend(
                    Recommendation::new(
                        Priority::Critical,
                        "Corrigir N+1 Query",
                        format!(
                            "Query executada {}x. Usar @EntityGraph ou JOIN FETCH",
                            entry.count
                        ),
                    )
                    .with_impact(85),
                );
            }
        }
    }

    if !stats.slowest.is_empty() {
        writeln!(out, "\n🐌 Top 5 Queries Mais Lentas:")?;
        for (i, entry) in stats.slowest.iter().take(Limits::TOP_QUERIES).enumerate() {
            let query = truncate(&entry.query, Limits::QUERY_TEXT_CHARS);
            writeln!(
                out,
                "  {}. Avg: {} | Count: {} | {}...",
                i + 1,
                entry.avg_time,
                entry.count,
                query
            )?;

            let Some(avg_ms) = measured(&entry.avg_time, "queries.slowest.avgTime") else {
                continue;
            };
            if avg_ms > Thresholds::SLOW_QUERY_AVG_MS {
                findings.push_issue(
                    Issue::new(
                        Severity::Warning,
                        IssueKind::SlowQuery,
                        format!("Query lenta: {} (média)", entry.avg_time),
                    )
                    .with_query(query),
                );
                findings.recommend(
                    Recommendation::new(
                        Priority::High,
                        "Otimizar Query Lenta",
                        format!(
                            "Query com {} (média). Adicionar índices no banco",
                            entry.avg_time
                        ),
                    )
                    .with_impact(70),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Impact;
    use serde_json::json;

    fn run(value: serde_json::Value) -> Findings {
        let stats: QueryStats = serde_json::from_value(value).unwrap();
        let mut findings = Findings::new();
        analyze(&stats, &mut findings, &mut Vec::new()).unwrap();
        findings
    }

    #[test]
    fn test_frequent_query_flags_n_plus_one() {
        let findings = run(json!({
            "topExecuted": [
                { "query": "select i from InventoryItem i where i.id = ?", "count": 48, "avgTime": "2ms" },
                { "query": "select c from Category c", "count": 10, "avgTime": "1ms" }
            ]
        }));

        assert_eq!(findings.issues().len(), 1);
        let issue = &findings.issues()[0];
        assert_eq!(issue.severity, Severity::Critical);
        assert_eq!(issue.kind, IssueKind::NPlusOne);
        assert_eq!(issue.message, "Possível N+1: Query executada 48 vezes");

        let rec = &findings.recommendations()[0];
        assert_eq!(rec.priority, Priority::Critical);
        assert_eq!(rec.impact, Some(Impact(85)));
    }

    #[test]
    fn test_only_top_five_are_inspected() {
        let entries: Vec<_> = (0..8)
            .map(|i| json!({ "query": format!("q{}", i), "count": 50, "avgTime": "500ms" }))
            .collect();
        let findings = run(json!({ "topExecuted": entries, "slowest": entries }));

        assert_eq!(findings.count(Severity::Critical), 5);
        assert_eq!(findings.count(Severity::Warning), 5);
        assert_eq!(findings.recommendations().len(), 10);
    }

    #[test]
    fn test_slow_average_flags_warning() {
        let findings = run(json!({
            "slowest": [
                { "query": "select s from Sale s join fetch s.items", "count": 3, "avgTime": "180ms" },
                { "query": "select p from Product p", "count": 3, "avgTime": "100ms" }
            ]
        }));

        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].kind, IssueKind::SlowQuery);
        assert_eq!(findings.issues()[0].message, "Query lenta: 180ms (média)");
        assert_eq!(findings.recommendations()[0].impact, Some(Impact(70)));
    }

    #[test]
    fn test_same_query_in_both_lists_recommended_twice() {
        let entry = json!({ "query": "select o from PurchaseOrder o", "count": 25, "avgTime": "300ms" });
        let findings = run(json!({ "topExecuted": [entry.clone()], "slowest": [entry] }));

        assert_eq!(findings.issues().len(), 2);
        assert_eq!(findings.recommendations().len(), 2);
        assert_eq!(findings.recommendations()[0].title, "Corrigir N+1 Query");
        assert_eq!(findings.recommendations()[1].title, "Otimizar Query Lenta");
    }

    #[test]
    fn test_malformed_average_skips_entry_and_continues() {
        let findings = run(json!({
            "slowest": [
                { "query": "q1", "avgTime": "??ms" },
                { "query": "q2", "avgTime": "250ms" }
            ]
        }));
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].query.as_deref(), Some("q2"));
    }

    #[test]
    fn test_query_text_truncated_to_eighty_chars() {
        let long = "x".repeat(200);
        let findings = run(json!({ "topExecuted": [{ "query": long, "count": 11 }] }));
        assert_eq!(findings.issues()[0].query.as_ref().map(|q| q.len()), Some(80));
    }
}
