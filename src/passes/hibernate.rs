//! Hibernate statistics pass

use std::io::{self, Write};

use super::{measured, section_header, truncate};
use crate::config::{Limits, Thresholds};
use crate::findings::{Findings, Issue, IssueKind, Priority, Recommendation, Severity};
use crate::models::{EntityStats, HibernateQueryStats, HibernateStats, SecondLevelCacheStats};

pub fn analyze(
    stats: &HibernateStats,
    findings: &mut Findings,
    out: &mut impl Write,
) -> io::Result<()> {
    section_header(out, "ANÁLISE DO HIBERNATE")?;

    if !stats.enabled {
        writeln!(out, "🟠 Hibernate Statistics está desabilitado")?;
        if let Some(detail) = stats.error.as_deref().or(stats.message.as_deref()) {
            writeln!(out, "  {}", detail)?;
        }
        findings.recommend(Recommendation::new(
            Priority::Medium,
            "Habilitar Hibernate Statistics",
            "spring.jpa.properties.hibernate.generate_statistics=true",
        ));
        return Ok(());
    }

    let queries = &stats.queries;
    writeln!(out, "Total de Queries: {}", queries.total)?;
    writeln!(out, "Query mais lenta: {}", queries.max_execution_time)?;
    writeln!(
        out,
        "Entidades: {} loads | {} fetches | Coleções: {} loads | {} fetches",
        stats.entities.loads,
        stats.entities.fetches,
        stats.collections.loads,
        stats.collections.fetches
    )?;
    writeln!(
        out,
        "Sessões: {} abertas | {} fechadas | Transações: {}",
        stats.sessions.opened, stats.sessions.closed, stats.sessions.transactions
    )?;

    check_slowest_query(queries, findings);

    if let Some(ratio) = stats.second_level_cache.hit_ratio() {
        writeln!(out, "Cache Hit Ratio: {:.1}%", ratio)?;
    }
    check_cache_hit_ratio(&stats.second_level_cache, findings);
    check_lazy_loading(&stats.entities, findings);

    Ok(())
}

fn check_slowest_query(queries: &HibernateQueryStats, findings: &mut Findings) {
    let Some(query) = queries.slowest_query_text() else {
        return;
    };
    let Some(max_ms) = measured(&queries.max_execution_time, "hibernate.queries.maxExecutionTime")
    else {
        return;
    };
    if max_ms <= Thresholds::SLOW_QUERY_AVG_MS {
        return;
    }

    let severity = if max_ms > Thresholds::CRITICAL_QUERY_MS {
        Severity::Critical
    } else {
        Severity::Warning
    };
    let max_time = &queries.max_execution_time;

    findings.push_issue(
        Issue::new(severity, IssueKind::SlowQuery, format!("Query mais lenta: {}", max_time))
            .with_query(truncate(query, Limits::SLOWEST_QUERY_TEXT_CHARS)),
    );
    findings.recommend(Recommendation::new(
        Priority::High,
        "Otimizar Query Lenta",
        format!(
            "Query com {} detectada. Adicionar índices ou otimizar JOIN FETCH",
            max_time
        ),
    ));
}

fn check_cache_hit_ratio(cache: &SecondLevelCacheStats, findings: &mut Findings) {
    let Some(ratio) = cache.hit_ratio() else {
        return;
    };
    if ratio >= Thresholds::CACHE_HIT_RATIO_WARNING_PCT {
        return;
    }

    findings.push_issue(Issue::new(
        Severity::Warning,
        IssueKind::CacheEfficiency,
        format!("Cache Hit Ratio baixo: {:.1}%", ratio),
    ));
    findings.recommend(Recommendation::new(
        Priority::Medium,
        "Melhorar Eficiência do Cache",
        "Aumentar TTL, adicionar cache em mais lugares ou revisar invalidação",
    ));
}

fn check_lazy_loading(entities: &EntityStats, findings: &mut Findings) {
    let fan_out_limit = entities
        .loads
        .saturating_mul(Thresholds::LAZY_LOADING_FETCH_FACTOR);
    if entities.loads == 0 || entities.fetches <= fan_out_limit {
        return;
    }

    findings.push_issue(Issue::new(
        Severity::Warning,
        IssueKind::LazyLoading,
        format!(
            "Muitos fetches ({}) vs loads ({})",
            entities.fetches, entities.loads
        ),
    ));
    findings.recommend(Recommendation::new(
        Priority::Medium,
        "Reduzir Lazy Loading",
        "Usar @EntityGraph ou JOIN FETCH para evitar queries adicionais",
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stats(value: serde_json::Value) -> HibernateStats {
        serde_json::from_value(value).unwrap()
    }

    fn run(stats: &HibernateStats) -> Findings {
        let mut findings = Findings::new();
        analyze(stats, &mut findings, &mut Vec::new()).unwrap();
        findings
    }

    #[test]
    fn test_disabled_statistics_yield_single_recommendation() {
        let findings = run(&stats(json!({
            "enabled": false,
            "message": "Hibernate statistics are disabled",
            "queries": { "maxExecutionTime": "900ms", "slowestQuery": "select x" },
            "secondLevelCache": { "hits": 1, "misses": 99 },
            "entities": { "loads": 1, "fetches": 50 }
        })));

        assert!(findings.issues().is_empty());
        assert_eq!(findings.recommendations().len(), 1);
        assert_eq!(findings.recommendations()[0].priority, Priority::Medium);
        assert_eq!(findings.recommendations()[0].title, "Habilitar Hibernate Statistics");
    }

    #[test]
    fn test_slow_query_severity() {
        let findings = run(&stats(json!({
            "enabled": true,
            "queries": { "maxExecutionTime": "650ms", "slowestQuery": "select p from Product p" }
        })));
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].severity, Severity::Critical);
        assert_eq!(findings.issues()[0].query.as_deref(), Some("select p from Product p"));
        assert_eq!(findings.recommendations()[0].priority, Priority::High);

        let findings = run(&stats(json!({
            "enabled": true,
            "queries": { "maxExecutionTime": "150ms", "slowestQuery": "select s from Sale s" }
        })));
        assert_eq!(findings.issues()[0].severity, Severity::Warning);

        let findings = run(&stats(json!({
            "enabled": true,
            "queries": { "maxExecutionTime": "100ms", "slowestQuery": "select s from Sale s" }
        })));
        assert!(findings.issues().is_empty());
    }

    #[test]
    fn test_slow_query_requires_query_text() {
        let findings = run(&stats(json!({
            "enabled": true,
            "queries": { "maxExecutionTime": "900ms", "slowestQuery": null }
        })));
        assert!(findings.issues().is_empty());
        assert!(findings.recommendations().is_empty());
    }

    #[test]
    fn test_malformed_max_time_skips_only_that_check() {
        let findings = run(&stats(json!({
            "enabled": true,
            "queries": { "maxExecutionTime": "slowms", "slowestQuery": "select 1" },
            "entities": { "loads": 10, "fetches": 21 }
        })));
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].kind, IssueKind::LazyLoading);
    }

    #[test]
    fn test_cache_hit_ratio_boundary() {
        let findings = run(&stats(json!({
            "enabled": true,
            "secondLevelCache": { "hits": 70, "misses": 30 }
        })));
        assert!(findings.issues().is_empty());

        let findings = run(&stats(json!({
            "enabled": true,
            "secondLevelCache": { "hits": 69, "misses": 31 }
        })));
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].kind, IssueKind::CacheEfficiency);
        assert_eq!(findings.issues()[0].message, "Cache Hit Ratio baixo: 69.0%");
        assert_eq!(findings.recommendations()[0].priority, Priority::Medium);
    }

    #[test]
    fn test_lazy_loading_fan_out() {
        let findings = run(&stats(json!({
            "enabled": true,
            "entities": { "loads": 10, "fetches": 20 }
        })));
        assert!(findings.issues().is_empty());

        let findings = run(&stats(json!({
            "enabled": true,
            "entities": { "loads": 0, "fetches": 20 }
        })));
        assert!(findings.issues().is_empty());

        let findings = run(&stats(json!({
            "enabled": true,
            "entities": { "loads": 10, "fetches": 21 }
        })));
        assert_eq!(findings.issues()[0].kind, IssueKind::LazyLoading);
        assert_eq!(findings.recommendations()[0].title, "Reduzir Lazy Loading");
    }
}
