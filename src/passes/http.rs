//! HTTP traffic and endpoint latency pass

use std::io::{self, Write};

use super::{measured, section_header};
use crate::config::{Limits, Thresholds};
use crate::findings::{Findings, Issue, IssueKind, Priority, Recommendation, Severity};
use crate::models::{or_na, EndpointStats, HttpStats};

pub fn analyze(stats: &HttpStats, findings: &mut Findings, out: &mut impl Write) -> io::Result<()> {
    section_header(out, "ANÁLISE HTTP")?;

    writeln!(out, "Total de Requisições: {}", stats.total_requests)?;
    writeln!(out, "Requisições Lentas: {}", stats.slow_requests)?;
    writeln!(out, "Exceptions: {}", stats.exceptions)?;
    if let Some(error) = &stats.error {
        writeln!(out, "🚨 Erro reportado pelo backend: {}", error)?;
    }

    if !stats.has_data() {
        writeln!(out, "\n🟡 Nenhuma métrica HTTP coletada ainda.")?;
        if let Some(message) = &stats.message {
            writeln!(out, "  {}", message)?;
        }
        writeln!(out, "  Isso é normal após reiniciar a aplicação.")?;
        writeln!(out, "  Faça algumas requisições e execute a análise novamente.")?;
        return Ok(());
    }

    if let Some(share) = stats.slow_request_share() {
        match &stats.slow_percentage {
            Some(reported) => writeln!(out, "% Lentas: {}", reported)?,
            None => writeln!(out, "% Lentas: {:.1}%", share)?,
        }

        if share > Thresholds::SLOW_REQUEST_SHARE_WARNING_PCT {
            let severity = if share > Thresholds::SLOW_REQUEST_SHARE_CRITICAL_PCT {
                Severity::Critical
            } else {
                Severity::Warning
            };
            findings.push_issue(Issue::new(
                severity,
                IssueKind::SlowRequests,
                format!(
                    "{:.1}% das requisições estão lentas (> {}ms)",
                    share,
                    Thresholds::SLOW_REQUEST_MEAN_MS
                ),
            ));
        }
    }

    if stats.exceptions > 0 {
        findings.push_issue(Issue::new(
            Severity::Critical,
            IssueKind::HttpExceptions,
            format!("{} exceptions em requisições HTTP", stats.exceptions),
        ));

        if !stats.exceptions_by_type.is_empty() {
            writeln!(out, "\n🚨 Tipos de Exceptions:")?;
            for (kind, count) in &stats.exceptions_by_type {
                writeln!(out, "  • {}: {}", kind, count)?;
            }
        }
    }

    if stats.endpoints.is_empty() {
        writeln!(out, "\n🟡 Nenhum endpoint registrado ainda.")?;
        return Ok(());
    }

    writeln!(out, "\n🎯 Top Endpoints por Latência:")?;
    for (i, endpoint) in stats.endpoints.iter().take(Limits::TOP_ENDPOINTS).enumerate() {
        check_endpoint(i + 1, endpoint, findings, out)?;
    }

    if let Some(slowest) = &stats.slowest_endpoint {
        writeln!(out, "\n🐌 Endpoint Mais Lento:")?;
        writeln!(out, "  {}", slowest.route())?;
        writeln!(out, "  Mean: {} | Max: {}", slowest.mean, slowest.max)?;
    }

    Ok(())
}

fn check_endpoint(
    rank: usize,
    endpoint: &EndpointStats,
    findings: &mut Findings,
    out: &mut impl Write,
) -> io::Result<()> {
    let route = endpoint.route();
    let mean_ms = measured(&endpoint.mean, "http.endpoints.mean");

    let emoji = match mean_ms {
        Some(mean) if mean > Thresholds::VERY_SLOW_ENDPOINT_MS => "🔴",
        Some(mean) if mean > Thresholds::SLOW_REQUEST_MEAN_MS => "🟠",
        _ => "🟢",
    };
    writeln!(out, "\n  {}. {} {}", rank, emoji, route)?;
    writeln!(
        out,
        "     Status: {} | Count: {}",
        or_na(&endpoint.status),
        endpoint.count
    )?;
    writeln!(
        out,
        "     Mean: {} | Max: {} | Total: {}",
        endpoint.mean, endpoint.max, endpoint.total
    )?;

    let Some(mean) = mean_ms else {
        return Ok(());
    };

    if mean > Thresholds::VERY_SLOW_ENDPOINT_MS {
        findings.push_issue(
            Issue::new(
                Severity::Critical,
                IssueKind::VerySlowEndpoint,
                format!("Endpoint MUITO lento: {} ({} média)", route, endpoint.mean),
            )
            .with_endpoint(route.clone()),
        );
        findings.recommend(
            Recommendation::new(
                Priority::Critical,
                format!("🔥 URGENTE: Otimizar {}", route),
                format!(
                    "Latência média de {}! Verificar N+1 queries, adicionar índices, usar cache",
                    endpoint.mean
                ),
            )
            .with_impact(90),
        );
    } else if mean > Thresholds::SLOW_REQUEST_MEAN_MS {
        findings.push_issue(
            Issue::new(
                Severity::Warning,
                IssueKind::SlowEndpoint,
                format!("Endpoint lento: {} ({})", route, endpoint.mean),
            )
            .with_endpoint(route.clone()),
        );
        findings.recommend(
            Recommendation::new(
                Priority::High,
                format!("Otimizar {}", route),
                format!(
                    "Latência média de {}. Verificar queries e lógica de negócio",
                    endpoint.mean
                ),
            )
            .with_impact(60),
        );
    }

    let Some(max) = measured(&endpoint.max, "http.endpoints.max") else {
        return Ok(());
    };
    if max > mean * Thresholds::INCONSISTENT_LATENCY_FACTOR
        && mean > Thresholds::INCONSISTENT_LATENCY_MIN_MEAN_MS
    {
        findings.push_issue(Issue::new(
            Severity::Info,
            IssueKind::InconsistentLatency,
            format!(
                "Latência inconsistente em {}: max ({}) >> mean ({})",
                route, endpoint.max, endpoint.mean
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Impact;
    use serde_json::json;

    fn run(value: serde_json::Value) -> (Findings, String) {
        let stats: HttpStats = serde_json::from_value(value).unwrap();
        let mut findings = Findings::new();
        let mut out = Vec::new();
        analyze(&stats, &mut findings, &mut out).unwrap();
        (findings, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_no_traffic_reports_no_data() {
        let (findings, console) = run(json!({
            "totalRequests": 0,
            "endpoints": [],
            "exceptions": 4
        }));
        assert!(findings.issues().is_empty());
        assert!(findings.recommendations().is_empty());
        assert!(console.contains("Nenhuma métrica HTTP coletada ainda."));
    }

    #[test]
    fn test_very_slow_endpoint() {
        let (findings, _) = run(json!({
            "totalRequests": 10,
            "endpoints": [
                { "uri": "/api/sales/history", "method": "GET", "status": "200",
                  "count": 10, "mean": "3500ms", "max": "4000ms", "total": "35000ms" }
            ]
        }));

        let issue = &findings.issues()[0];
        assert_eq!(issue.severity, Severity::Critical);
        assert_eq!(issue.kind, IssueKind::VerySlowEndpoint);
        assert_eq!(issue.endpoint.as_deref(), Some("GET /api/sales/history"));

        let rec = &findings.recommendations()[0];
        assert_eq!(rec.priority, Priority::Critical);
        assert_eq!(rec.impact, Some(Impact(90)));
        assert_eq!(
            serde_json::to_value(rec).unwrap()["impact"],
            json!("90%")
        );
    }

    #[test]
    fn test_slow_endpoint_and_inconsistent_latency() {
        let (findings, _) = run(json!({
            "endpoints": [
                { "uri": "/api/products", "method": "GET", "mean": "600ms", "max": "2400ms" }
            ]
        }));

        assert_eq!(findings.issues().len(), 2);
        assert_eq!(findings.issues()[0].kind, IssueKind::SlowEndpoint);
        assert_eq!(findings.issues()[1].kind, IssueKind::InconsistentLatency);
        assert_eq!(findings.issues()[1].severity, Severity::Info);
        assert_eq!(findings.recommendations().len(), 1);
        assert_eq!(findings.recommendations()[0].impact, Some(Impact(60)));
    }

    #[test]
    fn test_inconsistent_latency_needs_meaningful_mean() {
        let (findings, _) = run(json!({
            "endpoints": [{ "uri": "/health", "method": "GET", "mean": "50ms", "max": "900ms" }]
        }));
        assert!(findings.issues().is_empty());
    }

    #[test]
    fn test_slow_request_share_severity() {
        let (findings, _) = run(json!({ "totalRequests": 100, "slowRequests": 15 }));
        assert_eq!(findings.issues()[0].kind, IssueKind::SlowRequests);
        assert_eq!(findings.issues()[0].severity, Severity::Warning);

        let (findings, _) = run(json!({ "totalRequests": 100, "slowRequests": 25 }));
        assert_eq!(findings.issues()[0].severity, Severity::Critical);

        let (findings, _) = run(json!({ "totalRequests": 100, "slowRequests": 10 }));
        assert!(findings.issues().is_empty());
    }

    #[test]
    fn test_exceptions_listed_by_type() {
        let (findings, console) = run(json!({
            "totalRequests": 20,
            "exceptions": 3,
            "exceptionsByType": { "IllegalStateException": 1, "NullPointerException": 2 }
        }));
        assert_eq!(findings.issues()[0].kind, IssueKind::HttpExceptions);
        assert_eq!(findings.issues()[0].message, "3 exceptions em requisições HTTP");
        assert!(console.contains("NullPointerException: 2"));
    }

    #[test]
    fn test_only_first_ten_endpoints_checked() {
        let endpoints: Vec<_> = (0..12)
            .map(|i| json!({ "uri": format!("/api/r{}", i), "method": "GET", "mean": "700ms", "max": "700ms" }))
            .collect();
        let (findings, _) = run(json!({ "endpoints": endpoints }));
        assert_eq!(findings.issues().len(), 10);
    }

    #[test]
    fn test_malformed_mean_skips_endpoint() {
        let (findings, console) = run(json!({
            "endpoints": [
                { "uri": "/a", "method": "GET", "mean": "NaNms", "max": "9000ms" },
                { "uri": "/b", "method": "POST", "mean": "800ms", "max": "bad" }
            ]
        }));
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].endpoint.as_deref(), Some("POST /b"));
        assert!(console.contains("GET /a"));
    }
}
