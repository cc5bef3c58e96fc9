//! Request history pass

use std::io::{self, Write};

use super::section_header;
use crate::client::Source;
use crate::config::{Limits, Thresholds};
use crate::findings::{Findings, Issue, IssueKind, Priority, Recommendation, Severity};
use crate::models::{HistorySnapshot, RequestRecord, SlowestSnapshot};

pub fn analyze(
    history: &Source<HistorySnapshot>,
    slowest: &Source<SlowestSnapshot>,
    findings: &mut Findings,
    out: &mut impl Write,
) -> io::Result<()> {
    section_header(out, "HISTÓRICO DE REQUISIÇÕES")?;

    let history = match history {
        Source::Available(history) => history,
        Source::Absent(reason) => {
            writeln!(out, "🟡 Histórico não disponível ({})", reason)?;
            return Ok(());
        }
    };

    let stats = &history.stats;
    writeln!(out, "Total de requisições rastreadas: {}", stats.total_requests)?;
    writeln!(out, "Latência média: {}ms", stats.avg_duration)?;
    writeln!(out, "Latência mínima: {}ms", stats.min_duration)?;
    writeln!(out, "Latência máxima: {}ms", stats.max_duration)?;
    writeln!(out, "Requisições lentas: {}", stats.slow_requests)?;
    writeln!(out, "Requisições com N+1: {}", stats.n_plus_one_requests)?;
    writeln!(out, "Total de queries: {}", stats.total_queries)?;
    writeln!(out, "Requisições recentes retornadas: {}", history.recent_requests.len())?;

    let Some(slowest) = slowest.available() else {
        return Ok(());
    };
    if slowest.slowest.is_empty() {
        return Ok(());
    }

    writeln!(out, "\n🔥 TOP 5 REQUISIÇÕES MAIS LENTAS (Histórico):")?;
    for (i, record) in slowest.slowest.iter().take(Limits::TOP_HISTORY).enumerate() {
        check_record(i + 1, record, findings, out)?;
    }

    Ok(())
}

fn severity_for(duration_ms: u64) -> Severity {
    if duration_ms > Thresholds::HISTORY_CRITICAL_MS {
        Severity::Critical
    } else if duration_ms > Thresholds::HISTORY_WARNING_MS {
        Severity::Warning
    } else {
        Severity::Info
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "SIM"
    } else {
        "não"
    }
}

fn check_record(
    rank: usize,
    record: &RequestRecord,
    findings: &mut Findings,
    out: &mut impl Write,
) -> io::Result<()> {
    let route = record.route();
    let timestamp = record.timestamp_text();
    let severity = severity_for(record.duration_ms);
    let emoji = match severity {
        Severity::Info => "🟢",
        other => other.emoji(),
    };

    writeln!(out, "\n  {}. {} {}", rank, emoji, route)?;
    writeln!(
        out,
        "     Duração: {}ms | Queries: {} | N+1: {}",
        record.duration_ms,
        record.query_count,
        yes_no(record.had_n_plus_one)
    )?;
    writeln!(out, "     Timestamp: {}", timestamp)?;

    if record.duration_ms > Thresholds::HISTORY_REPORTABLE_MS {
        findings.push_issue(
            Issue::new(
                severity,
                IssueKind::VerySlowHistoricalRequest,
                format!(
                    "Requisição MUITO lenta detectada no histórico: {} ({}ms)",
                    route, record.duration_ms
                ),
            )
            .with_endpoint(route.clone())
            .with_timestamp(timestamp),
        );
        let priority = if record.duration_ms > Thresholds::HISTORY_CRITICAL_MS {
            Priority::Critical
        } else {
            Priority::High
        };
        findings.recommend(
            Recommendation::new(
                priority,
                format!("🔥 OTIMIZAR {}", route),
                format!(
                    "Requisição demorou {}ms! Queries: {}, N+1: {}",
                    record.duration_ms,
                    record.query_count,
                    yes_no(record.had_n_plus_one)
                ),
            )
            .with_impact(90),
        );
    }

    Ok(())
}
