//! One-shot audit run: fetch, analyze, report

use chrono::Local;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use tokio::task::JoinError;
use tracing::{info, warn};

use crate::client::{DiagnosticsClient, Source};
use crate::config::Endpoints;
use crate::error::{AuditError, Result};
use crate::findings::Findings;
use crate::models::{HistorySnapshot, PrimarySnapshot, SlowestSnapshot};
use crate::passes;
use crate::report::Report;

/// Everything fetched for a single run
pub struct Fetched {
    pub primary: PrimarySnapshot,
    pub history: Source<HistorySnapshot>,
    pub slowest: Source<SlowestSnapshot>,
}

/// Result of a completed run
#[derive(Debug)]
pub struct RunOutcome {
    pub report: Report,
    pub report_path: PathBuf,
}

/// Sequential performance audit of one backend
pub struct Analyzer {
    client: DiagnosticsClient,
    report_dir: PathBuf,
}

impl Analyzer {
    pub fn new(endpoints: Endpoints, report_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_client(DiagnosticsClient::new(endpoints)?, report_dir))
    }

    pub fn with_client(client: DiagnosticsClient, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            report_dir: report_dir.into(),
        }
    }

    /// Run the full audit, writing the console report to `out`.
    ///
    /// The report is rendered before it is persisted, so a failed write
    /// still leaves the console output intact.
    pub async fn run(&self, out: &mut impl Write) -> Result<RunOutcome> {
        writeln!(out, "\n🚀 ANALISADOR DE PERFORMANCE")?;
        writeln!(out, "{}\n", "=".repeat(80))?;

        let fetched = self.fetch(out).await?;

        let mut findings = Findings::new();
        passes::run_all(
            &fetched.primary.snapshot,
            &fetched.history,
            &fetched.slowest,
            &mut findings,
            out,
        )?;

        let report = Report::build(findings, fetched.primary.raw, Local::now());
        info!(
            critical = report.summary().critical_issues,
            warnings = report.summary().warnings,
            verdict = report.verdict().as_str(),
            "Analysis complete"
        );

        report.render(out)?;
        let report_path = report.persist(&self.report_dir)?;
        writeln!(out, "✅ Relatório salvo em: {}", report_path.display())?;

        Ok(RunOutcome {
            report,
            report_path,
        })
    }

    /// Fetch all three sources; only the performance snapshot is mandatory
    pub async fn fetch(&self, out: &mut impl Write) -> Result<Fetched> {
        writeln!(out, "🚀 Conectando aos endpoints de diagnóstico...")?;

        let primary = match self.client.fetch_performance().await {
            Ok(primary) => primary,
            Err(e) => {
                writeln!(out, "🚨 Erro ao conectar: {}", e)?;
                return Err(e);
            }
        };
        writeln!(out, "✅ Dados de performance coletados!")?;

        let history = self.client.fetch_history().await;
        match &history {
            Source::Available(_) => writeln!(out, "✅ Histórico de requisições coletado!")?,
            Source::Absent(_) => writeln!(
                out,
                "🟡 Histórico não disponível (normal se backend foi recém-iniciado)"
            )?,
        }

        let slowest = self.client.fetch_slowest().await;
        match &slowest {
            Source::Available(_) => writeln!(out, "✅ Top requisições lentas coletadas!")?,
            Source::Absent(_) => writeln!(out, "🟡 Dados de requisições lentas não disponíveis")?,
        }
        writeln!(out)?;

        Ok(Fetched {
            primary,
            history,
            slowest,
        })
    }
}

/// How a supervised run ended
#[derive(Debug)]
pub enum Termination {
    Completed(RunOutcome),
    Failed(AuditError),
    /// The run task panicked
    Aborted(JoinError),
    Interrupted,
}

impl Termination {
    pub fn exit_code(&self) -> u8 {
        match self {
            Termination::Completed(_) => 0,
            Termination::Failed(e) => e.exit_code(),
            Termination::Aborted(_) => 1,
            Termination::Interrupted => AuditError::Interrupted.exit_code(),
        }
    }
}

/// Run the audit on its own task until it ends or `interrupt` resolves.
///
/// An interrupted run is aborted before it can persist a report.
pub async fn supervise<W, I>(analyzer: Analyzer, mut out: W, interrupt: I) -> Termination
where
    W: Write + Send + 'static,
    I: Future<Output = ()>,
{
    let mut run = tokio::spawn(async move { analyzer.run(&mut out).await });

    tokio::select! {
        joined = &mut run => match joined {
            Ok(Ok(outcome)) => Termination::Completed(outcome),
            Ok(Err(e)) => Termination::Failed(e),
            Err(join_error) => Termination::Aborted(join_error),
        },
        () = interrupt => {
            run.abort();
            warn!("Audit interrupted");
            Termination::Interrupted
        }
    }
}
