//! perf-audit - one-shot performance audit of a backend's diagnostics endpoints

use std::backtrace::{Backtrace, BacktraceStatus};
use std::io;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perf_audit::analyzer::{supervise, Analyzer, Termination};
use perf_audit::config::{Endpoints, REPORT_DIR};
use perf_audit::error::AuditError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr, the report owns stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perf_audit=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let endpoints = Endpoints::default();
    info!(base = %endpoints.performance, "perf-audit v{} starting", env!("CARGO_PKG_VERSION"));

    let analyzer = match Analyzer::new(endpoints, REPORT_DIR) {
        Ok(analyzer) => analyzer,
        Err(e) => return report_failure(e),
    };

    let interrupt = async {
        // Without a signal handler the run is never interrupted
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let ended = supervise(analyzer, io::stdout(), interrupt).await;
    let code = ended.exit_code();
    match ended {
        Termination::Completed(outcome) => {
            info!(path = %outcome.report_path.display(), "Audit finished");
        }
        Termination::Failed(e) => return report_failure(e),
        Termination::Aborted(join_error) => {
            // The panic message was already printed by the panic hook
            error!(error = %join_error, "Audit task aborted");
            eprintln!("\n🚨 Erro durante análise: {}", join_error);
        }
        Termination::Interrupted => {
            println!("\n\n🟠 Análise interrompida pelo usuário");
        }
    }

    ExitCode::from(code)
}

fn report_failure(e: AuditError) -> ExitCode {
    let code = e.exit_code();
    error!(error = %e, "Audit failed");

    // Unreachable primary endpoint was already reported on the console
    if !matches!(e, AuditError::Fetch { .. }) {
        eprintln!("\n🚨 Erro durante análise: {}", e);
        let trace = anyhow::Error::new(e);
        eprintln!("{:?}", trace);
        // anyhow only captures when RUST_BACKTRACE is set
        if trace.backtrace().status() != BacktraceStatus::Captured {
            eprintln!("\nStack backtrace:\n{}", Backtrace::force_capture());
        }
    }

    ExitCode::from(code)
}
