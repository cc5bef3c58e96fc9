//! JVM memory and thread pass

use std::io::{self, Write};

use super::{measured, section_header};
use crate::config::Thresholds;
use crate::findings::{Findings, Issue, IssueKind, Priority, Recommendation, Severity};
use crate::models::{or_na, JvmStats};

pub fn analyze(stats: &JvmStats, findings: &mut Findings, out: &mut impl Write) -> io::Result<()> {
    section_header(out, "ANÁLISE JVM")?;

    let heap = &stats.memory.heap;
    let non_heap = &stats.memory.non_heap;
    let usage = &heap.usage_percent;

    writeln!(
        out,
        "💾 Memória Heap: {} / {} ({})",
        or_na(&heap.used),
        or_na(&heap.max),
        usage
    )?;
    writeln!(
        out,
        "   Non-Heap: {} (committed: {})",
        or_na(&non_heap.used),
        or_na(&non_heap.committed)
    )?;

    if let Some(usage_pct) = measured(usage, "jvm.memory.heap.usagePercent") {
        if usage_pct > Thresholds::MEMORY_CRITICAL_PCT {
            findings.push_issue(Issue::new(
                Severity::Critical,
                IssueKind::MemoryUsage,
                format!("Uso de memória crítico: {}", usage),
            ));
            findings.recommend(
                Recommendation::new(
                    Priority::Critical,
                    "Reduzir Uso de Memória",
                    "Usar paginação, projeções (DTOs), ou aumentar heap size",
                )
                .with_impact(75),
            );
        } else if usage_pct > Thresholds::MEMORY_WARNING_PCT {
            findings.push_issue(Issue::new(
                Severity::Warning,
                IssueKind::MemoryUsage,
                format!("Uso de memória alto: {}", usage),
            ));
        }
    }

    let threads = &stats.threads;
    writeln!(
        out,
        "⚡ Threads: {} (pico: {}, daemon: {})",
        threads.current, threads.peak, threads.daemon
    )?;

    if threads.current > Thresholds::THREAD_COUNT_WARNING {
        findings.push_issue(Issue::new(
            Severity::Warning,
            IssueKind::ThreadCount,
            format!("Muitas threads ativas: {}", threads.current),
        ));
    }

    let runtime = &stats.runtime;
    if runtime.uptime.is_some() || runtime.vm_name.is_some() {
        writeln!(
            out,
            "⏱️ Uptime: {} | VM: {} {}",
            or_na(&runtime.uptime),
            or_na(&runtime.vm_name),
            runtime.vm_version.as_deref().unwrap_or_default()
        )?;
    }

    Ok(())
}
