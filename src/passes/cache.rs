//! Application cache pass

use std::io::{self, Write};

use super::section_header;
use crate::findings::{Findings, Priority, Recommendation};
use crate::models::{or_na, CacheStats};

pub fn analyze(stats: &CacheStats, findings: &mut Findings, out: &mut impl Write) -> io::Result<()> {
    section_header(out, "ANÁLISE DE CACHE")?;

    if stats.caches.is_empty() {
        writeln!(out, "🟡 Nenhum cache configurado")?;
        findings.recommend(
            Recommendation::new(
                Priority::Medium,
                "Configurar Cache",
                "Adicionar cache para dados frequentemente acessados",
            )
            .with_impact(50),
        );
        return Ok(());
    }

    let total = stats.total_caches.unwrap_or(stats.caches.len() as u64);
    writeln!(out, "Total de caches: {}", total)?;
    for cache in &stats.caches {
        writeln!(out, "  📦 {} ({})", or_na(&cache.name), or_na(&cache.kind))?;
    }

    Ok(())
}
