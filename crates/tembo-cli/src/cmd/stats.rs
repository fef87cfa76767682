//! `tembo stats`: archive counters, index sizes and lifecycle totals.

use std::collections::BTreeMap;
use std::io::{self, Write};

use clap::Args;
use serde::Serialize;
use tembo_core::{ArchiveCounters, LifecycleState};
use tembo_search::{SearchEngine, SearchStats};

use super::{Context, PopulateArgs, populate};
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub populate: PopulateArgs,
}

#[derive(Debug, Serialize)]
pub struct ArchiveStats {
    pub seed: u64,
    pub counters: ArchiveCounters,
    pub herds: usize,
    pub events: usize,
    pub water_sources: usize,
    pub avg_children: f64,
    pub lifecycle: BTreeMap<&'static str, usize>,
    pub search: SearchStats,
}

/// Execute `tembo stats`.
pub fn run_stats(args: &StatsArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let (archive, _) = populate(ctx, &args.populate)?;

    let mut lifecycle = BTreeMap::new();
    for id in archive.elephant_ids() {
        if let Ok(state) = archive.lifecycle_state(id) {
            *lifecycle.entry(state.as_str()).or_insert(0) += 1;
        }
    }
    let counters = archive.counters();
    lifecycle.insert(
        LifecycleState::Collected.as_str(),
        usize::try_from(counters.collected_total).unwrap_or(usize::MAX),
    );
    let children: usize = archive.elephants().map(|e| e.children().len()).sum();
    #[allow(clippy::cast_precision_loss)]
    let avg_children = if counters.live_elephants == 0 {
        0.0
    } else {
        children as f64 / counters.live_elephants as f64
    };

    let engine = SearchEngine::with_config(&archive, ctx.archive.search.clone());
    let stats = ArchiveStats {
        seed: ctx.generator.seed,
        counters,
        herds: archive.herds().count(),
        events: archive.events().count(),
        water_sources: archive.water_sources().count(),
        avg_children,
        lifecycle,
        search: engine.search_stats(),
    };
    render_mode(ctx.output, &stats, render_text, render_pretty)
}

fn render_text(s: &ArchiveStats, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "elephants\t{}", s.counters.live_elephants)?;
    writeln!(w, "herds\t{}", s.herds)?;
    writeln!(w, "events\t{}", s.events)?;
    writeln!(w, "water_sources\t{}", s.water_sources)?;
    writeln!(w, "relation_links\t{}", s.counters.relation_links)?;
    writeln!(w, "avg_children\t{:.2}", s.avg_children)?;
    for (state, n) in &s.lifecycle {
        writeln!(w, "{state}\t{n}")?;
    }
    Ok(())
}

fn render_pretty(s: &ArchiveStats, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Archive")?;
    pretty_kv(w, "seed", s.seed.to_string())?;
    pretty_kv(w, "elephants", s.counters.live_elephants.to_string())?;
    pretty_kv(w, "herds", s.herds.to_string())?;
    pretty_kv(w, "events", s.events.to_string())?;
    pretty_kv(w, "water sources", s.water_sources.to_string())?;
    pretty_kv(w, "relation links", s.counters.relation_links.to_string())?;
    pretty_kv(w, "avg children", format!("{:.2}", s.avg_children))?;
    pretty_kv(w, "approx heap", format!("{} bytes", s.counters.approx_heap_bytes))?;
    writeln!(w)?;

    pretty_section(w, "Lifecycle")?;
    for (state, n) in &s.lifecycle {
        pretty_kv(w, state, n.to_string())?;
    }
    writeln!(w)?;

    let ix = &s.search.indexes;
    pretty_section(w, "Indexes")?;
    pretty_kv(w, "years", format!("{} events over {} years", ix.year_entries, ix.years_covered))?;
    pretty_kv(w, "names", format!("{} entries, {} distinct", ix.name_entries, ix.distinct_names))?;
    pretty_kv(
        w,
        "spatial",
        format!(
            "{} sources in {} cells ({:.2} per cell)",
            ix.spatial_entries, ix.spatial_cells, ix.spatial_average_occupancy
        ),
    )?;
    pretty_kv(
        w,
        "participants",
        format!("{} links, {} elephants", ix.participant_entries, ix.elephants_with_events),
    )?;
    pretty_kv(w, "births", format!("{} elephants over {} years", ix.birth_entries, ix.birth_years_covered))?;
    pretty_kv(w, "herd names", ix.herd_name_entries.to_string())?;
    pretty_kv(
        w,
        "locations",
        format!("{} events in {} cells", ix.location_entries, ix.location_cells),
    )?;
    pretty_kv(w, "visitors", ix.visitor_entries.to_string())?;
    writeln!(w)?;

    pretty_section(w, "Events by kind")?;
    for (kind, n) in &s.search.events_per_kind {
        pretty_kv(w, kind.as_str(), n.to_string())?;
    }
    Ok(())
}
