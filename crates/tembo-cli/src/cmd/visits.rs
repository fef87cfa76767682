//! `tembo visits`: the visit log of one water source.

use std::io::{self, Write};

use clap::Args;
use serde::Serialize;
use tembo_core::WaterSourceId;
use tembo_search::{SearchEngine, VisitYear};

use super::{Context, PopulateArgs, populate};
use crate::output::{fail, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct VisitsArgs {
    /// Water source id.
    pub source: u64,

    #[command(flatten)]
    pub populate: PopulateArgs,
}

#[derive(Debug, Serialize)]
pub struct VisitReport {
    pub source: u64,
    pub name: String,
    pub total: usize,
    pub years: Vec<VisitYear>,
}

/// Execute `tembo visits`.
pub fn run_visits(args: &VisitsArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let (archive, _) = populate(ctx, &args.populate)?;
    let engine = SearchEngine::with_config(&archive, ctx.archive.search.clone());
    let id = WaterSourceId(args.source);
    let years = ctx
        .stopwatch
        .time("visits", || engine.visit_history(id))
        .map_err(|e| fail(ctx.output, &e))?;

    let report = VisitReport {
        source: args.source,
        name: archive
            .water_source(id)
            .map(|s| s.name().to_string())
            .unwrap_or_default(),
        total: years.iter().map(|y| y.elephants.len()).sum(),
        years,
    };
    render_mode(ctx.output, &report, render_text, render_pretty)
}

fn joined(ids: &[tembo_core::ElephantId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn render_text(r: &VisitReport, w: &mut dyn Write) -> io::Result<()> {
    for y in &r.years {
        writeln!(w, "{}\t{}", y.year, joined(&y.elephants))?;
    }
    Ok(())
}

fn render_pretty(r: &VisitReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Visits to {} (#{})", r.name, r.source))?;
    if r.years.is_empty() {
        return writeln!(w, "no visits recorded");
    }
    for y in &r.years {
        pretty_kv(w, &y.year.to_string(), joined(&y.elephants))?;
    }
    pretty_kv(w, "total", r.total.to_string())
}
