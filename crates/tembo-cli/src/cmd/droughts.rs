//! `tembo droughts`: drought records in a year range, grouped per source.

use std::io::{self, Write};

use clap::Args;
use serde::Serialize;
use tembo_search::{DroughtHistory, SearchEngine};

use super::{Context, PopulateArgs, populate};
use crate::output::{fail, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct DroughtsArgs {
    #[arg(long)]
    pub from: i32,

    #[arg(long)]
    pub to: i32,

    #[command(flatten)]
    pub populate: PopulateArgs,
}

#[derive(Debug, Serialize)]
pub struct SourceDroughts {
    pub id: u64,
    pub name: String,
    pub years: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct DroughtReport {
    pub from: i32,
    pub to: i32,
    pub total: usize,
    pub sources: Vec<SourceDroughts>,
}

/// Execute `tembo droughts`.
pub fn run_droughts(args: &DroughtsArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let (archive, _) = populate(ctx, &args.populate)?;
    let engine = SearchEngine::with_config(&archive, ctx.archive.search.clone());
    let history: DroughtHistory = ctx
        .stopwatch
        .time("droughts", || engine.drought_history(args.from, args.to))
        .map_err(|e| fail(ctx.output, &e))?;

    let sources = history
        .by_source()
        .into_iter()
        .map(|(id, years)| SourceDroughts {
            id: id.get(),
            name: archive
                .water_source(id)
                .map(|s| s.name().to_string())
                .unwrap_or_default(),
            years,
        })
        .collect();
    let report = DroughtReport {
        from: history.from,
        to: history.to,
        total: history.entries.len(),
        sources,
    };
    render_mode(ctx.output, &report, render_text, render_pretty)
}

fn render_text(r: &DroughtReport, w: &mut dyn Write) -> io::Result<()> {
    for s in &r.sources {
        let years: Vec<String> = s.years.iter().map(ToString::to_string).collect();
        writeln!(w, "{}\t{}\t{}", s.id, s.name, years.join(","))?;
    }
    Ok(())
}

fn render_pretty(r: &DroughtReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Droughts {}..={}", r.from, r.to))?;
    if r.sources.is_empty() {
        return writeln!(w, "no droughts recorded");
    }
    for s in &r.sources {
        let years: Vec<String> = s.years.iter().map(ToString::to_string).collect();
        pretty_kv(w, &s.name, years.join(", "))?;
    }
    pretty_kv(w, "total", r.total.to_string())
}
