//! `tembo nearest`: closest water source available in a given year.

use std::io::{self, Write};

use clap::Args;
use tembo_search::{NearestWater, SearchEngine};

use super::{Context, PopulateArgs, populate};
use crate::output::{fail, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct NearestArgs {
    /// Longitude-like x coordinate.
    #[arg(long, allow_negative_numbers = true)]
    pub x: f64,

    /// Latitude-like y coordinate.
    #[arg(long, allow_negative_numbers = true)]
    pub y: f64,

    /// Year the source must be available in.
    #[arg(long)]
    pub year: i32,

    #[command(flatten)]
    pub populate: PopulateArgs,
}

/// Execute `tembo nearest`.
pub fn run_nearest(args: &NearestArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let (archive, _) = populate(ctx, &args.populate)?;
    let engine = SearchEngine::with_config(&archive, ctx.archive.search.clone());
    let hit = ctx
        .stopwatch
        .time("nearest", || engine.nearest_water_source(args.x, args.y, args.year))
        .map_err(|e| fail(ctx.output, &e))?;
    render_mode(ctx.output, &hit, render_text, render_pretty)
}

fn render_text(h: &NearestWater, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}\t{}\t{:.4}", h.id, h.name, h.distance)
}

fn render_pretty(h: &NearestWater, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Nearest available water")?;
    pretty_kv(w, "source", format!("{} (#{})", h.name, h.id))?;
    pretty_kv(w, "position", h.position.to_string())?;
    pretty_kv(w, "distance", format!("{:.4}", h.distance))?;
    pretty_kv(w, "grid rings", h.rings_scanned.to_string())?;
    pretty_kv(w, "examined", h.examined.to_string())
}
