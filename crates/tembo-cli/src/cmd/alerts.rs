//! `tembo alerts`: migration anniversaries falling on a given year.

use std::io::{self, Write};

use chrono::Datelike;
use clap::Args;
use serde::Serialize;
use tembo_search::{MigrationAlert, SearchEngine};

use super::{Context, PopulateArgs, populate};
use crate::output::{fail, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct AlertsArgs {
    /// Year to check (default: the current year).
    #[arg(long)]
    pub year: Option<i32>,

    /// Anniversary period in years (default: `search.anniversary_period`).
    #[arg(long)]
    pub period: Option<u32>,

    #[command(flatten)]
    pub populate: PopulateArgs,
}

#[derive(Debug, Serialize)]
pub struct AlertReport {
    pub year: i32,
    pub period: u32,
    pub alerts: Vec<MigrationAlert>,
}

/// Execute `tembo alerts`.
pub fn run_alerts(args: &AlertsArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let year = args.year.unwrap_or_else(|| chrono::Utc::now().year());
    let period = args.period.unwrap_or(ctx.archive.search.anniversary_period);

    let (archive, _) = populate(ctx, &args.populate)?;
    let engine = SearchEngine::with_config(&archive, ctx.archive.search.clone());
    let alerts = ctx
        .stopwatch
        .time("alerts", || engine.migration_alerts(year, period))
        .map_err(|e| fail(ctx.output, &e))?;
    let report = AlertReport {
        year,
        period,
        alerts,
    };
    render_mode(ctx.output, &report, render_text, render_pretty)
}

fn render_text(r: &AlertReport, w: &mut dyn Write) -> io::Result<()> {
    for a in &r.alerts {
        writeln!(w, "{}\t{}\t{}\t{}", a.event, a.year, a.years_ago, a.message)?;
    }
    Ok(())
}

fn render_pretty(r: &AlertReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!("Migration anniversaries in {} (every {} years)", r.year, r.period),
    )?;
    if r.alerts.is_empty() {
        return writeln!(w, "no anniversaries this year");
    }
    for a in &r.alerts {
        writeln!(w, "#{:<6} {}", a.event, a.message)?;
    }
    Ok(())
}
