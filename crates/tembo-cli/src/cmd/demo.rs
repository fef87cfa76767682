//! `tembo demo`: populate, break references, then collect, with telemetry
//! snapshots between the phases.
//!
//! The point of the run is the gap between the second and third snapshot:
//! breaking references orphans elephants but frees nothing, and only the
//! explicit collection pass removes them.

use std::io::{self, Write};

use clap::{Args, ValueEnum};
use serde::Serialize;
use tembo_core::telemetry::{SnapshotDelta, TelemetrySnapshot};
use tembo_core::verify::check_archive;
use tembo_core::{
    ArchiveError, BreakReport, BreakScope, CollectionReport, ElephantId, HerdId, HostSampler,
    TelemetryLog,
};
use tracing::info;

use super::{Context, PopulateArgs, populate};
use crate::output::{fail, pretty_kv, pretty_section, render_mode};
use crate::host::SysinfoHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Every elephant.
    All,
    /// The family connected to `--target` (default: the first founder).
    Family,
    /// Current members of herd `--target` (default: the first herd).
    Herd,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    #[command(flatten)]
    pub populate: PopulateArgs,

    /// What to break before collecting.
    #[arg(long, value_enum, default_value_t = ScopeArg::All)]
    pub scope: ScopeArg,

    /// Elephant or herd id the scope applies to.
    #[arg(long)]
    pub target: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub seed: u64,
    pub host: &'static str,
    pub scope: String,
    pub broken: BreakReport,
    pub collection: CollectionSummary,
    pub snapshots: Vec<TelemetrySnapshot>,
    pub break_delta: Option<SnapshotDelta>,
    pub collect_delta: Option<SnapshotDelta>,
    pub invariants_ok: bool,
    pub violations: Vec<String>,
}

/// [`CollectionReport`] without the full id list.
#[derive(Debug, Serialize)]
pub struct CollectionSummary {
    pub examined: usize,
    pub marked: usize,
    pub collected: usize,
    pub still_orphaned: usize,
    pub events_scrubbed: usize,
    pub visits_scrubbed: usize,
}

impl From<&CollectionReport> for CollectionSummary {
    fn from(r: &CollectionReport) -> Self {
        Self {
            examined: r.examined,
            marked: r.marked,
            collected: r.collected_count(),
            still_orphaned: r.still_orphaned,
            events_scrubbed: r.events_scrubbed,
            visits_scrubbed: r.visits_scrubbed,
        }
    }
}

const POPULATED: &str = "populated";
const BROKEN: &str = "references broken";
const COLLECTED: &str = "collected";

/// Execute `tembo demo`.
pub fn run_demo(args: &DemoArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let host = SysinfoHost::default();
    let mut log = TelemetryLog::new();
    log.take("start", &tembo_core::Archive::default(), &host);

    let (mut archive, dataset) = populate(ctx, &args.populate)?;
    log.take(POPULATED, &archive, &host);

    let scope = match args.scope {
        ScopeArg::All => BreakScope::All,
        ScopeArg::Family => {
            let founder = args
                .target
                .map(ElephantId)
                .or_else(|| dataset.elephants.first().copied())
                .ok_or_else(|| fail(ctx.output, &ArchiveError::not_found("elephant", "any")))?;
            BreakScope::Family(founder)
        }
        ScopeArg::Herd => {
            let herd = args
                .target
                .map(HerdId)
                .or_else(|| dataset.herds.first().copied())
                .ok_or_else(|| fail(ctx.output, &ArchiveError::not_found("herd", "any")))?;
            BreakScope::Herd(herd)
        }
    };
    let scope_label = describe(&scope);

    let broken = ctx
        .stopwatch
        .time("break", || archive.break_references(scope))
        .map_err(|e| fail(ctx.output, &e))?;
    log.take(BROKEN, &archive, &host);

    let collection = ctx.stopwatch.time("collect", || archive.run_collection());
    log.take(COLLECTED, &archive, &host);

    let oracle = ctx.stopwatch.time("verify", || check_archive(&archive));
    info!(
        orphaned = broken.orphaned,
        collected = collection.collected_count(),
        invariants_ok = oracle.passed,
        "demo finished"
    );

    let report = DemoReport {
        seed: ctx.generator.seed,
        host: host.name(),
        scope: scope_label,
        broken,
        collection: CollectionSummary::from(&collection),
        break_delta: log.compare(POPULATED, BROKEN),
        collect_delta: log.compare(BROKEN, COLLECTED),
        snapshots: log.snapshots().to_vec(),
        invariants_ok: oracle.passed,
        violations: oracle.violations.iter().map(ToString::to_string).collect(),
    };

    render_mode(ctx.output, &report, render_text, render_pretty)?;
    if report.invariants_ok {
        Ok(())
    } else {
        anyhow::bail!("{} invariant violation(s) after collection", report.violations.len())
    }
}

fn render_text(r: &DemoReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "phase\tentities\telephants\torphaned\tcollected\tlinks\theap_bytes")?;
    for s in &r.snapshots {
        let a = &s.archive;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            s.label,
            a.live_entities,
            a.live_elephants,
            a.orphaned,
            a.collected_total,
            a.relation_links,
            a.approx_heap_bytes
        )?;
    }
    writeln!(w, "invariants\t{}", if r.invariants_ok { "ok" } else { "FAILED" })
}

fn render_pretty(r: &DemoReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Reference lifecycle demo")?;
    pretty_kv(w, "seed", r.seed.to_string())?;
    pretty_kv(w, "scope", &r.scope)?;
    pretty_kv(w, "host figures", r.host)?;
    writeln!(w)?;

    for s in &r.snapshots {
        pretty_section(w, &s.label)?;
        let a = &s.archive;
        pretty_kv(w, "live entities", a.live_entities.to_string())?;
        pretty_kv(w, "live elephants", a.live_elephants.to_string())?;
        pretty_kv(w, "orphaned", a.orphaned.to_string())?;
        pretty_kv(w, "collected total", a.collected_total.to_string())?;
        pretty_kv(w, "relation links", a.relation_links.to_string())?;
        pretty_kv(w, "approx heap", format_bytes(a.approx_heap_bytes as u64))?;
        if let Some(rss) = s.host.resident_bytes {
            pretty_kv(w, "resident", format_bytes(rss))?;
        }
        writeln!(w)?;
    }

    pretty_section(w, "Phases")?;
    pretty_kv(
        w,
        "break",
        format!(
            "{} in scope, {} orphaned, {} herd links severed",
            r.broken.in_scope, r.broken.orphaned, r.broken.herd_links_severed
        ),
    )?;
    if let Some(d) = r.break_delta {
        pretty_kv(w, "  elephants freed", (-d.live_elephants).to_string())?;
    }
    pretty_kv(
        w,
        "collect",
        format!(
            "{} examined, {} marked, {} collected",
            r.collection.examined, r.collection.marked, r.collection.collected
        ),
    )?;
    if let Some(d) = r.collect_delta {
        pretty_kv(w, "  elephants freed", (-d.live_elephants).to_string())?;
        pretty_kv(w, "  links dropped", (-d.relation_links).to_string())?;
    }
    pretty_kv(
        w,
        "invariants",
        if r.invariants_ok { "ok".to_string() } else { r.violations.join("; ") },
    )
}

fn describe(scope: &BreakScope) -> String {
    match scope {
        BreakScope::All => "all".to_string(),
        BreakScope::Family(id) => format!("family of elephant {id}"),
        BreakScope::Herd(id) => format!("herd {id}"),
        BreakScope::Elephants(ids) => format!("{} elephants", ids.len()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if bytes >= 1024 * 1024 {
        format!("{:.2} MiB", bytes as f64 / MIB)
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}
