//! `tembo export`: write the archive snapshot as JSON.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use tembo_core::{ArchiveSnapshot, BreakScope};
use tracing::info;

use super::{Context, PopulateArgs, populate};
use crate::output::{fail, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Collect orphaned elephants after breaking every reference first.
    #[arg(long)]
    pub after_collect: bool,

    #[command(flatten)]
    pub populate: PopulateArgs,
}

#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub exported_at: DateTime<Utc>,
    pub seed: u64,
    pub archive: &'a ArchiveSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub elephants: usize,
    pub events: usize,
}

/// Execute `tembo export`.
///
/// Without `--output` the document goes to stdout as JSON whatever the
/// output mode.
pub fn run_export(args: &ExportArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let (mut archive, _) = populate(ctx, &args.populate)?;
    if args.after_collect {
        archive
            .break_references(BreakScope::All)
            .map_err(|e| fail(ctx.output, &e))?;
        archive.run_collection();
    }
    let snapshot = ctx.stopwatch.time("export", || archive.export());
    let document = ExportDocument {
        exported_at: Utc::now(),
        seed: ctx.generator.seed,
        archive: &snapshot,
    };

    let Some(path) = &args.output else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &document)?;
        writeln!(out)?;
        return Ok(());
    };

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &document)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer.flush()?;
    info!(path = %path.display(), elephants = snapshot.elephants.len(), "archive exported");

    let summary = ExportSummary {
        path: path.clone(),
        elephants: snapshot.elephants.len(),
        events: snapshot.events.len(),
    };
    render_mode(
        ctx.output,
        &summary,
        |s, w| writeln!(w, "{}", s.path.display()),
        |s, w| {
            pretty_kv(w, "exported", s.path.display().to_string())?;
            pretty_kv(w, "elephants", s.elephants.to_string())?;
            pretty_kv(w, "events", s.events.to_string())
        },
    )
}
