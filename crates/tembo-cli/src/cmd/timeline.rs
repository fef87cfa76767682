//! `tembo timeline`: ancestry and life history of one elephant.

use std::io::{self, Write};

use clap::Args;
use tembo_core::ElephantId;
use tembo_search::{SearchEngine, Timeline, TimelineEvent};

use super::{Context, PopulateArgs, populate};
use crate::output::{fail, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Elephant id, as printed by `tembo export` or `tembo events`.
    pub id: u64,

    #[command(flatten)]
    pub populate: PopulateArgs,
}

/// Execute `tembo timeline`.
pub fn run_timeline(args: &TimelineArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let (archive, _) = populate(ctx, &args.populate)?;
    let engine = SearchEngine::with_config(&archive, ctx.archive.search.clone());
    let timeline = ctx
        .stopwatch
        .time("timeline", || engine.elephant_timeline(ElephantId(args.id)))
        .map_err(|e| fail(ctx.output, &e))?;
    render_mode(ctx.output, &timeline, render_text, render_pretty)
}

fn what(event: &TimelineEvent) -> String {
    match event {
        TimelineEvent::Born => "born".to_string(),
        TimelineEvent::ChildBorn { child, name } => format!("child {name} (#{child}) born"),
        TimelineEvent::Event {
            event,
            kind,
            description,
        } => format!("{kind} #{event}: {description}"),
        TimelineEvent::Died => "died".to_string(),
    }
}

fn render_text(t: &Timeline, w: &mut dyn Write) -> io::Result<()> {
    for a in &t.ancestors {
        writeln!(w, "ancestor\t{}\t{}\t{}", a.generation, a.id, a.name)?;
    }
    for e in &t.entries {
        writeln!(w, "{}\t{}", e.year, what(&e.what))?;
    }
    Ok(())
}

fn render_pretty(t: &Timeline, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("{} (#{})", t.name, t.elephant))?;
    if t.ancestors.is_empty() {
        pretty_kv(w, "ancestors", "none recorded")?;
    }
    for a in &t.ancestors {
        let role = match a.role {
            tembo_search::ParentRole::Mother => "maternal",
            tembo_search::ParentRole::Father => "paternal",
        };
        pretty_kv(
            w,
            &format!("generation {}", a.generation),
            format!("{} (#{}, {role}, b. {})", a.name, a.id, a.birth_year),
        )?;
    }
    if t.truncated {
        writeln!(w, "(older generations not shown)")?;
    }
    writeln!(w)?;
    for e in &t.entries {
        writeln!(w, "{:>6}  {}", e.year, what(&e.what))?;
    }
    Ok(())
}
