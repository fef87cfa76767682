//! `tembo events`: event lookups by year, range, kind, participant or
//! distance from a point.

use std::io::{self, Write};

use clap::Args;
use serde::Serialize;
use tembo_core::{ArchiveError, ElephantId, Event, EventKind, EventLocation};
use tembo_search::SearchEngine;

use super::{Context, PopulateArgs, populate};
use crate::output::{fail, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Events of exactly this year.
    #[arg(long, conflicts_with_all = ["from", "kind", "elephant"])]
    pub year: Option<i32>,

    /// Start of an inclusive year range (needs `--to`).
    #[arg(long, requires = "to", conflicts_with_all = ["kind", "elephant"])]
    pub from: Option<i32>,

    #[arg(long, requires = "from")]
    pub to: Option<i32>,

    /// Events of one kind, e.g. `migration` or `water_discovery`.
    #[arg(long, conflicts_with = "elephant")]
    pub kind: Option<EventKind>,

    /// Events an elephant took part in.
    #[arg(long)]
    pub elephant: Option<u64>,

    /// Located events within `--radius` of this point, closest first.
    #[arg(
        long,
        num_args = 2,
        value_names = ["X", "Y"],
        allow_negative_numbers = true,
        requires = "radius",
        conflicts_with_all = ["year", "from", "kind", "elephant"]
    )]
    pub near: Option<Vec<f64>>,

    #[arg(long, requires = "near", allow_negative_numbers = true)]
    pub radius: Option<f64>,

    /// Show at most this many events.
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    #[command(flatten)]
    pub populate: PopulateArgs,
}

#[derive(Debug, Serialize)]
pub struct EventRow {
    pub id: u64,
    pub kind: EventKind,
    pub year: i32,
    pub description: String,
    pub elephants: usize,
    pub herds: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<&Event> for EventRow {
    fn from(e: &Event) -> Self {
        Self {
            id: e.id().get(),
            kind: e.kind(),
            year: e.year(),
            description: if e.description().is_empty() {
                describe_location(e.location())
            } else {
                e.description().to_string()
            },
            elephants: e.elephants().len(),
            herds: e.herds().len(),
            distance: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventList {
    pub query: String,
    pub total: usize,
    pub events: Vec<EventRow>,
}

/// Execute `tembo events`.
pub fn run_events(args: &EventsArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let (archive, _) = populate(ctx, &args.populate)?;
    let engine = SearchEngine::with_config(&archive, ctx.archive.search.clone());

    if let (Some(&[x, y]), Some(radius)) = (args.near.as_deref(), args.radius) {
        let hits = engine
            .events_near(x, y, radius)
            .map_err(|e| fail(ctx.output, &e))?;
        let rows: Vec<EventRow> = hits
            .iter()
            .filter_map(|hit| {
                let event = archive.event(hit.event).ok()?;
                Some(EventRow {
                    distance: Some(hit.distance),
                    ..EventRow::from(event)
                })
            })
            .collect();
        let list = EventList {
            query: format!("within {radius} of ({x}, {y})"),
            total: rows.len(),
            events: rows.into_iter().take(args.limit).collect(),
        };
        return render_mode(ctx.output, &list, render_text, render_pretty);
    }

    let (query, found): (String, Result<Vec<&Event>, ArchiveError>) =
        match (args.year, args.from.zip(args.to), args.kind, args.elephant) {
            (Some(year), ..) => (format!("year {year}"), Ok(engine.events_by_year(year))),
            (_, Some((from, to)), ..) => (
                format!("years {from}..={to}"),
                engine.events_in_range(from, to),
            ),
            (_, _, Some(kind), _) => (format!("kind {kind}"), Ok(engine.events_by_kind(kind))),
            (_, _, _, Some(id)) => (
                format!("elephant {id}"),
                engine.events_for_elephant(ElephantId(id)),
            ),
            _ => (
                "all years".to_string(),
                engine.events_in_range(i32::MIN, i32::MAX),
            ),
        };
    let found = found.map_err(|e| fail(ctx.output, &e))?;

    let list = EventList {
        query,
        total: found.len(),
        events: found.into_iter().take(args.limit).map(EventRow::from).collect(),
    };
    render_mode(ctx.output, &list, render_text, render_pretty)
}

fn describe_location(location: Option<EventLocation>) -> String {
    match location {
        Some(EventLocation::Coordinates(p)) => format!("at {p}"),
        Some(EventLocation::WaterSource(id)) => format!("at water source {id}"),
        None => String::new(),
    }
}

fn render_text(l: &EventList, w: &mut dyn Write) -> io::Result<()> {
    for e in &l.events {
        match e.distance {
            Some(d) => writeln!(w, "{}\t{}\t{}\t{d:.2}\t{}", e.id, e.year, e.kind, e.description)?,
            None => writeln!(w, "{}\t{}\t{}\t{}", e.id, e.year, e.kind, e.description)?,
        }
    }
    Ok(())
}

fn render_pretty(l: &EventList, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Events ({}): {} found", l.query, l.total))?;
    for e in &l.events {
        let away = e.distance.map(|d| format!(" {d:.2} away")).unwrap_or_default();
        writeln!(
            w,
            "#{:<6} {:<5} {:<16} {} [{} elephants, {} herds]{away}",
            e.id, e.year, e.kind, e.description, e.elephants, e.herds
        )?;
    }
    if l.total > l.events.len() {
        writeln!(w, "... {} more", l.total - l.events.len())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tembo_core::Point;

    #[test]
    fn location_fallback_description() {
        assert_eq!(
            describe_location(Some(EventLocation::Coordinates(Point::new(1.0, 2.5)))),
            "at (1.00, 2.50)"
        );
        assert_eq!(describe_location(None), "");
    }
}
