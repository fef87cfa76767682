#![forbid(unsafe_code)]

mod cmd;
mod output;
mod host;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tembo_core::config::resolve_config;
use tembo_core::timing::{self, Stopwatch};
use tembo_sim::GeneratorConfig;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tembo: in-memory elephant archive with an explicit reference collector",
    long_about = None
)]
struct Cli {
    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Emit a per-operation timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Config file (default: tembo/config.toml in the user config dir).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed for the generated population.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Populate, break references, then collect",
        long_about = "Generate a population, break references in a scope, run the explicit \
                      collection pass, and report telemetry for every phase.",
        after_help = "EXAMPLES:\n    # Break everything and collect\n    tembo demo\n\n    # Break one family only\n    tembo demo --scope family\n\n    # Emit machine-readable output\n    tembo demo --format json"
    )]
    Demo(cmd::demo::DemoArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show archive statistics",
        after_help = "EXAMPLES:\n    tembo stats --seed 7"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Search",
        about = "Find the nearest water source available in a year",
        after_help = "EXAMPLES:\n    tembo nearest --x 24.0 --y -18.6 --year 2012"
    )]
    Nearest(cmd::nearest::NearestArgs),

    #[command(
        next_help_heading = "Search",
        about = "List drought records in a year range",
        after_help = "EXAMPLES:\n    tembo droughts --from 2005 --to 2012"
    )]
    Droughts(cmd::droughts::DroughtsArgs),

    #[command(
        next_help_heading = "Search",
        about = "List events by year, range, kind, elephant or distance",
        after_help = "EXAMPLES:\n    tembo events --year 2010\n    tembo events --from 2000 --to 2005\n    tembo events --kind migration\n    tembo events --elephant 3\n    tembo events --near 23.5 -19.0 --radius 0.5"
    )]
    Events(cmd::events::EventsArgs),

    #[command(
        next_help_heading = "Search",
        about = "Show which elephants visited a water source, per year",
        after_help = "EXAMPLES:\n    tembo visits 3"
    )]
    Visits(cmd::visits::VisitsArgs),

    #[command(
        next_help_heading = "Search",
        about = "Show ancestry and life history of an elephant",
        after_help = "EXAMPLES:\n    tembo timeline 12"
    )]
    Timeline(cmd::timeline::TimelineArgs),

    #[command(
        next_help_heading = "Search",
        about = "List migration anniversaries",
        after_help = "EXAMPLES:\n    tembo alerts --year 2025 --period 5"
    )]
    Alerts(cmd::alerts::AlertsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Export the archive as JSON",
        after_help = "EXAMPLES:\n    tembo export --output archive.json\n    tembo export --after-collect"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    tembo completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TEMBO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "tembo=debug,info"
        } else {
            "tembo=info,warn"
        })
    });

    let format = env::var("TEMBO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    let output = cli.output_mode();

    if let Commands::Completions(args) = &cli.command {
        return cmd::completions::run_completions(args.shell, &mut Cli::command());
    }

    let archive = resolve_config(cli.config.as_deref())?;
    let generator = cli
        .seed
        .map_or_else(GeneratorConfig::default, GeneratorConfig::seeded);
    debug!(seed = generator.seed, config = ?cli.config, "configuration resolved");

    let mut ctx = cmd::Context {
        output,
        archive,
        generator,
        stopwatch: Stopwatch::new(timing_enabled),
    };

    let command_result = match &cli.command {
        Commands::Demo(args) => cmd::demo::run_demo(args, &mut ctx),
        Commands::Stats(args) => cmd::stats::run_stats(args, &mut ctx),
        Commands::Nearest(args) => cmd::nearest::run_nearest(args, &mut ctx),
        Commands::Droughts(args) => cmd::droughts::run_droughts(args, &mut ctx),
        Commands::Events(args) => cmd::events::run_events(args, &mut ctx),
        Commands::Visits(args) => cmd::visits::run_visits(args, &mut ctx),
        Commands::Timeline(args) => cmd::timeline::run_timeline(args, &mut ctx),
        Commands::Alerts(args) => cmd::alerts::run_alerts(args, &mut ctx),
        Commands::Export(args) => cmd::export::run_export(args, &mut ctx),
        Commands::Completions(_) => Ok(()),
    };

    if ctx.stopwatch.is_enabled() {
        print_timing(&mut ctx.stopwatch)?;
    }

    command_result
}

fn print_timing(stopwatch: &mut Stopwatch) -> anyhow::Result<()> {
    let report = stopwatch.report();
    let mut err = std::io::stderr().lock();
    if report.is_empty() {
        writeln!(err, "[timing] nothing was timed")?;
        return Ok(());
    }
    writeln!(err, "[timing] per operation")?;
    write!(err, "{}", report.render_table())?;
    writeln!(err, "{}", serde_json::to_string(&report)?)?;
    Ok(())
}
