//! Subcommand handlers.
//!
//! The archive lives in memory only, so every command starts from a freshly
//! generated population. The same `--seed` and population flags always give
//! the same archive and ids, which is what makes ids from one invocation
//! usable in the next.

pub mod alerts;
pub mod completions;
pub mod demo;
pub mod droughts;
pub mod events;
pub mod export;
pub mod nearest;
pub mod stats;
pub mod timeline;
pub mod visits;

use anyhow::Context as _;
use clap::Args;
use tembo_core::timing::Stopwatch;
use tembo_core::{Archive, ArchiveConfig};
use tembo_sim::{Dataset, DatasetPlan, Generator, GeneratorConfig};
use tracing::debug;

use crate::output::{OutputMode, fail};

/// Everything a handler needs besides its own arguments.
#[derive(Debug)]
pub struct Context {
    pub output: OutputMode,
    pub archive: ArchiveConfig,
    pub generator: GeneratorConfig,
    pub stopwatch: Stopwatch,
}

/// Population size flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct PopulateArgs {
    /// Independent family trees to generate.
    #[arg(long, default_value_t = 5)]
    pub families: usize,

    /// Generations per family, founder included.
    #[arg(long, default_value_t = 5)]
    pub generations: u32,

    /// Most children drawn per elephant.
    #[arg(long, default_value_t = 3)]
    pub children: u32,

    #[arg(long, default_value_t = 10)]
    pub herds: usize,

    #[arg(long, default_value_t = 1000)]
    pub events: usize,

    #[arg(long, default_value_t = 10)]
    pub water_sources: usize,

    /// Years of availability recorded per water source.
    #[arg(long, default_value_t = 26)]
    pub years: u32,

    /// Random water source visits to log.
    #[arg(long, default_value_t = 200)]
    pub visits: usize,
}

impl Default for PopulateArgs {
    fn default() -> Self {
        let plan = DatasetPlan::default();
        Self {
            families: plan.families,
            generations: plan.generations,
            children: plan.children_per_elephant,
            herds: plan.herds,
            events: plan.events,
            water_sources: plan.water_sources,
            years: plan.year_span,
            visits: plan.visits,
        }
    }
}

impl PopulateArgs {
    pub const fn plan(&self) -> DatasetPlan {
        DatasetPlan {
            families: self.families,
            generations: self.generations,
            children_per_elephant: self.children,
            herds: self.herds,
            events: self.events,
            water_sources: self.water_sources,
            year_span: self.years,
            visits: self.visits,
        }
    }
}

/// Build an archive from the resolved config and fill it with the
/// seeded population.
///
/// # Errors
///
/// Returns an error if the generator config is invalid or the plan is out
/// of bounds; archive errors are also rendered to stderr.
pub fn populate(ctx: &mut Context, args: &PopulateArgs) -> anyhow::Result<(Archive, Dataset)> {
    let mut archive = Archive::with_config(ctx.archive.clone()).map_err(|e| fail(ctx.output, &e))?;
    let mut generator =
        Generator::new(ctx.generator.clone()).context("invalid generator configuration")?;
    let plan = args.plan();
    let dataset = ctx
        .stopwatch
        .time("populate", || generator.generate_dataset(&mut archive, &plan))
        .map_err(|e| fail(ctx.output, &e))?;
    debug!(
        seed = ctx.generator.seed,
        elephants = dataset.elephants.len(),
        "archive populated"
    );
    Ok((archive, dataset))
}
