#![forbid(unsafe_code)]
//! tembo-core library: the elephant archive.
//!
//! An [`Archive`] owns every elephant, herd, event and water source, keeps
//! the derived indexes in step with each mutation, and drives the reference
//! lifecycle: [`Archive::break_references`] orphans part of the graph and
//! [`Archive::run_collection`] purges whatever no root reaches any more.
//!
//! # Conventions
//!
//! - **Errors**: library operations return [`ArchiveError`]; config loading
//!   uses `anyhow::Result`.
//! - **Logging**: `tracing` macros (`debug!` per mutation, `info!` for
//!   lifecycle summaries).

pub mod archive;
pub mod config;
pub mod error;
pub mod export;
pub mod index;
pub mod lifecycle;
pub mod model;
pub mod telemetry;
pub mod timing;
pub mod verify;

pub use archive::Archive;
pub use config::ArchiveConfig;
pub use error::{ArchiveError, ErrorCode, Result};
pub use export::ArchiveSnapshot;
pub use lifecycle::{BreakReport, BreakScope, CollectionReport, LifecycleState};
pub use model::{
    Availability, Capacity, Elephant, ElephantAttrs, ElephantId, Event, EventAttrs, EventId,
    EventKind, EventLocation, Gender, Herd, HerdAttrs, HerdId, Point, WaterSource,
    WaterSourceAttrs, WaterSourceId,
};
pub use telemetry::{ArchiveCounters, HostSample, HostSampler, NullSampler, TelemetryLog};
