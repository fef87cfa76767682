#![forbid(unsafe_code)]
//! tembo-search library: read-only queries over an
//! [`Archive`](tembo_core::Archive).
//!
//! A [`SearchEngine`] borrows the archive immutably, so no query can change
//! it. The only state the engine owns is a set of lookup counters, kept in
//! `Cell`s and reported by [`SearchEngine::search_stats`].
//!
//! # Conventions
//!
//! - **Errors**: every query returns [`tembo_core::Result`].
//! - **Logging**: `tracing::debug!` per query with its result size.

pub mod engine;
pub mod stats;
pub mod timeline;

pub use engine::{
    DroughtEntry, DroughtHistory, MigrationAlert, NearbyEvent, NearestWater, SearchEngine,
    VisitYear,
};
pub use stats::{LookupCounts, SearchStats};
pub use timeline::{Ancestor, ParentRole, Timeline, TimelineEntry, TimelineEvent};
