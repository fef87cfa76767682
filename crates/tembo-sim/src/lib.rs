#![forbid(unsafe_code)]
//! tembo-sim: deterministic synthetic population for a tembo archive.
//!
//! A [`Generator`] owns a seeded RNG and drives only the public
//! [`tembo_core::Archive`] API. The same [`GeneratorConfig`] (seed
//! included) always produces the same archive contents and ids.

pub mod config;
pub mod generator;
pub mod names;

pub use config::{GeneratorConfig, Region};
pub use generator::{Dataset, DatasetPlan, Generator};
