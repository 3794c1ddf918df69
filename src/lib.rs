//! Parking-lot occupancy collector
//!
//! This library polls a municipal parking site, classifies the occupancy status of every lot and
//! appends the results to a JSON history. It uses [`reqwest`] and [`scraper`] under the hood.
//!
//! # Organization
//!
//! A run is driven by [`job::Job::run_once`]: the [`collect::Collector`] resolves the lot
//! directory, orders lots with [`priority::prioritize`] and classifies each one; the
//! [`gate::GateConfig`] then decides whether the snapshot is worth keeping, and the
//! [`store::Store`] appends it. The [`schedule::Scheduler`] fires runs at fixed minute marks,
//! one at a time.
//!
#[macro_use]
extern crate lazy_static;

mod field;

pub mod classifier;
pub mod collect;
pub mod config;
pub mod directory;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod job;
pub mod priority;
pub mod report;
pub mod schedule;
pub mod status;
pub mod store;

pub use crate::config::Config;
pub use crate::job::{Job, RunOutcome};
pub use crate::status::{LotId, NameDirectory, Snapshot, StatusCategory};
