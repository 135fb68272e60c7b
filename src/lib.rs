//! routine_load_admin: operator tooling for streaming routine load jobs.
//!
//! Inventories the routine load jobs of a MySQL-protocol analytical cluster
//! and generates two kinds of operator output:
//!
//! - `PAUSE` / `RESUME ROUTINE LOAD` statements for every job loading into a
//!   table ([`statements::generate_pause_resume`]).
//! - Re-creation scripts that replay each job from one past its committed
//!   Kafka offsets under a fresh consumer group
//!   ([`statements::generate_recreate_scripts`]).
//!
//! # Layers
//!
//! - [`catalog`]: introspection queries, one connection per call.
//! - [`aggregate`]: job names grouped by `schema.table`.
//! - [`rewrite`]: text rewrites of `CREATE ROUTINE LOAD` definitions.
//! - [`statements`]: statement generation and report rendering.
//! - [`frontend`]: the interactive prompt state machine.
//!
//! Execution is sequential. Database failures are reported through a
//! [`monitor::Reporter`] and shrink the output instead of aborting the run.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod frontend;
pub mod monitor;
pub mod progress;
pub mod rewrite;
pub mod statements;

pub use catalog::{Catalog, Filters, Inventory, JobRecord, MySqlCatalog};
pub use error::RoutineLoadError;
pub use monitor::{LogReporter, RecordingReporter, Reporter, Stage};
