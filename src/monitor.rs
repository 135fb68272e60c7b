//! Failure reporting for the catalog and rewrite layers.
//!
//! Every database-facing failure is caught where it happens and handed to a
//! [`Reporter`] together with the [`Stage`] that failed and a context string
//! (endpoint, schema, or `schema.job`). The run then continues with fewer
//! results. The binary wires in [`LogReporter`]; tests use
//! [`RecordingReporter`] to assert on what was reported.

use std::sync::Mutex;

use crate::error::RoutineLoadError;

/// The unit of work a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Listing the cluster's user schemas.
    ListSchemas,
    /// `SHOW ROUTINE LOAD` inside one schema.
    ListJobs,
    /// `SHOW CREATE ROUTINE LOAD` for one job.
    FetchDefinition,
    /// Injecting advanced offsets from a job's progress descriptor.
    AdvanceOffsets,
    /// Releasing a per-call connection.
    CloseConnection,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ListSchemas => "list_schemas",
            Stage::ListJobs => "list_jobs",
            Stage::FetchDefinition => "fetch_definition",
            Stage::AdvanceOffsets => "advance_offsets",
            Stage::CloseConnection => "close_connection",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Receives non-fatal failures.
pub trait Reporter: Send + Sync {
    fn report(&self, stage: Stage, context: &str, error: &RoutineLoadError);
}

/// Forwards failures to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, stage: Stage, context: &str, error: &RoutineLoadError) {
        tracing::warn!(
            stage = stage.as_str(),
            context,
            kind = %error.kind(),
            "{}",
            error
        );
    }
}

/// A failure captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    pub stage: Stage,
    pub context: String,
    pub message: String,
}

/// Keeps every reported failure in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    incidents: Mutex<Vec<Incident>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the failures reported so far, in order.
    pub fn incidents(&self) -> Vec<Incident> {
        match self.incidents.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of failures reported for `stage`.
    pub fn count(&self, stage: Stage) -> usize {
        self.incidents()
            .iter()
            .filter(|incident| incident.stage == stage)
            .count()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, stage: Stage, context: &str, error: &RoutineLoadError) {
        let incident = Incident {
            stage,
            context: context.to_string(),
            message: error.to_string(),
        };
        match self.incidents.lock() {
            Ok(mut guard) => guard.push(incident),
            Err(poisoned) => poisoned.into_inner().push(incident),
        }
    }
}
