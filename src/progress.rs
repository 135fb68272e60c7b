//! Committed consumer offsets of a routine load job.
//!
//! `SHOW ROUTINE LOAD` reports a job's progress as an opaque string. For a
//! healthy Kafka job it is a JSON object mapping partition number to the
//! last committed offset, e.g. `{"0":"10","1":"20"}`. It may instead be a
//! plain diagnostic string such as `OK` or an error description, which
//! [`PartitionOffsets::parse`] rejects.
//!
//! Offsets are positional in `kafka_offsets`, so entries are always ordered
//! by the numeric value of the partition key, never by its text or by the
//! order the backend serialised it in.

use serde_json::Value;

use crate::error::RoutineLoadError;

/// Per-partition committed offsets, ordered by partition number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionOffsets {
    entries: Vec<(i64, i64)>,
}

impl PartitionOffsets {
    /// Parse a progress descriptor.
    ///
    /// The text must start with `{` and be a JSON object whose keys are
    /// integers and whose values are integers or strings holding integers.
    pub fn parse(progress: &str) -> Result<Self, RoutineLoadError> {
        if !progress.starts_with('{') {
            return Err(RoutineLoadError::ProgressParseError(format!(
                "progress is not a JSON object: {}",
                progress
            )));
        }

        let value: Value = serde_json::from_str(progress)
            .map_err(|e| RoutineLoadError::ProgressParseError(format!("{}: {}", e, progress)))?;

        let object = value.as_object().ok_or_else(|| {
            RoutineLoadError::ProgressParseError(format!(
                "progress is not a JSON object: {}",
                progress
            ))
        })?;

        let mut entries = Vec::with_capacity(object.len());
        for (key, offset) in object {
            let partition = key.trim().parse::<i64>().map_err(|_| {
                RoutineLoadError::ProgressParseError(format!("non-integer partition key {:?}", key))
            })?;
            let offset = offset_value(offset).ok_or_else(|| {
                RoutineLoadError::ProgressParseError(format!(
                    "non-integer offset {} for partition {}",
                    offset, key
                ))
            })?;
            if offset == i64::MAX {
                return Err(RoutineLoadError::ProgressParseError(format!(
                    "offset for partition {} cannot be advanced",
                    key
                )));
            }
            entries.push((partition, offset));
        }

        // Stable: keys that collide numerically ("1" vs "01") keep their
        // relative order.
        entries.sort_by_key(|(partition, _)| *partition);

        Ok(Self { entries })
    }

    /// Committed offsets in partition order.
    pub fn committed(&self) -> Vec<i64> {
        self.entries.iter().map(|(_, offset)| *offset).collect()
    }

    /// Offsets one past the last committed record, in partition order.
    pub fn advanced(&self) -> Vec<i64> {
        self.entries.iter().map(|(_, offset)| offset + 1).collect()
    }

    /// The advanced offsets as the `kafka_offsets` property expects them.
    pub fn render_advanced(&self) -> String {
        self.advanced()
            .iter()
            .map(|offset| offset.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn offset_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
