//! Text rewrites applied to a routine load definition before it is replayed.
//!
//! A re-creation script is the job's `SHOW CREATE ROUTINE LOAD` text with
//! three independent rewrites applied in order:
//!
//! 1. [`replace_kafka_offsets`]: start one past the last committed offset
//!    of every partition, so the last durably processed record is not
//!    consumed twice.
//! 2. [`patch_create_sql_dbname`]: qualify the job name with its schema.
//! 3. [`patch_group_id`]: suffix the consumer group with `_new` so the new
//!    job does not share committed offsets with the old one.
//!
//! The patterns assume the backend's own quoting and spacing
//! (`"key" = "value"`). Whitespace around `=` is tolerated; anything else
//! is left untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::RoutineLoadError;
use crate::monitor::{Reporter, Stage};
use crate::progress::PartitionOffsets;

/// Suffix appended to the consumer-group id of a re-created job.
pub const GROUP_ID_SUFFIX: &str = "_new";

/// Line placed between scripts in the Mode 2 report.
pub const SCRIPT_SEPARATOR: &str = "----------------------------------";

static KAFKA_OFFSETS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"kafka_offsets"\s*=\s*"[0-9,\s]*""#).expect("static regex is valid")
});

static CREATE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(CREATE\s+ROUTINE\s+LOAD\s+)(\w+)(\s+ON\s+)").expect("static regex is valid")
});

// The second dot is unescaped in the pattern the backend tooling has always
// used; keep it so the same definitions match.
static GROUP_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""property\.group.id"\s*=\s*"([^"]+)""#).expect("static regex is valid")
});

/// Replace the first `kafka_offsets` property with `offsets`, each advanced
/// by one. Text without the property is returned unchanged.
pub fn inject_offsets(create_sql: &str, offsets: &PartitionOffsets) -> String {
    let rendered = format!(r#"kafka_offsets" = "{}""#, offsets.render_advanced());
    KAFKA_OFFSETS_RE
        .replacen(create_sql, 1, |_: &Captures| rendered.as_str())
        .into_owned()
}

/// Advance the `kafka_offsets` property using the job's progress descriptor.
///
/// If `progress` is not a JSON object of integer offsets the failure is
/// reported and `create_sql` is returned unchanged.
pub fn replace_kafka_offsets(
    create_sql: &str,
    progress: &str,
    context: &str,
    reporter: &dyn Reporter,
) -> String {
    match try_replace_kafka_offsets(create_sql, progress) {
        Ok(patched) => patched,
        Err(e) => {
            reporter.report(Stage::AdvanceOffsets, context, &e);
            create_sql.to_string()
        }
    }
}

pub fn try_replace_kafka_offsets(
    create_sql: &str,
    progress: &str,
) -> Result<String, RoutineLoadError> {
    let offsets = PartitionOffsets::parse(progress)?;
    Ok(inject_offsets(create_sql, &offsets))
}

/// Rewrite the first `CREATE ROUTINE LOAD <name> ON` header to
/// `CREATE ROUTINE LOAD <schema>.<name> ON`.
///
/// An already-qualified header does not match and is left as is.
pub fn patch_create_sql_dbname(create_sql: &str, schema: &str, name: &str) -> String {
    CREATE_HEADER_RE
        .replacen(create_sql, 1, |caps: &Captures| {
            format!("{}{}.{}{}", &caps[1], schema, name, &caps[3])
        })
        .into_owned()
}

/// Suffix every `"property.group.id"` value with `_new`, unless it already
/// ends with it.
pub fn patch_group_id(create_sql: &str) -> String {
    GROUP_ID_RE
        .replace_all(create_sql, |caps: &Captures| {
            let value = &caps[1];
            if value.ends_with(GROUP_ID_SUFFIX) {
                caps[0].to_string()
            } else {
                format!(r#""property.group.id" = "{}{}""#, value, GROUP_ID_SUFFIX)
            }
        })
        .into_owned()
}

/// Apply all three rewrites in order.
pub fn recreate_definition(
    create_sql: &str,
    schema: &str,
    name: &str,
    progress: &str,
    reporter: &dyn Reporter,
) -> String {
    let context = format!("{}.{}", schema, name);
    let patched = replace_kafka_offsets(create_sql, progress, &context, reporter);
    let patched = patch_create_sql_dbname(&patched, schema, name);
    patch_group_id(&patched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::RecordingReporter;

    const DEFINITION: &str = r#"CREATE ROUTINE LOAD job1 ON t1
COLUMNS TERMINATED BY ",",
COLUMNS(k1, k2, v1)
PROPERTIES
(
"desired_concurrent_number" = "3",
"max_error_number" = "0"
)
FROM KAFKA
(
"kafka_broker_list" = "broker1:9092,broker2:9092",
"kafka_topic" = "orders",
"kafka_partitions" = "0,1",
"kafka_offsets" = "10,20",
"property.group.id" = "orders_consumer"
);"#;

    const EXPECTED: &str = r#"CREATE ROUTINE LOAD db1.job1 ON t1
COLUMNS TERMINATED BY ",",
COLUMNS(k1, k2, v1)
PROPERTIES
(
"desired_concurrent_number" = "3",
"max_error_number" = "0"
)
FROM KAFKA
(
"kafka_broker_list" = "broker1:9092,broker2:9092",
"kafka_topic" = "orders",
"kafka_partitions" = "0,1",
"kafka_offsets" = "11, 21",
"property.group.id" = "orders_consumer_new"
);"#;

    // ── kafka_offsets ──────────────────────────────────────────────

    #[test]
    fn test_replace_kafka_offsets_basic() {
        let out = try_replace_kafka_offsets(
            r#""kafka_offsets" = "10,20","#,
            r#"{"0":"10","1":"20"}"#,
        )
        .unwrap();
        assert_eq!(out, r#""kafka_offsets" = "11, 21","#);
    }

    #[test]
    fn test_replace_kafka_offsets_tolerates_spacing() {
        let out =
            try_replace_kafka_offsets(r#""kafka_offsets"="1, 2""#, r#"{"1":"7","0":"3"}"#).unwrap();
        assert_eq!(out, r#""kafka_offsets" = "4, 8""#);
    }

    #[test]
    fn test_replace_kafka_offsets_first_occurrence_only() {
        let sql = r#""kafka_offsets" = "1" "kafka_offsets" = "2""#;
        let out = try_replace_kafka_offsets(sql, r#"{"0":"5"}"#).unwrap();
        assert_eq!(out, r#""kafka_offsets" = "6" "kafka_offsets" = "2""#);
    }

    #[test]
    fn test_replace_kafka_offsets_symbolic_offsets_untouched() {
        // OFFSET_BEGINNING is not digits/commas, so the pattern never matches.
        let sql = r#""kafka_offsets" = "OFFSET_BEGINNING""#;
        let out = try_replace_kafka_offsets(sql, r#"{"0":"5"}"#).unwrap();
        assert_eq!(out, sql);
    }

    #[test]
    fn test_replace_kafka_offsets_non_json_progress_unchanged() {
        let reporter = RecordingReporter::new();
        let out = replace_kafka_offsets(DEFINITION, "OK", "db1.job1", &reporter);
        assert_eq!(out, DEFINITION);
        assert_eq!(reporter.count(Stage::AdvanceOffsets), 1);
        assert_eq!(reporter.incidents()[0].context, "db1.job1");
    }

    #[test]
    fn test_replace_kafka_offsets_broken_json_unchanged() {
        let reporter = RecordingReporter::new();
        let out = replace_kafka_offsets(DEFINITION, r#"{"0":"#, "db1.job1", &reporter);
        assert_eq!(out, DEFINITION);
        assert_eq!(reporter.count(Stage::AdvanceOffsets), 1);
    }

    #[test]
    fn test_replace_kafka_offsets_no_property() {
        let sql = "CREATE ROUTINE LOAD j ON t FROM KAFKA ()";
        assert_eq!(try_replace_kafka_offsets(sql, r#"{"0":"1"}"#).unwrap(), sql);
    }

    // ── CREATE header ──────────────────────────────────────────────

    #[test]
    fn test_patch_create_sql_dbname() {
        assert_eq!(
            patch_create_sql_dbname("CREATE ROUTINE LOAD job1 ON t1 ...", "db1", "job1"),
            "CREATE ROUTINE LOAD db1.job1 ON t1 ..."
        );
    }

    #[test]
    fn test_patch_create_sql_dbname_preserves_whitespace() {
        assert_eq!(
            patch_create_sql_dbname("CREATE  ROUTINE\nLOAD job1\n  ON t1", "db1", "job1"),
            "CREATE  ROUTINE\nLOAD db1.job1\n  ON t1"
        );
    }

    #[test]
    fn test_patch_create_sql_dbname_first_only() {
        let sql = "CREATE ROUTINE LOAD a ON t1; CREATE ROUTINE LOAD a ON t2;";
        assert_eq!(
            patch_create_sql_dbname(sql, "db1", "a"),
            "CREATE ROUTINE LOAD db1.a ON t1; CREATE ROUTINE LOAD a ON t2;"
        );
    }

    #[test]
    fn test_patch_create_sql_dbname_no_header() {
        let sql = "ALTER ROUTINE LOAD FOR job1 PROPERTIES()";
        assert_eq!(patch_create_sql_dbname(sql, "db1", "job1"), sql);
    }

    #[test]
    fn test_patch_create_sql_dbname_already_qualified() {
        let sql = "CREATE ROUTINE LOAD db1.job1 ON t1";
        assert_eq!(patch_create_sql_dbname(sql, "db1", "job1"), sql);
    }

    #[test]
    fn test_patch_create_sql_dbname_lowercase_untouched() {
        let sql = "create routine load job1 on t1";
        assert_eq!(patch_create_sql_dbname(sql, "db1", "job1"), sql);
    }

    // ── group id ───────────────────────────────────────────────────

    #[test]
    fn test_patch_group_id() {
        assert_eq!(
            patch_group_id(r#""property.group.id" = "g1""#),
            r#""property.group.id" = "g1_new""#
        );
    }

    #[test]
    fn test_patch_group_id_normalizes_spacing() {
        assert_eq!(
            patch_group_id(r#""property.group.id"="g1""#),
            r#""property.group.id" = "g1_new""#
        );
    }

    #[test]
    fn test_patch_group_id_already_suffixed() {
        let sql = r#""property.group.id"="g1_new""#;
        assert_eq!(patch_group_id(sql), sql);
    }

    #[test]
    fn test_patch_group_id_idempotent() {
        let once = patch_group_id(DEFINITION);
        assert_eq!(patch_group_id(&once), once);
        assert!(!once.contains("_new_new"));
    }

    #[test]
    fn test_patch_group_id_every_occurrence() {
        let sql = r#""property.group.id" = "a", "property.group.id" = "b""#;
        assert_eq!(
            patch_group_id(sql),
            r#""property.group.id" = "a_new", "property.group.id" = "b_new""#
        );
    }

    #[test]
    fn test_patch_group_id_empty_value_untouched() {
        let sql = r#""property.group.id" = """#;
        assert_eq!(patch_group_id(sql), sql);
    }

    // ── full pipeline ──────────────────────────────────────────────

    #[test]
    fn test_recreate_definition_golden() {
        let reporter = RecordingReporter::new();
        let out = recreate_definition(
            DEFINITION,
            "db1",
            "job1",
            r#"{"1":"20","0":"10"}"#,
            &reporter,
        );
        assert_eq!(out, EXPECTED);
        assert!(reporter.incidents().is_empty());
    }

    #[test]
    fn test_recreate_definition_non_json_progress_still_patches_names() {
        let reporter = RecordingReporter::new();
        let out = recreate_definition(DEFINITION, "db1", "job1", "OK", &reporter);
        assert!(out.contains(r#""kafka_offsets" = "10,20""#));
        assert!(out.starts_with("CREATE ROUTINE LOAD db1.job1 ON t1"));
        assert!(out.contains(r#""property.group.id" = "orders_consumer_new""#));
        assert_eq!(reporter.count(Stage::AdvanceOffsets), 1);
    }
}
