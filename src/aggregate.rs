//! Grouping of routine load jobs by the table they load into.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::catalog::{Inventory, clean_schema_name};

/// A `(schema, table)` pair; displays as `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableKey {
    pub schema: String,
    pub table: String,
}

impl TableKey {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

impl Serialize for TableKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Table -> names of the jobs loading into it.
pub type TableJobs = BTreeMap<TableKey, BTreeSet<String>>;

/// Collect the job names bound to each table across all schemas.
///
/// Records without a name, schema or table are skipped. Names are kept as a
/// set; nothing guarantees they are unique per table.
pub fn group_jobs_by_table(inventory: &Inventory) -> TableJobs {
    let mut grouped = TableJobs::new();

    for job in inventory.values().flatten() {
        let (Some(name), Some(schema), Some(table)) = (
            job.name.as_deref(),
            job.schema.as_deref(),
            job.table.as_deref(),
        ) else {
            continue;
        };

        let schema = clean_schema_name(schema);
        if name.is_empty() || schema.is_empty() || table.is_empty() {
            continue;
        }

        grouped
            .entry(TableKey::new(schema, table))
            .or_default()
            .insert(name.to_string());
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JobRecord;

    fn job(name: &str, schema: &str, table: &str) -> JobRecord {
        JobRecord::new(name, schema, table, "{}")
    }

    #[test]
    fn test_two_jobs_one_table() {
        let mut inventory = Inventory::new();
        inventory.insert(
            "db1".into(),
            vec![job("j1", "db1", "t1"), job("j2", "db1", "t1")],
        );

        let grouped = group_jobs_by_table(&inventory);
        assert_eq!(grouped.len(), 1);

        let (key, names) = grouped.iter().next().unwrap();
        assert_eq!(key.to_string(), "db1.t1");
        assert_eq!(
            names.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["j1", "j2"]
        );
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let mut inventory = Inventory::new();
        inventory.insert(
            "db1".into(),
            vec![job("j1", "db1", "t1"), job("j1", "db1", "t1")],
        );

        let grouped = group_jobs_by_table(&inventory);
        assert_eq!(grouped[&TableKey::new("db1", "t1")].len(), 1);
    }

    #[test]
    fn test_prefixed_schema_is_cleaned() {
        let mut inventory = Inventory::new();
        inventory.insert(
            "db1".into(),
            vec![JobRecord {
                name: Some("j1".into()),
                schema: Some("default_cluster:db1".into()),
                table: Some("t1".into()),
                progress: None,
            }],
        );

        let grouped = group_jobs_by_table(&inventory);
        assert!(grouped.contains_key(&TableKey::new("db1", "t1")));
    }

    #[test]
    fn test_incomplete_records_skipped() {
        let mut inventory = Inventory::new();
        inventory.insert(
            "db1".into(),
            vec![
                JobRecord {
                    name: None,
                    schema: Some("db1".into()),
                    table: Some("t1".into()),
                    progress: None,
                },
                JobRecord {
                    name: Some("j2".into()),
                    schema: None,
                    table: Some("t1".into()),
                    progress: None,
                },
                JobRecord {
                    name: Some("j3".into()),
                    schema: Some("db1".into()),
                    table: None,
                    progress: None,
                },
                JobRecord {
                    name: Some(String::new()),
                    schema: Some("db1".into()),
                    table: Some("t1".into()),
                    progress: None,
                },
            ],
        );

        assert!(group_jobs_by_table(&inventory).is_empty());
    }

    #[test]
    fn test_tables_across_schemas() {
        let mut inventory = Inventory::new();
        inventory.insert("db1".into(), vec![job("a", "db1", "t1")]);
        inventory.insert(
            "db2".into(),
            vec![job("b", "db2", "t1"), job("c", "db2", "t2")],
        );

        let keys: Vec<String> = group_jobs_by_table(&inventory)
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["db1.t1", "db2.t1", "db2.t2"]);
    }

    #[test]
    fn test_table_key_serializes_as_string() {
        let json = serde_json::to_string(&TableKey::new("db1", "t1")).unwrap();
        assert_eq!(json, "\"db1.t1\"");
    }
}
