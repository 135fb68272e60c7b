//! Statement generation and report rendering.
//!
//! Mode 1 turns the table -> job-names grouping into PAUSE/RESUME
//! statements. Mode 2 fetches each job's definition and rewrites it into a
//! re-creation script (see [`crate::rewrite`]).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{TableJobs, TableKey};
use crate::catalog::{Catalog, Filters, Inventory, clean_schema_name};
use crate::error::RoutineLoadError;
use crate::monitor::{Reporter, Stage};
use crate::rewrite::{SCRIPT_SEPARATOR, recreate_definition};

/// PAUSE/RESUME statements for every job loading into one table.
///
/// `pause[i]` and `resume[i]` both refer to `names[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PauseResumePlan {
    pub table: TableKey,
    pub names: Vec<String>,
    pub pause: Vec<String>,
    pub resume: Vec<String>,
}

/// Schema -> job name -> patched definition.
pub type RecreateScripts = BTreeMap<String, BTreeMap<String, String>>;

pub fn pause_statement(schema: &str, name: &str) -> String {
    format!("PAUSE ROUTINE LOAD FOR {}.{};", schema, name)
}

pub fn resume_statement(schema: &str, name: &str) -> String {
    format!("RESUME ROUTINE LOAD FOR {}.{};", schema, name)
}

/// Build PAUSE/RESUME statements for every table passing `filters`.
///
/// Job names are sorted so the output is reproducible.
pub fn generate_pause_resume(tables: &TableJobs, filters: &Filters) -> Vec<PauseResumePlan> {
    tables
        .iter()
        .filter(|(key, _)| filters.matches_schema(&key.schema))
        .filter(|(key, _)| filters.matches_table(Some(key.table.as_str())))
        .map(|(key, names)| {
            // BTreeSet iterates in lexicographic order.
            let names: Vec<String> = names.iter().cloned().collect();
            PauseResumePlan {
                table: key.clone(),
                pause: names
                    .iter()
                    .map(|name| pause_statement(&key.schema, name))
                    .collect(),
                resume: names
                    .iter()
                    .map(|name| resume_statement(&key.schema, name))
                    .collect(),
                names,
            }
        })
        .collect()
}

/// Build a re-creation script for every job with a name, schema and
/// progress descriptor.
///
/// Jobs whose definition cannot be fetched are skipped; schemas left without
/// any script are omitted.
pub async fn generate_recreate_scripts(
    catalog: &dyn Catalog,
    inventory: &Inventory,
    reporter: &dyn Reporter,
) -> RecreateScripts {
    let mut scripts = RecreateScripts::new();

    for (listed_schema, jobs) in inventory {
        let mut by_name = BTreeMap::new();

        for job in jobs {
            let (Some(name), Some(schema), Some(progress)) = (
                job.name.as_deref(),
                job.schema.as_deref(),
                job.progress.as_deref(),
            ) else {
                continue;
            };
            let schema = clean_schema_name(schema);
            if name.is_empty() || schema.is_empty() || progress.is_empty() {
                continue;
            }

            let definition = catalog.fetch_definition(schema, name).await;
            if definition.is_empty() {
                reporter.report(
                    Stage::FetchDefinition,
                    &format!("{}.{}", schema, name),
                    &RoutineLoadError::DefinitionNotFound("job skipped".into()),
                );
                continue;
            }

            tracing::info!(schema, job = name, "re-creating routine load definition");
            let patched = recreate_definition(&definition, schema, name, progress, reporter);
            by_name.insert(name.to_string(), patched);
        }

        if !by_name.is_empty() {
            scripts.insert(listed_schema.clone(), by_name);
        }
    }

    scripts
}

/// Mode 1 report: `schema.table: a, b`, the PAUSE statements, the RESUME
/// statements, then a blank line, for each table.
pub fn render_pause_resume(plans: &[PauseResumePlan]) -> String {
    let mut out = String::new();
    for plan in plans {
        out.push_str(&format!("{}: {}\n", plan.table, plan.names.join(", ")));
        for sql in plan.pause.iter().chain(plan.resume.iter()) {
            out.push_str(sql);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Mode 2 report: trimmed scripts joined by the separator line.
pub fn render_recreate_scripts(scripts: &RecreateScripts) -> String {
    scripts
        .values()
        .flat_map(|by_name| by_name.values())
        .map(|sql| sql.trim())
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", SCRIPT_SEPARATOR))
}
