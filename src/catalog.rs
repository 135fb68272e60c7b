//! Catalog layer: introspection of routine load jobs.
//!
//! All cluster access goes through the [`Catalog`] trait. [`MySqlCatalog`]
//! implements it over the MySQL wire protocol: every call opens its own
//! connection (scoped to a schema where needed), runs one introspection
//! command, maps rows eagerly to typed values and closes the connection
//! again on every path. Failures are reported and turned into empty results.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Executor, Row};

use crate::config::{ConnectionParams, LEGACY_SCHEMA_PREFIX, SYSTEM_SCHEMAS};
use crate::error::RoutineLoadError;
use crate::monitor::{Reporter, Stage};

/// One row of `SHOW ROUTINE LOAD`, reduced to the columns we use.
///
/// Any field may be NULL in the result set. `schema` is stored with the
/// legacy cluster prefix already stripped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobRecord {
    pub name: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub progress: Option<String>,
}

impl JobRecord {
    pub fn new(
        name: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        progress: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            schema: Some(clean_schema_name(&schema.into()).to_string()),
            table: Some(table.into()),
            progress: Some(progress.into()),
        }
    }
}

/// Schema -> jobs found in it. Schemas without jobs are absent.
pub type Inventory = BTreeMap<String, Vec<JobRecord>>;

/// Optional schema/table restriction applied while fetching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub schema: Option<String>,
    pub table: Option<String>,
}

impl Filters {
    pub fn matches_schema(&self, schema: &str) -> bool {
        self.schema.as_deref().is_none_or(|wanted| wanted == schema)
    }

    pub fn matches_table(&self, table: Option<&str>) -> bool {
        match self.table.as_deref() {
            None => true,
            Some(wanted) => table == Some(wanted),
        }
    }
}

/// Strip the legacy `default_cluster:` prefix from a schema name.
pub fn clean_schema_name(schema: &str) -> &str {
    schema
        .strip_prefix(LEGACY_SCHEMA_PREFIX)
        .unwrap_or(schema)
}

/// Index of the definition column in a `SHOW CREATE ROUTINE LOAD` row
/// with `width` columns.
///
/// Current backends return `Id, Name, CreateStmt`; older ones return two
/// columns with the statement last.
pub fn definition_column(width: usize) -> usize {
    match width {
        0 | 1 => 0,
        2 => 1,
        _ => 2,
    }
}

/// Pick the definition text out of a `SHOW CREATE ROUTINE LOAD` row.
///
/// The column is chosen by row width alone. A NULL or empty definition
/// yields `None`; no other column is consulted.
pub fn pick_definition(columns: &[Option<String>]) -> Option<String> {
    columns
        .get(definition_column(columns.len()))
        .cloned()
        .flatten()
        .filter(|text| !text.is_empty())
}

/// Read access to the cluster's routine load metadata.
///
/// Implementations never fail: errors are reported and yield empty values.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// User schema names, system schemas excluded.
    async fn list_schemas(&self) -> Vec<String>;

    /// Routine load jobs visible from `schema`.
    async fn list_jobs(&self, schema: &str) -> Vec<JobRecord>;

    /// Creation statement of `schema.name`, or an empty string.
    async fn fetch_definition(&self, schema: &str, name: &str) -> String;
}

/// Fetch jobs for every schema passing `filters`.
///
/// The schema filter is compared against the listed schema name and the
/// table filter against each job's target table.
pub async fn collect_inventory(catalog: &dyn Catalog, filters: &Filters) -> Inventory {
    let mut inventory = Inventory::new();

    for schema in catalog.list_schemas().await {
        if !filters.matches_schema(&schema) {
            continue;
        }

        let jobs: Vec<JobRecord> = catalog
            .list_jobs(&schema)
            .await
            .into_iter()
            .filter(|job| filters.matches_table(job.table.as_deref()))
            .collect();

        tracing::debug!(schema = %schema, jobs = jobs.len(), "listed routine loads");

        if !jobs.is_empty() {
            inventory.insert(schema, jobs);
        }
    }

    inventory
}

// ── MySQL implementation ──────────────────────────────────────────────────

const LIST_SCHEMAS_SQL: &str = "SELECT table_schema \
     FROM information_schema.tables \
     WHERE table_schema NOT IN ('mysql', 'information_schema', '__internal_schema') \
     GROUP BY table_schema";

const LIST_JOBS_SQL: &str = "SHOW ROUTINE LOAD";

/// [`Catalog`] over a MySQL-protocol cluster frontend.
pub struct MySqlCatalog {
    params: ConnectionParams,
    reporter: Arc<dyn Reporter>,
}

impl MySqlCatalog {
    pub fn new(params: ConnectionParams, reporter: Arc<dyn Reporter>) -> Self {
        Self { params, reporter }
    }

    async fn connect(&self, schema: Option<&str>) -> Result<MySqlConnection, RoutineLoadError> {
        MySqlConnection::connect_with(&self.params.connect_options(schema))
            .await
            .map_err(|e| {
                RoutineLoadError::ConnectionError(format!("{}: {}", self.params.endpoint(), e))
            })
    }

    async fn release(&self, conn: MySqlConnection, context: &str) {
        if let Err(e) = conn.close().await {
            self.reporter.report(
                Stage::CloseConnection,
                context,
                &RoutineLoadError::ConnectionError(e.to_string()),
            );
        }
    }

    pub async fn try_list_schemas(&self) -> Result<Vec<String>, RoutineLoadError> {
        let mut conn = self.connect(None).await?;
        let result = query_schemas(&mut conn).await;
        self.release(conn, &self.params.endpoint()).await;
        result
    }

    pub async fn try_list_jobs(&self, schema: &str) -> Result<Vec<JobRecord>, RoutineLoadError> {
        let mut conn = self.connect(Some(schema)).await?;
        let result = query_jobs(&mut conn).await;
        self.release(conn, schema).await;
        result
    }

    pub async fn try_fetch_definition(
        &self,
        schema: &str,
        name: &str,
    ) -> Result<String, RoutineLoadError> {
        let schema = clean_schema_name(schema);
        let qualified = format!("{}.{}", schema, name);
        let mut conn = self.connect(Some(schema)).await?;
        let result = query_definition(&mut conn, &qualified).await;
        self.release(conn, &qualified).await;
        result
    }
}

#[async_trait]
impl Catalog for MySqlCatalog {
    async fn list_schemas(&self) -> Vec<String> {
        match self.try_list_schemas().await {
            Ok(schemas) => schemas,
            Err(e) => {
                self.reporter
                    .report(Stage::ListSchemas, &self.params.endpoint(), &e);
                Vec::new()
            }
        }
    }

    async fn list_jobs(&self, schema: &str) -> Vec<JobRecord> {
        match self.try_list_jobs(schema).await {
            Ok(jobs) => jobs,
            Err(e) => {
                self.reporter.report(Stage::ListJobs, schema, &e);
                Vec::new()
            }
        }
    }

    async fn fetch_definition(&self, schema: &str, name: &str) -> String {
        match self.try_fetch_definition(schema, name).await {
            Ok(text) => text,
            Err(e) => {
                let context = format!("{}.{}", clean_schema_name(schema), name);
                self.reporter.report(Stage::FetchDefinition, &context, &e);
                String::new()
            }
        }
    }
}

async fn query_schemas(conn: &mut MySqlConnection) -> Result<Vec<String>, RoutineLoadError> {
    let rows = conn
        .fetch_all(sqlx::raw_sql(LIST_SCHEMAS_SQL))
        .await
        .map_err(|e| RoutineLoadError::QueryError(format!("schema listing: {}", e)))?;

    let mut schemas = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(schema) = column_text(row, 0)? {
            // The query already excludes them; guard against backends that
            // report system schemas with different casing.
            if !SYSTEM_SCHEMAS
                .iter()
                .any(|system| system.eq_ignore_ascii_case(&schema))
            {
                schemas.push(schema);
            }
        }
    }
    Ok(schemas)
}

async fn query_jobs(conn: &mut MySqlConnection) -> Result<Vec<JobRecord>, RoutineLoadError> {
    let rows = conn
        .fetch_all(sqlx::raw_sql(LIST_JOBS_SQL))
        .await
        .map_err(|e| RoutineLoadError::QueryError(format!("{}: {}", LIST_JOBS_SQL, e)))?;

    rows.iter().map(job_from_row).collect()
}

async fn query_definition(
    conn: &mut MySqlConnection,
    qualified: &str,
) -> Result<String, RoutineLoadError> {
    let sql = format!("SHOW CREATE ROUTINE LOAD FOR {}", qualified);
    let row = conn
        .fetch_optional(sqlx::raw_sql(&sql))
        .await
        .map_err(|e| RoutineLoadError::QueryError(format!("{}: {}", sql, e)))?
        .ok_or_else(|| RoutineLoadError::DefinitionNotFound(qualified.to_string()))?;

    definition_from_row(&row)?
        .ok_or_else(|| RoutineLoadError::DefinitionNotFound(qualified.to_string()))
}

/// Map a `SHOW ROUTINE LOAD` row. Columns other than `Name`, `DbName`,
/// `TableName` and `Progress` are ignored.
#[doc(hidden)]
pub fn job_from_row(row: &MySqlRow) -> Result<JobRecord, RoutineLoadError> {
    Ok(JobRecord {
        name: named_text(row, "Name")?,
        schema: named_text(row, "DbName")?.map(|s| clean_schema_name(&s).to_string()),
        table: named_text(row, "TableName")?,
        progress: named_text(row, "Progress")?,
    })
}

/// Definition text of a `SHOW CREATE ROUTINE LOAD` row.
///
/// Only the column chosen by [`definition_column`] is decoded; the others
/// (job id, name) may have any type.
#[doc(hidden)]
pub fn definition_from_row(row: &MySqlRow) -> Result<Option<String>, RoutineLoadError> {
    let width = row.columns().len();
    if width == 0 {
        return Ok(None);
    }
    let idx = definition_column(width);
    let mut columns = vec![None; width];
    columns[idx] = column_text(row, idx)?;
    Ok(pick_definition(&columns))
}

/// Text of the column called `name`, or `None` if the row has no such column.
fn named_text(row: &MySqlRow, name: &str) -> Result<Option<String>, RoutineLoadError> {
    match row.columns().iter().position(|col| col.name() == name) {
        Some(idx) => column_text(row, idx),
        None => Ok(None),
    }
}

/// Decode a column as text, whether the backend typed it as a character
/// or a binary string.
fn column_text(row: &MySqlRow, idx: usize) -> Result<Option<String>, RoutineLoadError> {
    if let Ok(text) = row.try_get::<Option<String>, _>(idx) {
        return Ok(text);
    }
    row.try_get::<Option<Vec<u8>>, _>(idx)
        .map(|bytes| bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
        .map_err(|e| RoutineLoadError::QueryError(format!("column {}: {}", idx, e)))
}
