//! Connection parameters and command-line configuration.
//!
//! Every answer the interactive frontend asks for can be pre-supplied by a
//! flag or an environment variable. Anything left unset is prompted for.

use clap::Parser;
use sqlx::mysql::MySqlConnectOptions;

use crate::error::RoutineLoadError;

/// Default MySQL-protocol port of the cluster frontend.
pub const DEFAULT_PORT: u16 = 3306;

/// Character set negotiated on every connection.
pub const CHARSET: &str = "utf8mb4";

/// Built-in schemas that never hold routine load jobs.
pub const SYSTEM_SCHEMAS: [&str; 3] = ["mysql", "information_schema", "__internal_schema"];

/// Legacy cluster prefix some backends prepend to `DbName`.
pub const LEGACY_SCHEMA_PREFIX: &str = "default_cluster:";

/// Command-line flags. All of them are optional.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "routine-load-admin",
    version,
    about = "Generate PAUSE/RESUME statements and re-creation scripts for routine load jobs"
)]
pub struct Cli {
    /// Cluster frontend host.
    #[arg(long, env = "ROUTINE_LOAD_HOST")]
    pub host: Option<String>,

    /// Login user.
    #[arg(long, short = 'u', env = "ROUTINE_LOAD_USER")]
    pub user: Option<String>,

    /// Login password.
    #[arg(long, env = "ROUTINE_LOAD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Query port (default 3306).
    #[arg(long, short = 'P', env = "ROUTINE_LOAD_PORT")]
    pub port: Option<String>,

    /// Operating mode: 1 = pause/resume statements, 2 = re-creation scripts.
    #[arg(long, short = 'm', env = "ROUTINE_LOAD_MODE")]
    pub mode: Option<String>,

    /// Only consider this schema (empty means all).
    #[arg(long, env = "ROUTINE_LOAD_DB")]
    pub db: Option<String>,

    /// Only consider this table (empty means all).
    #[arg(long, env = "ROUTINE_LOAD_TABLE")]
    pub table: Option<String>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    pub log_json: bool,
}

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

impl ConnectionParams {
    /// Connect options for a session, optionally scoped to one schema.
    ///
    /// The session-setup statements sqlx issues by default (`sql_mode`
    /// tweaks, `time_zone`) are switched off; the analytical frontends this
    /// talks to do not accept all of them.
    pub fn connect_options(&self, schema: Option<&str>) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .charset(CHARSET)
            .pipes_as_concat(false)
            .no_engine_substitution(false)
            .timezone(None::<String>)
            .statement_cache_capacity(0);

        match schema {
            Some(schema) => options.database(schema),
            None => options,
        }
    }

    /// `host:port`, used as log context.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Coerce the operator's port answer. Empty input means [`DEFAULT_PORT`].
pub fn parse_port(input: &str) -> Result<u16, RoutineLoadError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_PORT);
    }
    trimmed
        .parse::<u16>()
        .map_err(|e| RoutineLoadError::InvalidArgument(format!("port {:?}: {}", trimmed, e)))
}

/// Normalize an optional filter answer: blank means "no filter".
pub fn parse_filter(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
