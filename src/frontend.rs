//! Interactive frontend.
//!
//! A small state machine drives one run:
//!
//! ```text
//! CollectConnectionParams -> CollectMode -> CollectFilters -> Execute -> Report
//! ```
//!
//! Answers pre-supplied on the command line are used as-is and not
//! prompted for. An unrecognised mode or an unparseable port prints a
//! message and ends the run before any database access.

use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::aggregate::group_jobs_by_table;
use crate::catalog::{Catalog, Filters, collect_inventory};
use crate::config::{Cli, ConnectionParams, parse_filter, parse_port};
use crate::error::RoutineLoadError;
use crate::monitor::Reporter;
use crate::statements::{
    PauseResumePlan, RecreateScripts, generate_pause_resume, generate_recreate_scripts,
    render_pause_resume, render_recreate_scripts,
};

/// What the operator wants generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `1`: PAUSE/RESUME statements per table.
    PauseResume,
    /// `2`: re-creation scripts with advanced offsets.
    Recreate,
}

impl Mode {
    pub fn parse(input: &str) -> Result<Self, RoutineLoadError> {
        match input.trim() {
            "1" => Ok(Mode::PauseResume),
            "2" => Ok(Mode::Recreate),
            other => Err(RoutineLoadError::InvalidMode(other.to_string())),
        }
    }
}

/// Answers known before prompting, e.g. from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct Answers {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<String>,
    pub mode: Option<String>,
    pub db: Option<String>,
    pub table: Option<String>,
    pub json: bool,
}

impl From<&Cli> for Answers {
    fn from(cli: &Cli) -> Self {
        Self {
            host: cli.host.clone(),
            user: cli.user.clone(),
            password: cli.password.clone(),
            port: cli.port.clone(),
            mode: cli.mode.clone(),
            db: cli.db.clone(),
            table: cli.table.clone(),
            json: cli.json,
        }
    }
}

/// Output of the Execute state.
#[derive(Debug)]
pub enum Report {
    PauseResume(Vec<PauseResumePlan>),
    Recreate(RecreateScripts),
}

enum State {
    CollectConnectionParams,
    CollectMode(ConnectionParams),
    CollectFilters(ConnectionParams, Mode),
    Execute(ConnectionParams, Mode, Filters),
    Report(Report),
}

pub struct Frontend<R, W> {
    input: R,
    output: W,
    answers: Answers,
    reporter: Arc<dyn Reporter>,
}

impl<R: BufRead, W: Write> Frontend<R, W> {
    pub fn new(input: R, output: W, answers: Answers, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            input,
            output,
            answers,
            reporter,
        }
    }

    /// Run the state machine to completion.
    ///
    /// `connect` builds the catalog once connection parameters are known.
    /// Returns an error only for terminal failures (bad mode, bad port,
    /// terminal I/O); database failures are reported and shrink the report.
    pub async fn run<C, F>(mut self, connect: F) -> Result<(), RoutineLoadError>
    where
        C: Catalog,
        F: Fn(ConnectionParams) -> C,
    {
        let mut state = State::CollectConnectionParams;

        loop {
            state = match state {
                State::CollectConnectionParams => match self.collect_connection_params() {
                    Ok(params) => State::CollectMode(params),
                    Err(e) => return self.fail(e),
                },

                State::CollectMode(params) => match self.collect_mode() {
                    Ok(mode) => State::CollectFilters(params, mode),
                    Err(e) => return self.fail(e),
                },

                State::CollectFilters(params, mode) => {
                    let filters = self.collect_filters()?;
                    State::Execute(params, mode, filters)
                }

                State::Execute(params, mode, filters) => {
                    tracing::info!(
                        endpoint = %params.endpoint(),
                        ?mode,
                        schema = filters.schema.as_deref().unwrap_or("*"),
                        table = filters.table.as_deref().unwrap_or("*"),
                        "collecting routine loads"
                    );
                    let catalog = connect(params);
                    State::Report(self.execute(&catalog, mode, &filters).await?)
                }

                State::Report(report) => {
                    self.report(&report)?;
                    return Ok(());
                }
            };
        }
    }

    fn collect_connection_params(&mut self) -> Result<ConnectionParams, RoutineLoadError> {
        let answers = &self.answers;
        if answers.host.is_none()
            || answers.user.is_none()
            || answers.password.is_none()
            || answers.port.is_none()
        {
            writeln!(self.output, "Please input MySQL connection info:")?;
        }

        let host = self.ask("host: ", self.answers.host.clone())?;
        let user = self.ask("user: ", self.answers.user.clone())?;
        let password = self.ask("password: ", self.answers.password.clone())?;
        let port = self.ask("port(default 3306): ", self.answers.port.clone())?;

        Ok(ConnectionParams {
            host: host.trim().to_string(),
            user: user.trim().to_string(),
            password,
            port: parse_port(&port)?,
        })
    }

    fn collect_mode(&mut self) -> Result<Mode, RoutineLoadError> {
        if self.answers.mode.is_none() {
            writeln!(self.output, "Please select mode:")?;
            writeln!(
                self.output,
                "1. Show routine load names for each table and their PAUSE/RESUME statements"
            )?;
            writeln!(self.output, "2. Show modified routine load create statements")?;
        }
        let mode = self.ask("Input mode number(1/2): ", self.answers.mode.clone())?;
        Mode::parse(&mode)
    }

    fn collect_filters(&mut self) -> Result<Filters, RoutineLoadError> {
        let db = self.ask(
            "If you want to specify db name, input it (or press Enter): ",
            self.answers.db.clone(),
        )?;
        let table = self.ask(
            "If you want to specify table name, input it (or press Enter): ",
            self.answers.table.clone(),
        )?;
        Ok(Filters {
            schema: parse_filter(&db),
            table: parse_filter(&table),
        })
    }

    async fn execute(
        &mut self,
        catalog: &dyn Catalog,
        mode: Mode,
        filters: &Filters,
    ) -> Result<Report, RoutineLoadError> {
        let inventory = collect_inventory(catalog, filters).await;

        match mode {
            Mode::PauseResume => {
                let tables = group_jobs_by_table(&inventory);
                Ok(Report::PauseResume(generate_pause_resume(&tables, filters)))
            }
            Mode::Recreate => {
                if !self.answers.json {
                    writeln!(self.output, "Getting routine load create statements...")?;
                }
                let scripts =
                    generate_recreate_scripts(catalog, &inventory, self.reporter.as_ref()).await;
                Ok(Report::Recreate(scripts))
            }
        }
    }

    fn report(&mut self, report: &Report) -> Result<(), RoutineLoadError> {
        if self.answers.json {
            match report {
                Report::PauseResume(plans) => serde_json::to_writer_pretty(&mut self.output, plans),
                Report::Recreate(scripts) => serde_json::to_writer_pretty(&mut self.output, scripts),
            }
            .map_err(std::io::Error::from)?;
            writeln!(self.output)?;
        } else {
            match report {
                Report::PauseResume(plans) => {
                    write!(self.output, "{}", render_pause_resume(plans))?;
                }
                Report::Recreate(scripts) => {
                    writeln!(self.output, "Modified routine load create statements:")?;
                    writeln!(self.output, "{}", render_recreate_scripts(scripts))?;
                }
            }
        }
        self.output.flush()?;
        Ok(())
    }

    /// Print a terminal failure for the operator and hand it back.
    fn fail(&mut self, error: RoutineLoadError) -> Result<(), RoutineLoadError> {
        let message = match &error {
            RoutineLoadError::InvalidMode(_) => "Invalid mode number.".to_string(),
            other => other.to_string(),
        };
        writeln!(self.output, "{}", message)?;
        self.output.flush()?;
        Err(error)
    }

    /// Use the pre-supplied answer, or prompt and read one line.
    /// End of input counts as an empty answer.
    fn ask(&mut self, prompt: &str, known: Option<String>) -> Result<String, RoutineLoadError> {
        if let Some(answer) = known {
            return Ok(answer);
        }
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
