//! `routine-load-admin`: interactive PAUSE/RESUME and re-creation script
//! generator for routine load jobs.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use routine_load_admin::config::Cli;
use routine_load_admin::frontend::{Answers, Frontend};
use routine_load_admin::{LogReporter, MySqlCatalog, Reporter, RoutineLoadError};

const DEFAULT_LOG_FILTER: &str = "routine_load_admin=info";

fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn log_failure(error: &RoutineLoadError) {
    tracing::error!(kind = %error.kind(), "run failed: {}", error);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let reporter: Arc<dyn Reporter> = Arc::new(LogReporter);
    let frontend = Frontend::new(
        std::io::stdin().lock(),
        std::io::stdout().lock(),
        Answers::from(&cli),
        reporter.clone(),
    );

    match frontend
        .run(|params| MySqlCatalog::new(params, reporter.clone()))
        .await
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_failure(&e);
            ExitCode::FAILURE
        }
    }
}
