//! # suiteql Main Entry Point
//!
//! Picks interactive or piped mode and wires the executor to it.

use anyhow::Result;
use atty::Stream;
use suiteql::cmd_args::CommandLineArgs;
use suiteql::config::{get_history_path, get_profile_path, LOG_LEVEL_ENV_VAR};
use suiteql::formatter::KeywordFormatter;
use suiteql::history::{QueryHistory, DEFAULT_MAX_ENTRIES};
use suiteql::piped::{self, RetryPolicy};
use suiteql::profile::load_settings;
use suiteql::render::{OutputMode, TableRenderer};
use suiteql::repl::{ReplController, Session};
use suiteql::{PageWindow, QueryExecutor};
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cmd_args = CommandLineArgs::parse();
    init_tracing_subscriber(cmd_args.verbose());

    let window = PageWindow::with_explicit(cmd_args.limit(), cmd_args.offset())?;
    let settings = load_settings(cmd_args.profile(), &get_profile_path())?;
    tracing::info!("Profile '{}' targets {}", cmd_args.profile(), settings.endpoint);
    let executor = QueryExecutor::new(settings)?;

    let interactive =
        cmd_args.interactive() || (cmd_args.file().is_none() && atty::is(Stream::Stdin));
    tracing::debug!("Starting in {} mode", if interactive { "interactive" } else { "piped" });

    if interactive {
        run_repl(executor, &cmd_args, window).await
    } else {
        let query = piped::read_query(cmd_args.file())?;
        let renderer = TableRenderer::new(false, cmd_args.json());
        piped::run_piped(&executor, &renderer, &query, window, RetryPolicy::default()).await
    }
}

async fn run_repl(executor: QueryExecutor, cmd_args: &CommandLineArgs, window: PageWindow) -> Result<()> {
    let color = atty::is(Stream::Stdout);
    let mode = if cmd_args.json() {
        OutputMode::Json
    } else {
        OutputMode::Table
    };

    let mut session = Session::new(mode, window);
    if let Some(path) = cmd_args.file() {
        session = session.replace_buffer(piped::read_query(Some(path))?);
    }

    let history = QueryHistory::new(get_history_path(), DEFAULT_MAX_ENTRIES);
    let renderer = TableRenderer::new(color, cmd_args.json());
    let mut controller = ReplController::new(executor, renderer, KeywordFormatter, history, color);
    controller.run(session).await
}

fn init_tracing_subscriber(verbose: bool) {
    let mut filter = EnvFilter::from_env(LOG_LEVEL_ENV_VAR)
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("hyper_util=warn".parse().unwrap())
        .add_directive("rustyline=warn".parse().unwrap())
        .add_directive("tokio=warn".parse().unwrap())
        .add_directive("rustls=warn".parse().unwrap());
    if verbose {
        filter = filter.add_directive("suiteql=debug".parse().unwrap());
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::rfc_3339())
        .init();
}
