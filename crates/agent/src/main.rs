//! Xeneon Control Agent
//!
//! Local background service behind the dashboard. Serves a small JSON API
//! over the OS audio mixer, display HDR and the pinned-apps list.

mod api;
mod audio;
mod cmd_status;
mod config;
mod error;
mod hdr;
mod logging;
mod paths;
mod state;
mod store;
mod tool;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::audio::SvclMixer;
use crate::config::{AgentConfig, StartArgs};
use crate::hdr::NotIntegrated;
use crate::paths::DataPaths;
use crate::state::AppState;
use crate::store::PinnedAppsStore;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "xeneon-agent", version = VERSION, about = "Xeneon Control agent")]
struct Cli {
    /// Data directory (default: ~/.xeneon)
    #[arg(long, global = true, env = "XENEON_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the agent in the foreground
    Start(StartArgs),

    /// Check whether an agent is answering
    Status {
        /// Agent base URL
        #[arg(long, default_value = "http://127.0.0.1:4000")]
        agent: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let paths = DataPaths::resolve(cli.data_dir.as_deref())?;

    match cli.command {
        Command::Start(args) => run_server(AgentConfig::from_args(args, paths)).await,
        Command::Status { agent } => cmd_status::run(paths.root(), &agent).await,
    }
}

async fn run_server(config: AgentConfig) -> anyhow::Result<()> {
    config.paths.ensure_dirs()?;
    let logging = logging::init_logging(&config.paths.log_dir())?;

    let program = SvclMixer::resolve_program(config.svcl.as_deref(), &config.paths);
    let mixer = SvclMixer::new(program, config.paths.scratch_dir(), config.tool_timeout);
    let store = PinnedAppsStore::new(config.paths.root());
    store.ensure_exists()?;
    let hostname = state::resolve_hostname();

    info!(
        component = "server",
        event = "server.starting",
        run_id = %logging.run_id,
        version = VERSION,
        data_dir = %config.paths.root().display(),
        log_path = %logging.log_path.display(),
        svcl = %mixer.program().display(),
        tool_timeout_ms = config.tool_timeout.as_millis() as u64,
        hostname = %hostname,
        "Starting Xeneon Control agent"
    );

    let state = Arc::new(AppState::new(
        Arc::new(mixer),
        Arc::new(NotIntegrated::default()),
        store,
        hostname,
    ));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        component = "server",
        event = "server.listening",
        bind = %config.bind,
        "Listening on {}",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        component = "server",
        event = "server.stopped",
        "Agent stopped"
    );
    drop(logging.guard);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(
            component = "server",
            event = "server.signal_failed",
            error = %e,
            "Failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
