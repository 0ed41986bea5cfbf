//! `xeneon` - terminal front-end for the Xeneon Control agent.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use console::{style, Term};
use tracing_subscriber::EnvFilter;

use xeneon_cli::client::AgentClient;
use xeneon_cli::config::ClientConfig;
use xeneon_cli::drag::VolumeDrag;
use xeneon_cli::poller::{Command as MixerCommand, SyncLoop};
use xeneon_cli::render;
use xeneon_protocol::HdrMode;

#[derive(Parser)]
#[command(name = "xeneon", version, about = "Control the Xeneon dashboard agent")]
struct Cli {
    /// Agent base URL (overrides the config file)
    #[arg(long, global = true, env = "XENEON_AGENT_URL")]
    agent: Option<String>,

    /// Config file (default: ~/.config/xeneon/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the agent answers
    Ping,

    /// Show the mixer (pinned apps only, unless --all)
    Sessions {
        #[arg(long)]
        all: bool,
    },

    /// Mute an app
    Mute { app: String },

    /// Unmute an app
    Unmute { app: String },

    /// Flip an app's mute state
    ToggleMute { app: String },

    /// Set an app's volume (0-100)
    Volume { app: String, level: f64 },

    /// Adjust an app's volume by a horizontal drag distance
    VolumeDrag {
        app: String,
        /// Horizontal displacement; 0.5 percentage points per unit
        #[arg(long, allow_hyphen_values = true)]
        dx: f64,
    },

    /// Switch display HDR
    Hdr {
        #[arg(value_enum, default_value_t = HdrArg::Toggle)]
        mode: HdrArg,
    },

    /// List pinned apps
    Pinned,

    /// Pin an app to the mixer
    Pin { app: String },

    /// Unpin an app
    Unpin { app: String },

    /// Live mixer, refreshed on the poll interval
    Watch,

    /// Show the embedded dashboard panels
    Panels,

    /// Print shell completions
    Completions { shell: Shell },
}

#[derive(Clone, Copy, ValueEnum)]
enum HdrArg {
    On,
    Off,
    Toggle,
}

impl From<HdrArg> for HdrMode {
    fn from(arg: HdrArg) -> Self {
        match arg {
            HdrArg::On => HdrMode::On,
            HdrArg::Off => HdrMode::Off,
            HdrArg::Toggle => HdrMode::Toggle,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "xeneon", &mut io::stdout());
        return Ok(());
    }

    let config = ClientConfig::load(cli.config.as_deref())?.with_agent_url(cli.agent);
    let client = AgentClient::with_timeout(&config.agent_url, config.request_timeout())?;
    let sync = SyncLoop::new(client, config.poll_interval());

    match cli.command {
        Command::Ping => {
            let pong = sync
                .client()
                .ping()
                .await
                .with_context(|| format!("No agent at {}", config.agent_url))?;
            println!(
                "{} {} ({})",
                style("●").green(),
                pong.hostname,
                pong.status
            );
        }
        Command::Sessions { all } => {
            sync.poll_once().await;
            let state = sync.state();
            if all {
                println!("{}", render::sessions_table(state.sessions(), state.pinned()));
                println!("{}", render::status_line(&state));
            } else {
                println!("{}", render::render_mixer(&state));
            }
        }
        Command::Mute { app } => {
            send(&sync, MixerCommand::Mute { app_name: app, mute: true }).await?;
        }
        Command::Unmute { app } => {
            send(&sync, MixerCommand::Mute { app_name: app, mute: false }).await?;
        }
        Command::ToggleMute { app } => {
            sync.poll_once().await;
            sync.toggle_mute(&app).await?;
            println!("{}", render::render_mixer(&sync.state()));
        }
        Command::Volume { app, level } => {
            send(&sync, MixerCommand::SetVolume { app_name: app, level }).await?;
        }
        Command::VolumeDrag { app, dx } => {
            sync.poll_once().await;
            let session = sync.state().session(&app).cloned();
            let Some(session) = session else {
                bail!("{app} has no active audio session");
            };
            let mut drag = VolumeDrag::begin(&session, 0.0);
            drag.moved(dx);
            sync.commit_drag(drag).await?;
            println!("{}", render::render_mixer(&sync.state()));
        }
        Command::Hdr { mode } => {
            let message = sync.client().hdr(mode.into()).await?;
            println!("{message}");
        }
        Command::Pinned => {
            let apps = sync.client().pinned_apps().await?;
            if apps.is_empty() {
                println!("No pinned apps.");
            }
            for app in apps {
                println!("{app}");
            }
        }
        Command::Pin { app } => set_pinned(&sync, &app, true).await?,
        Command::Unpin { app } => set_pinned(&sync, &app, false).await?,
        Command::Watch => watch(&sync).await?,
        Command::Panels => {
            let panels = config.panels.resolve(&config.agent_url)?;
            println!("{}", render::panels_table(&panels));
            if config.panels.show_debug {
                for panel in &panels {
                    if let Some(hint) = &panel.hint {
                        println!("{}: {}", panel.name, serde_json::to_string_pretty(hint)?);
                    }
                }
            }
        }
        Command::Completions { .. } => {}
    }

    Ok(())
}

async fn send(sync: &SyncLoop, command: MixerCommand) -> Result<()> {
    sync.send(command).await?;
    println!("{}", render::render_mixer(&sync.state()));
    Ok(())
}

async fn set_pinned(sync: &SyncLoop, app: &str, pinned: bool) -> Result<()> {
    match sync.set_pin(app, pinned).await? {
        Some(apps) => println!("Pinned apps: {}", apps.join(", ")),
        None => println!("{app} is already {}", if pinned { "pinned" } else { "unpinned" }),
    }
    Ok(())
}

async fn watch(sync: &SyncLoop) -> Result<()> {
    let term = Term::stdout();
    sync.run(
        |state| {
            let _ = term.clear_screen();
            let _ = term.write_line(&render::render_mixer(state));
        },
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
    )
    .await;
    Ok(())
}
