//! Agent startup configuration, resolved from CLI flags and environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use xeneon_protocol::DEFAULT_TOOL_TIMEOUT_SECS;

use crate::paths::DataPaths;

pub const DEFAULT_BIND: &str = "0.0.0.0:4000";

#[derive(Debug, Clone, Args)]
pub struct StartArgs {
    /// Address to listen on
    #[arg(long, env = "XENEON_AGENT_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Path to the svcl mixer utility (default: <data-dir>/bin/svcl.exe, then PATH)
    #[arg(long, env = "XENEON_SVCL")]
    pub svcl: Option<PathBuf>,

    /// Upper bound on any single mixer/display tool invocation
    #[arg(long, env = "XENEON_TOOL_TIMEOUT_SECS", default_value_t = DEFAULT_TOOL_TIMEOUT_SECS)]
    pub tool_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub bind: SocketAddr,
    pub paths: DataPaths,
    pub svcl: Option<PathBuf>,
    pub tool_timeout: Duration,
}

impl AgentConfig {
    pub fn from_args(args: StartArgs, paths: DataPaths) -> Self {
        Self {
            bind: args.bind,
            paths,
            svcl: args.svcl,
            tool_timeout: Duration::from_secs(args.tool_timeout_secs.max(1)),
        }
    }
}
