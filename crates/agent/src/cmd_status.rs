//! `xeneon-agent status`: check whether an agent is answering.

use std::path::Path;

use console::style;
use xeneon_cli::client::AgentClient;

use crate::store::PinnedAppsStore;
use crate::VERSION;

pub async fn run(data_dir: &Path, agent_url: &str) -> anyhow::Result<()> {
    println!();
    println!("  Xeneon Control Agent v{}", VERSION);
    println!("  Data dir: {}", data_dir.display());

    let store = PinnedAppsStore::new(data_dir);
    if store.path().exists() {
        println!(
            "  Pinned apps: {} ({} pinned)",
            store.path().display(),
            store.read().len()
        );
    } else {
        println!("  Pinned apps: not configured");
    }

    let client = AgentClient::new(agent_url)?;
    match client.ping().await {
        Ok(ping) => println!(
            "  Health: {} ({} at {})",
            style("online").green(),
            ping.hostname,
            agent_url
        ),
        Err(e) => {
            println!("  Health: {} ({})", style("unreachable").red(), e);
            println!();
            println!("  Agent is not running.");
            println!("  Start with: xeneon-agent start");
        }
    }

    println!();
    Ok(())
}
