//! Periodic fetch-and-merge loop plus command dispatch.
//!
//! Every tick fetches sessions and pinned apps concurrently and applies the
//! pair as one snapshot. Ticks that come due while a poll is still running are
//! skipped rather than queued. A successful command triggers an immediate poll.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use xeneon_protocol::HdrMode;

use crate::client::{AgentClient, ClientError};
use crate::drag::VolumeDrag;
use crate::sync::{toggled_pins, Snapshot, SyncState};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0} has no active audio session")]
    NoSession(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// A user-issued mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Mute { app_name: String, mute: bool },
    SetVolume { app_name: String, level: f64 },
    Hdr(HdrMode),
}

impl Command {
    fn describe(&self) -> String {
        match self {
            Command::Mute { app_name, mute } => {
                format!("{} {app_name}", if *mute { "mute" } else { "unmute" })
            }
            Command::SetVolume { app_name, level } => format!("volume {app_name} {level}"),
            Command::Hdr(mode) => format!("hdr {}", mode.as_str()),
        }
    }
}

pub struct SyncLoop {
    client: AgentClient,
    state: Arc<Mutex<SyncState>>,
    interval: Duration,
}

impl SyncLoop {
    pub fn new(client: AgentClient, interval: Duration) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(SyncState::new())),
            interval: interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL),
        }
    }

    pub fn client(&self) -> &AgentClient {
        &self.client
    }

    pub fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch both halves and apply them. Returns whether the result was applied.
    pub async fn poll_once(&self) -> bool {
        let ticket = self.state().begin_poll();

        let (sessions, pinned, ping) = tokio::join!(
            self.client.sessions(),
            self.client.pinned_apps(),
            self.client.ping()
        );

        match ping {
            Ok(p) => debug!(component = "sync", event = "sync.ping", hostname = %p.hostname),
            Err(e) => debug!(component = "sync", event = "sync.ping_failed", error = %e),
        }

        let result = match (sessions, pinned) {
            (Ok(sessions), Ok(pinned)) => Ok(Snapshot { sessions, pinned }),
            (Err(e), _) | (_, Err(e)) => {
                warn!(
                    component = "sync",
                    event = "sync.poll_failed",
                    error = %e,
                    "Failed to fetch agent state"
                );
                Err(e)
            }
        };

        self.state().apply_poll(ticket, result)
    }

    /// Poll on the interval until `shutdown` resolves. `on_update` sees the
    /// state after every poll.
    pub async fn run<F, S>(&self, mut on_update: F, shutdown: S)
    where
        F: FnMut(&SyncState),
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.poll_once().await;
                    on_update(&*self.state());
                }
            }
        }
    }

    /// Send a command, then refresh. Failures flip the view offline.
    pub async fn send(&self, command: Command) -> Result<(), ClientError> {
        let label = command.describe();
        self.state().set_status(format!("Sending {label}..."));

        let result = match &command {
            Command::Mute { app_name, mute } => {
                self.client.mute(app_name, *mute).await.map(|_| ())
            }
            Command::SetVolume { app_name, level } => {
                self.client.set_volume(app_name, *level).await.map(|_| ())
            }
            Command::Hdr(mode) => self.client.hdr(*mode).await.map(|message| {
                info!(component = "sync", event = "sync.hdr", message = %message);
            }),
        };

        match result {
            Ok(()) => {
                self.poll_once().await;
                Ok(())
            }
            Err(e) => {
                self.state().command_failed(&e);
                Err(e)
            }
        }
    }

    /// Finish a drag: show the released level right away, send exactly one
    /// set-volume, then let the next poll settle the real value.
    pub async fn commit_drag(&self, drag: VolumeDrag) -> Result<(), ClientError> {
        let commit = drag.release();
        self.state()
            .apply_optimistic_volume(&commit.app_name, commit.level);
        self.send(Command::SetVolume {
            app_name: commit.app_name,
            level: commit.level,
        })
        .await
    }

    /// Flip the mute state the cache currently shows for `app_name`. Refuses
    /// when the app has no cached session.
    pub async fn toggle_mute(&self, app_name: &str) -> Result<(), SyncError> {
        let muted = self.state().session(app_name).map(|s| s.muted);
        let Some(muted) = muted else {
            return Err(SyncError::NoSession(app_name.to_string()));
        };
        self.send(Command::Mute {
            app_name: app_name.to_string(),
            mute: !muted,
        })
        .await?;
        Ok(())
    }

    /// Pin `app_name` if absent from the stored list, unpin it otherwise.
    pub async fn toggle_pin(&self, app_name: &str) -> Result<Vec<String>, ClientError> {
        let stored = self.stored_pins().await?;
        self.save_pins(toggled_pins(&stored, app_name)).await
    }

    /// Bring `app_name` to the wanted pin state. Returns `None` when the
    /// stored list already has it that way.
    pub async fn set_pin(
        &self,
        app_name: &str,
        pinned: bool,
    ) -> Result<Option<Vec<String>>, ClientError> {
        let stored = self.stored_pins().await?;
        if stored.iter().any(|p| p == app_name) == pinned {
            self.state().set_pinned(stored);
            return Ok(None);
        }
        self.save_pins(toggled_pins(&stored, app_name))
            .await
            .map(Some)
    }

    // Toggles start from the agent's stored list; the save replaces it whole.
    async fn stored_pins(&self) -> Result<Vec<String>, ClientError> {
        self.client.pinned_apps().await.inspect_err(|e| {
            self.state().command_failed(e);
        })
    }

    async fn save_pins(&self, apps: Vec<String>) -> Result<Vec<String>, ClientError> {
        match self.client.set_pinned_apps(&apps).await {
            Ok(saved) => {
                self.state().set_pinned(saved.clone());
                Ok(saved)
            }
            Err(e) => {
                self.state().command_failed(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{Connection, MixerView};
    use crate::test_agent::TestAgent;

    async fn connected(names: &[&str], pinned: &[&str]) -> (TestAgent, SyncLoop) {
        let agent = TestAgent::spawn(names).await;
        agent.state().pinned = pinned.iter().map(|p| p.to_string()).collect();
        let client = AgentClient::new(&agent.url()).expect("client");
        let sync = SyncLoop::new(client, DEFAULT_POLL_INTERVAL);
        assert!(sync.poll_once().await);
        (agent, sync)
    }

    #[tokio::test]
    async fn poll_joins_sessions_with_pins() {
        let (_agent, sync) = connected(&["chrome.exe", "spotify.exe"], &["spotify.exe"]).await;
        let state = sync.state();
        assert_eq!(state.connection(), Connection::Up);
        match state.view() {
            MixerView::Rows(rows) => {
                let names: Vec<_> = rows.iter().map(|s| s.name.as_str()).collect();
                assert_eq!(names, vec!["spotify.exe"]);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[tokio::test]
    async fn agent_failure_goes_offline_and_keeps_cache() {
        let (agent, sync) = connected(&["spotify.exe"], &["spotify.exe"]).await;

        agent.fail_with(500, "boom");
        sync.poll_once().await;
        {
            let state = sync.state();
            assert_eq!(state.connection(), Connection::Down);
            assert!(state.session("spotify.exe").is_some());
        }

        agent.recover();
        sync.poll_once().await;
        assert_eq!(sync.state().connection(), Connection::Up);
    }

    #[tokio::test]
    async fn drag_commit_sends_one_volume_and_converges() {
        let (agent, sync) = connected(&["spotify.exe"], &["spotify.exe"]).await;

        let session = sync.state().session("spotify.exe").cloned().expect("session");
        let mut drag = VolumeDrag::begin(&session, 0.0);
        for x in [10.0, 20.0, 40.0, 60.0] {
            drag.moved(x);
        }
        assert!(agent.calls().is_empty());

        sync.commit_drag(drag).await.expect("commit");
        assert_eq!(agent.calls(), vec!["volume spotify.exe 80"]);

        // The fake agent still reports 50%; the post-command poll is authoritative.
        assert_eq!(
            sync.state().session("spotify.exe").map(|s| s.volume_level()),
            Some(50.0)
        );
    }

    #[tokio::test]
    async fn optimistic_level_shows_before_confirmation() {
        let (agent, sync) = connected(&["spotify.exe"], &["spotify.exe"]).await;
        agent.fail_with(503, "busy");

        let session = sync.state().session("spotify.exe").cloned().expect("session");
        let mut drag = VolumeDrag::begin(&session, 0.0);
        drag.moved(-40.0);

        assert!(sync.commit_drag(drag).await.is_err());
        let state = sync.state();
        assert_eq!(state.session("spotify.exe").map(|s| s.volume_level()), Some(30.0));
        assert_eq!(state.connection(), Connection::Down);
    }

    #[tokio::test]
    async fn mute_command_triggers_refresh() {
        let (agent, sync) = connected(&["spotify.exe"], &["spotify.exe"]).await;

        sync.toggle_mute("spotify.exe").await.expect("mute");
        assert_eq!(agent.calls(), vec!["mute spotify.exe true"]);
        assert_eq!(sync.state().session("spotify.exe").map(|s| s.muted), Some(true));
    }

    #[tokio::test]
    async fn toggle_pin_persists_full_list() {
        let (agent, sync) = connected(&["a.exe", "b.exe"], &["a.exe"]).await;

        let saved = sync.toggle_pin("b.exe").await.expect("pin");
        assert_eq!(saved, vec!["a.exe", "b.exe"]);
        assert_eq!(agent.state().pinned, vec!["a.exe", "b.exe"]);

        let saved = sync.toggle_pin("a.exe").await.expect("unpin");
        assert_eq!(saved, vec!["b.exe"]);
        assert_eq!(sync.state().pinned(), ["b.exe".to_string()]);
    }

    #[tokio::test]
    async fn failed_pin_save_leaves_cache_alone() {
        let (agent, sync) = connected(&["a.exe"], &["a.exe"]).await;
        agent.fail_with(500, "disk full");

        assert!(sync.toggle_pin("a.exe").await.is_err());
        assert_eq!(sync.state().pinned(), ["a.exe".to_string()]);
    }

    fn unpolled(agent: &TestAgent, timeout: Duration) -> SyncLoop {
        let client = AgentClient::with_timeout(&agent.url(), timeout).expect("client");
        SyncLoop::new(client, DEFAULT_POLL_INTERVAL)
    }

    #[tokio::test]
    async fn pin_before_first_poll_keeps_stored_pins() {
        let agent = TestAgent::spawn(&["a.exe"]).await;
        agent.state().pinned = vec!["a.exe".into(), "c.exe".into()];
        let sync = unpolled(&agent, Duration::from_secs(5));
        assert_eq!(sync.state().connection(), Connection::Unknown);

        let saved = sync.toggle_pin("b.exe").await.expect("pin");
        assert_eq!(saved, vec!["a.exe", "c.exe", "b.exe"]);
        assert_eq!(agent.state().pinned, vec!["a.exe", "c.exe", "b.exe"]);
        assert_eq!(sync.state().pinned(), saved.as_slice());
    }

    #[tokio::test]
    async fn pin_after_failed_sessions_fetch_keeps_stored_pins() {
        let agent = TestAgent::spawn(&["a.exe"]).await;
        agent.state().pinned = vec!["a.exe".into(), "c.exe".into()];
        agent.state().sessions_delay = Duration::from_secs(2);
        let sync = unpolled(&agent, Duration::from_millis(500));

        sync.poll_once().await;
        assert_eq!(sync.state().connection(), Connection::Down);
        assert!(sync.state().pinned().is_empty());

        let saved = sync.set_pin("b.exe", true).await.expect("pin");
        assert_eq!(saved, Some(vec!["a.exe".into(), "c.exe".into(), "b.exe".into()]));
        assert_eq!(agent.state().pinned, vec!["a.exe", "c.exe", "b.exe"]);
    }

    #[tokio::test]
    async fn unreadable_pins_are_never_overwritten() {
        let agent = TestAgent::spawn(&["a.exe"]).await;
        agent.state().pinned = vec!["a.exe".into()];
        agent.fail_with(500, "boom");
        let sync = unpolled(&agent, Duration::from_secs(5));

        assert!(sync.toggle_pin("b.exe").await.is_err());
        assert!(agent.calls().is_empty());
        assert_eq!(agent.state().pinned, vec!["a.exe"]);
        assert_eq!(sync.state().connection(), Connection::Down);
    }

    #[tokio::test]
    async fn set_pin_reports_unchanged_state() {
        let agent = TestAgent::spawn(&["a.exe"]).await;
        agent.state().pinned = vec!["a.exe".into()];
        let sync = unpolled(&agent, Duration::from_secs(5));

        assert_eq!(sync.set_pin("a.exe", true).await.expect("pin"), None);
        assert_eq!(sync.set_pin("b.exe", false).await.expect("unpin"), None);
        assert!(agent.calls().is_empty());
        assert_eq!(sync.state().pinned(), ["a.exe".to_string()]);

        let saved = sync.set_pin("a.exe", false).await.expect("unpin");
        assert_eq!(saved, Some(Vec::new()));
        assert!(agent.state().pinned.is_empty());
    }

    #[tokio::test]
    async fn toggle_mute_refuses_unknown_session() {
        let (agent, sync) = connected(&["spotify.exe"], &["spotify.exe"]).await;

        let err = sync.toggle_mute("ghost.exe").await.expect_err("no session");
        assert!(matches!(err, SyncError::NoSession(ref app) if app == "ghost.exe"));
        assert!(agent.calls().is_empty());
    }

    #[tokio::test]
    async fn slow_sessions_within_timeout_stay_online() {
        let agent = TestAgent::spawn(&["spotify.exe"]).await;
        agent.state().pinned = vec!["spotify.exe".into()];
        agent.state().sessions_delay = Duration::from_millis(600);
        let sync = unpolled(&agent, Duration::from_secs(3));

        assert!(sync.poll_once().await);
        assert_eq!(sync.state().connection(), Connection::Up);
        assert!(sync.state().session("spotify.exe").is_some());
    }

    #[tokio::test]
    async fn run_polls_until_shutdown() {
        let agent = TestAgent::spawn(&["a.exe"]).await;
        let client = AgentClient::new(&agent.url()).expect("client");
        let sync = SyncLoop::new(client, MIN_POLL_INTERVAL);

        let mut updates = 0;
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let shutdown = async {
            let _ = rx.await;
        };
        let stopper = async {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            let _ = tx.send(());
        };

        tokio::join!(sync.run(|_| updates += 1, shutdown), stopper);
        assert!(updates >= 2, "expected at least two polls, got {updates}");
    }
}
