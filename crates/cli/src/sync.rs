//! Client-side cache of agent state.
//!
//! Polls replace the cached sessions and pins wholesale. Each poll takes a
//! ticket when it starts; a result is applied only if no newer poll has
//! already been applied, so overlapping polls resolve last-write-wins by start
//! order. A failed poll marks the connection down but never clears the cache.

use xeneon_protocol::{format_volume_percent, pinned_sessions, AudioSession};

pub const STATUS_READY: &str = "Ready";
pub const STATUS_OFFLINE: &str = "Agent offline - is xeneon-agent running?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    /// No poll has completed yet.
    Unknown,
    Up,
    Down,
}

/// Authoritative data from one successful poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub sessions: Vec<AudioSession>,
    pub pinned: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollTicket(u64);

/// What the mixer should show. Each empty state is distinct.
#[derive(Debug, PartialEq)]
pub enum MixerView<'a> {
    /// Nothing has loaded yet.
    Connecting,
    /// Agent unreachable; last-known rows are still shown.
    Offline { rows: Vec<&'a AudioSession> },
    /// Connected, but no pinned app is currently producing audio.
    NoPinnedApps,
    Rows(Vec<&'a AudioSession>),
}

/// `pinned` after toggling `name`: appended if absent, removed otherwise.
pub fn toggled_pins(pinned: &[String], name: &str) -> Vec<String> {
    if pinned.iter().any(|p| p == name) {
        pinned.iter().filter(|p| *p != name).cloned().collect()
    } else {
        let mut apps = pinned.to_vec();
        apps.push(name.to_string());
        apps
    }
}

#[derive(Debug, Clone)]
pub struct SyncState {
    sessions: Vec<AudioSession>,
    pinned: Vec<String>,
    connection: Connection,
    status: String,
    next_ticket: u64,
    applied: Option<PollTicket>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            pinned: Vec::new(),
            connection: Connection::Unknown,
            status: STATUS_READY.to_string(),
            next_ticket: 0,
            applied: None,
        }
    }

    pub fn begin_poll(&mut self) -> PollTicket {
        self.next_ticket += 1;
        PollTicket(self.next_ticket)
    }

    /// Apply a finished poll. Returns `false` if a newer poll already landed.
    pub fn apply_poll<E: std::fmt::Display>(
        &mut self,
        ticket: PollTicket,
        result: Result<Snapshot, E>,
    ) -> bool {
        if self.applied.is_some_and(|applied| applied >= ticket) {
            return false;
        }
        self.applied = Some(ticket);

        match result {
            Ok(snapshot) => {
                self.sessions = snapshot.sessions;
                self.pinned = snapshot.pinned;
                self.connection = Connection::Up;
                self.status = STATUS_READY.to_string();
            }
            Err(e) => {
                self.connection = Connection::Down;
                self.status = format!("{STATUS_OFFLINE} ({e})");
            }
        }
        true
    }

    /// Rewrite the cached volume for `name` ahead of confirmation. The next
    /// applied poll overwrites it.
    pub fn apply_optimistic_volume(&mut self, name: &str, level: f64) -> bool {
        match self.sessions.iter_mut().find(|s| s.name == name) {
            Some(session) => {
                session.volume_percent = format_volume_percent(level);
                true
            }
            None => false,
        }
    }

    /// Cache a pin list the agent has confirmed.
    pub fn set_pinned(&mut self, apps: Vec<String>) {
        self.pinned = apps;
    }

    pub fn command_failed(&mut self, message: impl std::fmt::Display) {
        self.connection = Connection::Down;
        self.status = format!("Error: {message}");
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn session(&self, name: &str) -> Option<&AudioSession> {
        self.sessions.iter().find(|s| s.name == name)
    }

    pub fn sessions(&self) -> &[AudioSession] {
        &self.sessions
    }

    pub fn pinned(&self) -> &[String] {
        &self.pinned
    }

    pub fn connection(&self) -> Connection {
        self.connection
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn displayed_sessions(&self) -> Vec<&AudioSession> {
        pinned_sessions(&self.sessions, &self.pinned).collect()
    }

    pub fn view(&self) -> MixerView<'_> {
        let rows = self.displayed_sessions();
        match self.connection {
            Connection::Down => MixerView::Offline { rows },
            Connection::Unknown => MixerView::Connecting,
            Connection::Up if rows.is_empty() => MixerView::NoPinnedApps,
            Connection::Up => MixerView::Rows(rows),
        }
    }
}
