//! Audio session access.
//!
//! `AudioMixer` is the seam between HTTP handlers and the OS mixer. The
//! production implementation shells out to `svcl` (see [`svcl`]); tests swap
//! in a fake.

pub mod reconcile;
pub mod svcl;

use futures::future::BoxFuture;

use xeneon_protocol::AudioSession;

use crate::tool::ToolError;

pub use svcl::SvclMixer;

/// Outcome of one enumeration.
///
/// `Degraded` carries the reason sessions could not be listed. The HTTP layer
/// flattens it to an empty list; it never becomes an error response.
#[derive(Debug, Clone, PartialEq)]
pub enum Enumeration {
    Ok(Vec<AudioSession>),
    Degraded(String),
}

impl Enumeration {
    #[cfg(test)]
    pub fn into_sessions(self) -> Vec<AudioSession> {
        match self {
            Enumeration::Ok(sessions) => sessions,
            Enumeration::Degraded(_) => Vec::new(),
        }
    }
}

pub trait AudioMixer: Send + Sync {
    /// Enumerate live application sessions, reconciled.
    fn sessions(&self) -> BoxFuture<'_, Enumeration>;

    fn set_mute<'a>(&'a self, app_name: &'a str, mute: bool) -> BoxFuture<'a, Result<(), ToolError>>;

    /// `level` is already clamped to `[0, 100]`.
    fn set_volume<'a>(&'a self, app_name: &'a str, level: f64)
        -> BoxFuture<'a, Result<(), ToolError>>;
}
