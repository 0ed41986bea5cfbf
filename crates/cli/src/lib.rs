//! Xeneon Control client
//!
//! The dashboard's sync core: an HTTP client for the agent, the cached view
//! it polls into, the drag-to-adjust volume gesture, and the embedded panel
//! configuration.

pub mod client;
pub mod config;
pub mod drag;
pub mod panels;
pub mod poller;
pub mod render;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_agent;
