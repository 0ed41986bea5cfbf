//! Display HDR control.
//!
//! There is no concrete OS backend yet. `NotIntegrated` accepts every request,
//! waits briefly like a real display switch would, and reports that nothing
//! was changed.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tracing::info;

use xeneon_protocol::HdrMode;

use crate::tool::ToolError;

pub trait HdrControl: Send + Sync {
    /// Returns a human-readable description of what happened.
    fn set(&self, mode: HdrMode) -> BoxFuture<'_, Result<String, ToolError>>;
}

pub struct NotIntegrated {
    delay: Duration,
}

impl NotIntegrated {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for NotIntegrated {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

impl HdrControl for NotIntegrated {
    fn set(&self, mode: HdrMode) -> BoxFuture<'_, Result<String, ToolError>> {
        async move {
            info!(
                component = "hdr",
                event = "hdr.request",
                mode = mode.as_str(),
                "HDR request received (no display backend integrated)"
            );
            tokio::time::sleep(self.delay).await;
            Ok(format!(
                "HDR {} requested (simulated: no display backend integrated)",
                mode.as_str()
            ))
        }
        .boxed()
    }
}
