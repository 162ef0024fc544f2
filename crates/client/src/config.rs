use crate::server::{Capabilities, IoFormat};
use std::time::Duration;

/// Per-client execution settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline for acquiring the command lock.
    pub command_timeout: Duration,
    pub io_format: IoFormat,
    /// Capabilities requested for every command.
    pub capabilities: Capabilities,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(15),
            io_format: IoFormat::Binary,
            capabilities: Capabilities::MODIFICATIONS,
        }
    }
}
