//! DTO for the liveness check.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub alive: bool,
    /// Seconds since the server started.
    pub uptime: u64,
}
