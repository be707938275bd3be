//! Readiness gate: block until the inventory reports a host as accepted.

use crate::inventory::Inventory;
use saltgrain_core::{Error, Host, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

pub const READINESS_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

pub struct ReadinessGate {
    inventory: Arc<dyn Inventory>,
    timeout: Duration,
    poll_interval: Duration,
}

impl ReadinessGate {
    pub fn new(inventory: Arc<dyn Inventory>) -> Self {
        Self {
            inventory,
            timeout: READINESS_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Test-only: override the deadline and poll interval. The gate's timing
    /// is fixed at [`READINESS_TIMEOUT`] and [`POLL_INTERVAL`] for real use.
    #[doc(hidden)]
    pub fn with_timing(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    /// Poll until `host` is accepted. An inventory failure ends the wait
    /// immediately; it is not retried.
    pub async fn wait_until_ready(&self, host: &Host) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        info!("waiting for {} to be accepted", host);

        loop {
            if Instant::now() > deadline {
                return Err(Error::Timeout {
                    host: host.to_string(),
                    timeout_minutes: self.timeout.as_secs() / 60,
                });
            }

            let accepted = self.inventory.is_accepted(host).await.map_err(|e| match e {
                Error::Inventory(message) => {
                    Error::Inventory(format!("checking acceptance of {}: {}", host, message))
                }
                other => Error::Inventory(format!("checking acceptance of {}: {}", host, other)),
            })?;

            info!("acceptance check for {}: {}", host, accepted);
            if accepted {
                return Ok(());
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
