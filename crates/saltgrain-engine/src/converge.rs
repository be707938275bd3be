//! Convergence trigger: wait for any running `state.apply` on the host to
//! finish, then run a fresh one and hand back the tail of its log.
//!
//! The wait has no bound unless `BusyWait::MaxChecks` is configured. A
//! wedged job on the host therefore blocks the caller indefinitely by
//! default.

use saltgrain_core::codec::MINION_PROC_DIR;
use saltgrain_core::config::ConvergenceConfig;
use saltgrain_core::{Credentials, Error, Host, Result, SaltCall};
use saltgrain_remote::RemoteShell;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusyWait {
    Unbounded,
    /// Give up after this many probes that found a job running.
    MaxChecks(u32),
}

impl BusyWait {
    /// `None` and `Some(0)` both mean no bound.
    pub fn from_limit(limit: Option<u32>) -> Self {
        match limit {
            Some(n) if n > 0 => Self::MaxChecks(n),
            _ => Self::Unbounded,
        }
    }
}

pub struct ConvergenceTrigger {
    shell: Arc<dyn RemoteShell>,
    salt: SaltCall,
    proc_dir: String,
    log_path: String,
    tail_lines: usize,
    poll_interval: Duration,
    busy_wait: BusyWait,
}

impl ConvergenceTrigger {
    pub fn new(shell: Arc<dyn RemoteShell>, salt: SaltCall) -> Self {
        Self::from_config(shell, salt, &ConvergenceConfig::default())
    }

    pub fn from_config(
        shell: Arc<dyn RemoteShell>,
        salt: SaltCall,
        config: &ConvergenceConfig,
    ) -> Self {
        Self {
            shell,
            salt,
            proc_dir: MINION_PROC_DIR.to_string(),
            log_path: config.log_path.clone(),
            tail_lines: config.log_tail_lines,
            poll_interval: Duration::from_secs(config.busy_poll_secs),
            busy_wait: BusyWait::from_limit(config.max_busy_checks),
        }
    }

    pub fn with_busy_wait(mut self, busy_wait: BusyWait) -> Self {
        self.busy_wait = busy_wait;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Probe until no `state.apply` is running. Returns how many probes
    /// found one; 0 means the host was idle and no sleep happened.
    pub async fn wait_until_idle(&self, host: &Host, creds: &Credentials) -> Result<u32> {
        let probe = self.salt.busy_probe(&self.proc_dir);
        let mut busy_checks = 0u32;

        loop {
            let running = self
                .shell
                .run(host, creds, &probe)
                .await
                .map_err(|e| Error::convergence(host.as_str(), e.to_string()))?;

            if running.trim().is_empty() {
                return Ok(busy_checks);
            }

            busy_checks += 1;
            info!("state.apply already running on {} ({} checks)", host, busy_checks);

            if let BusyWait::MaxChecks(max) = self.busy_wait {
                if busy_checks >= max {
                    return Err(Error::convergence(
                        host.as_str(),
                        format!("state.apply still running after {} checks", busy_checks),
                    ));
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Wait for the host to be idle, then run `state.apply`. The returned log
    /// excerpt is informational even when the state run itself failed; only
    /// transport failures are errors.
    pub async fn converge(&self, host: &Host, creds: &Credentials) -> Result<String> {
        self.wait_until_idle(host, creds).await?;

        info!("applying state on {}", host);
        let log = self
            .shell
            .run(host, creds, &self.salt.state_apply(&self.log_path, self.tail_lines))
            .await
            .map_err(|e| Error::convergence(host.as_str(), format!("cannot apply state: {}", e)))?;
        Ok(log)
    }
}
