//! Remote command execution over SSH
//!
//! Every call opens its own connection, authenticates with the configured
//! public key, runs exactly one command and disconnects. Nothing is pooled.

use russh::client;
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use saltgrain_core::config::parse_private_key;
use saltgrain_core::{Credentials, Error, Host, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SSH_PORT: u16 = 22;

/// Runs one shell command on a host and returns its stdout.
///
/// This is the seam the reconcilers talk to; tests swap in an in-memory
/// minion.
#[async_trait::async_trait]
pub trait RemoteShell: Send + Sync {
    async fn run(&self, host: &Host, creds: &Credentials, command: &str) -> Result<String>;
}

pub struct SshTransport {
    port: u16,
    accept_unknown_host_keys: bool,
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SshTransport {
    pub fn new() -> Self {
        Self {
            port: SSH_PORT,
            accept_unknown_host_keys: true,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `false` checks server keys against `~/.ssh/known_hosts` and refuses
    /// hosts that are missing or mismatched.
    pub fn accept_unknown_host_keys(mut self, accept: bool) -> Self {
        self.accept_unknown_host_keys = accept;
        self
    }
}

struct HostKeyCheck {
    host: String,
    port: u16,
    accept_unknown: bool,
}

#[async_trait::async_trait]
impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        if self.accept_unknown {
            return Ok(true);
        }
        match russh_keys::check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(known) => Ok(known),
            Err(e) => {
                warn!("host key check for {} failed: {}", self.host, e);
                Ok(false)
            }
        }
    }
}

#[async_trait::async_trait]
impl RemoteShell for SshTransport {
    async fn run(&self, host: &Host, creds: &Credentials, command: &str) -> Result<String> {
        let key_pair = parse_private_key(creds.private_key())?;

        let handler = HostKeyCheck {
            host: host.to_string(),
            port: self.port,
            accept_unknown: self.accept_unknown_host_keys,
        };
        let config = Arc::new(client::Config::default());

        let mut session = client::connect(config, (host.as_str(), self.port), handler)
            .await
            .map_err(|e| Error::connection(host.as_str(), e.to_string()))?;

        let authenticated = session
            .authenticate_publickey(creds.username.clone(), Arc::new(key_pair))
            .await
            .map_err(|e| Error::connection(host.as_str(), e.to_string()))?;
        if !authenticated {
            return Err(Error::connection(
                host.as_str(),
                format!("public key authentication rejected for user {}", creds.username),
            ));
        }

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| Error::session(host.as_str(), e.to_string()))?;

        info!(host = %host, command = %command, "running remote command");

        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::command(host.as_str(), command, e.to_string(), None, ""))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;
        let mut exit_signal = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, .. } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    exit_signal = Some(format!("{:?}", signal_name))
                }
                _ => {}
            }
        }

        let _ = session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await;

        let output = String::from_utf8_lossy(&stdout).to_string();
        let errors = String::from_utf8_lossy(&stderr).to_string();
        debug!(host = %host, command = %command, output = %output, "remote command output");

        match (exit_status, exit_signal) {
            (Some(0), _) => Ok(output),
            (Some(code), _) => Err(Error::command(
                host.as_str(),
                command,
                format!("exit status {}: {}", code, errors.trim()),
                Some(code),
                output,
            )),
            (None, Some(signal)) => Err(Error::command(
                host.as_str(),
                command,
                format!("killed by signal {}", signal),
                None,
                output,
            )),
            (None, None) => Err(Error::command(
                host.as_str(),
                command,
                "remote command exited without exit status or exit signal",
                None,
                output,
            )),
        }
    }
}
