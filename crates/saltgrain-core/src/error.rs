//! Error types for Saltgrain

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("cannot connect to {host}: {message}")]
    Connection { host: String, message: String },

    #[error("cannot create session with {host}: {message}")]
    Session { host: String, message: String },

    #[error("cannot run `{command}` on {host}: {message}")]
    Command {
        host: String,
        command: String,
        message: String,
        exit_status: Option<u32>,
        output: String,
    },

    #[error("timeout reached after {timeout_minutes} minutes; {host} not accepted")]
    Timeout { host: String, timeout_minutes: u64 },

    #[error("inventory error: {0}")]
    Inventory(String),

    #[error("cannot converge {host}: {message}")]
    Convergence { host: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn connection(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            host: host.into(),
            message: message.into(),
        }
    }

    pub fn session(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Session {
            host: host.into(),
            message: message.into(),
        }
    }

    /// A command that could not complete. `exit_status` is `None` when the
    /// failure happened in transport I/O rather than on the remote side.
    pub fn command(
        host: impl Into<String>,
        command: impl Into<String>,
        message: impl Into<String>,
        exit_status: Option<u32>,
        output: impl Into<String>,
    ) -> Self {
        Self::Command {
            host: host.into(),
            command: command.into(),
            message: message.into(),
            exit_status,
            output: output.into(),
        }
    }

    pub fn convergence(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Convergence {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Transport-level failures: the remote side could not be reached or the
    /// command could not run to a zero exit.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Session { .. } | Self::Command { .. }
        )
    }
}
