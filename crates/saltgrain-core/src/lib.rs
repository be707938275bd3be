//! Saltgrain Core - Types, grain codec, configuration, and error handling

pub mod codec;
pub mod config;
pub mod error;
pub mod types;

pub use codec::{shell_escape, GrainCodec, SaltCall};
pub use config::SaltgrainConfig;
pub use error::{Error, Result};
pub use types::*;
