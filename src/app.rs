//! Wiring from a loaded config to a ready-to-use engine, and the glue the
//! binary uses to turn command-line arguments into a desired state.

use saltgrain_core::{DesiredState, Error, GrainValue, Result, SaltCall, SaltgrainConfig};
use saltgrain_engine::{ConvergenceTrigger, GrainEngine, Outcome};
use saltgrain_remote::{InventoryClient, SshTransport};
use std::sync::Arc;
use tracing::info;

/// Validate `config` and build the engine over real SSH and HTTP transports.
pub fn build_engine(config: &SaltgrainConfig) -> Result<GrainEngine> {
    config.validate()?;

    let shell = Arc::new(
        SshTransport::new().accept_unknown_host_keys(config.ssh.accept_unknown_host_keys),
    );
    let inventory = Arc::new(
        InventoryClient::new(config.inventory_credentials())
            .accept_invalid_certs(config.inventory.accept_invalid_certs),
    );
    let trigger =
        ConvergenceTrigger::from_config(shell.clone(), SaltCall::new(), &config.convergence);
    info!(
        "engine ready: ssh user {}, inventory {}",
        config.ssh.username, config.inventory.base_url
    );

    Ok(GrainEngine::new(shell, inventory, Arc::new(config.credentials()?)).with_trigger(trigger))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub async fn run(self, engine: &GrainEngine, desired: &DesiredState) -> Result<Outcome> {
        match self {
            Self::Create => engine.create(desired).await,
            Self::Read => engine.read(desired).await,
            Self::Update => engine.update(desired).await,
            Self::Delete => engine.delete(desired).await,
        }
    }
}

/// Raw grain arguments as given on the command line.
#[derive(Clone, Debug, Default)]
pub struct GrainArgs {
    pub host: String,
    pub key: String,
    pub value: Option<String>,
    pub items: Vec<String>,
    pub list: bool,
    pub apply: bool,
}

/// `--value` makes a scalar grain; `--item` (or `--list` alone) a list grain.
pub fn desired_state(args: GrainArgs) -> Result<DesiredState> {
    if args.host.trim().is_empty() {
        return Err(Error::Config("--host must not be empty".into()));
    }
    if args.key.trim().is_empty() {
        return Err(Error::Config("--key must not be empty".into()));
    }

    let is_list = args.list || !args.items.is_empty();
    let value = match (args.value, is_list) {
        (Some(_), true) => {
            return Err(Error::Config(
                "--value cannot be combined with --item or --list".into(),
            ))
        }
        (Some(value), false) => GrainValue::Scalar(value),
        (None, true) => GrainValue::List(args.items),
        // read and delete of a scalar need no value
        (None, false) => GrainValue::scalar(""),
    };

    Ok(DesiredState::new(args.host, args.key, value).with_apply(args.apply))
}
