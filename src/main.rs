//! saltgrain - keep Salt grains on managed hosts in the desired state
//!
//! Usage:
//!   saltgrain create --host web1 --key env --value prod --apply
//!   saltgrain update --host web1 --key roles --item docker --item web
//!   saltgrain read   --host web1 --key roles --list
//!   saltgrain wait   --host web1
//!   saltgrain init-config > saltgrain.toml

use clap::{Args, Parser, Subcommand};
use saltgrain::{build_engine, desired_state, GrainArgs, Operation};
use saltgrain_core::{Host, SaltgrainConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "saltgrain",
    about = "Reconcile Salt grains over SSH once the host is accepted by the inventory",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (TOML)
    #[arg(short, long, global = true, default_value = "saltgrain.toml")]
    config: PathBuf,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set a grain on the host
    Create(GrainOpts),
    /// Print the grain as the host reports it
    Read(GrainOpts),
    /// Bring the grain on the host in line with the given value
    Update(GrainOpts),
    /// Remove the grain (scalar) or the given elements (list)
    Delete(GrainOpts),
    /// Block until the host is accepted by the inventory
    Wait {
        #[arg(long)]
        host: String,
    },
    /// Print a starter config
    InitConfig,
    /// Show version
    Version,
}

#[derive(Args)]
struct GrainOpts {
    /// Target host
    #[arg(long)]
    host: String,
    /// Grain key
    #[arg(short, long)]
    key: String,
    /// Scalar value
    #[arg(short, long, conflicts_with_all = ["item", "list"])]
    value: Option<String>,
    /// List element (repeat for each element)
    #[arg(short, long = "item")]
    item: Vec<String>,
    /// Treat the grain as a list even with no --item
    #[arg(long)]
    list: bool,
    /// Run state.apply after a successful change
    #[arg(long)]
    apply: bool,
}

impl From<GrainOpts> for GrainArgs {
    fn from(opts: GrainOpts) -> Self {
        GrainArgs {
            host: opts.host,
            key: opts.key,
            value: opts.value,
            items: opts.item,
            list: opts.list,
            apply: opts.apply,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (operation, opts) = match cli.command {
        Commands::Version => {
            println!("saltgrain v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::InitConfig => {
            print!("{}", SaltgrainConfig::default().to_toml());
            return Ok(());
        }
        Commands::Wait { host } => {
            let _guard = saltgrain::logging::init_tracing(cli.log_file.as_deref());
            let engine = build_engine(&SaltgrainConfig::load(&cli.config)?)?;
            engine.wait_ready(&Host::new(host.as_str())).await?;
            println!("{} is accepted", host);
            return Ok(());
        }
        Commands::Create(opts) => (Operation::Create, opts),
        Commands::Read(opts) => (Operation::Read, opts),
        Commands::Update(opts) => (Operation::Update, opts),
        Commands::Delete(opts) => (Operation::Delete, opts),
    };

    let _guard = saltgrain::logging::init_tracing(cli.log_file.as_deref());
    let desired = desired_state(opts.into())?;
    let engine = build_engine(&SaltgrainConfig::load(&cli.config)?)?;

    let outcome = operation.run(&engine, &desired).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
