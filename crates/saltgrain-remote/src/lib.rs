//! Saltgrain Remote - SSH transport, inventory client, and readiness gate

pub mod inventory;
pub mod readiness;
pub mod transport;

pub use inventory::{Inventory, InventoryClient};
pub use readiness::{ReadinessGate, POLL_INTERVAL, READINESS_TIMEOUT};
pub use transport::{RemoteShell, SshTransport, SSH_PORT};
