//! Single-valued grains. Writes are `grains.setval` overwrites, so create and
//! update are the same command and neither reads first.

use saltgrain_core::{Credentials, GrainCodec, GrainKey, Host, Result, SaltCall};
use saltgrain_remote::RemoteShell;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ScalarReconciler {
    shell: Arc<dyn RemoteShell>,
    salt: SaltCall,
}

impl ScalarReconciler {
    pub fn new(shell: Arc<dyn RemoteShell>, salt: SaltCall) -> Self {
        Self { shell, salt }
    }

    pub async fn create(
        &self,
        host: &Host,
        creds: &Credentials,
        key: &GrainKey,
        value: &str,
    ) -> Result<()> {
        info!("setting {} on {}", key, host);
        self.shell.run(host, creds, &self.salt.setval(key, value)).await?;
        Ok(())
    }

    /// The host's value, or `""` when the grain is unset.
    pub async fn read(&self, host: &Host, creds: &Credentials, key: &GrainKey) -> Result<String> {
        let raw = self.shell.run(host, creds, &self.salt.get(key)).await?;
        let value = GrainCodec::decode_scalar(&raw);
        debug!("{} on {} reads {:?}", key, host, value);
        Ok(value)
    }

    pub async fn update(
        &self,
        host: &Host,
        creds: &Credentials,
        key: &GrainKey,
        value: &str,
    ) -> Result<()> {
        self.create(host, creds, key, value).await
    }

    pub async fn delete(&self, host: &Host, creds: &Credentials, key: &GrainKey) -> Result<()> {
        info!("deleting {} on {}", key, host);
        self.shell.run(host, creds, &self.salt.delkey(key)).await?;
        Ok(())
    }
}
