//! List-valued grains, treated as membership sets.
//!
//! Update repairs the live list towards the desired one in three phases:
//! append what is missing, re-read, then remove every live element that is
//! not anywhere in the desired list. A failed command aborts the remaining
//! steps; changes already made stay in place.

use saltgrain_core::{Credentials, GrainCodec, GrainKey, Host, Result, SaltCall};
use saltgrain_remote::RemoteShell;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ListReconciler {
    shell: Arc<dyn RemoteShell>,
    salt: SaltCall,
}

/// Elements appended and removed by an update, in command order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListDiff {
    pub appended: Vec<String>,
    pub removed: Vec<String>,
}

impl ListDiff {
    pub fn is_empty(&self) -> bool {
        self.appended.is_empty() && self.removed.is_empty()
    }
}

impl ListReconciler {
    pub fn new(shell: Arc<dyn RemoteShell>, salt: SaltCall) -> Self {
        Self { shell, salt }
    }

    /// Append every desired element, stopping at the first failure.
    pub async fn create(
        &self,
        host: &Host,
        creds: &Credentials,
        key: &GrainKey,
        desired: &[String],
    ) -> Result<()> {
        for value in desired {
            self.append(host, creds, key, value).await?;
        }
        Ok(())
    }

    /// The host's list; an absent grain reads as empty.
    pub async fn read(
        &self,
        host: &Host,
        creds: &Credentials,
        key: &GrainKey,
    ) -> Result<Vec<String>> {
        let raw = self.shell.run(host, creds, &self.salt.get(key)).await?;
        let live = GrainCodec::decode_list(&raw);
        debug!("{} on {} reads {:?}", key, host, live);
        Ok(live)
    }

    pub async fn update(
        &self,
        host: &Host,
        creds: &Credentials,
        key: &GrainKey,
        desired: &[String],
    ) -> Result<ListDiff> {
        let mut diff = ListDiff::default();

        let live = self.read(host, creds, key).await?;
        for value in desired {
            if live.contains(value) || diff.appended.contains(value) {
                continue;
            }
            self.append(host, creds, key, value).await?;
            diff.appended.push(value.clone());
        }

        let live = self.read(host, creds, key).await?;
        for value in &live {
            if desired.contains(value) {
                continue;
            }
            self.remove(host, creds, key, value).await?;
            diff.removed.push(value.clone());
        }

        info!(
            "{} on {}: appended {:?}, removed {:?}",
            key, host, diff.appended, diff.removed
        );
        Ok(diff)
    }

    /// Remove each element of `desired` (not of the live list).
    pub async fn delete(
        &self,
        host: &Host,
        creds: &Credentials,
        key: &GrainKey,
        desired: &[String],
    ) -> Result<()> {
        for value in desired {
            self.remove(host, creds, key, value).await?;
        }
        Ok(())
    }

    async fn append(
        &self,
        host: &Host,
        creds: &Credentials,
        key: &GrainKey,
        value: &str,
    ) -> Result<()> {
        let output = self.shell.run(host, creds, &self.salt.append(key, value)).await?;
        debug!("append {} to {}: {}", value, key, output.trim());
        Ok(())
    }

    async fn remove(
        &self,
        host: &Host,
        creds: &Credentials,
        key: &GrainKey,
        value: &str,
    ) -> Result<()> {
        let output = self.shell.run(host, creds, &self.salt.remove(key, value)).await?;
        debug!("remove {} from {}: {}", value, key, output.trim());
        Ok(())
    }
}
