//! GrainEngine: readiness gate -> reconciler -> optional convergence.
//!
//! Each call is sequential and stateless. The engine holds only the
//! read-only credentials and its collaborators.

use crate::converge::ConvergenceTrigger;
use crate::list::{ListDiff, ListReconciler};
use crate::scalar::ScalarReconciler;
use saltgrain_core::{Credentials, DesiredState, GrainValue, Host, Identity, Result, SaltCall};
use saltgrain_remote::{Inventory, ReadinessGate, RemoteShell};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of running `state.apply` after a mutation. A failure is a warning
/// attached to an otherwise successful operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConvergenceReport {
    Completed { log: String },
    Failed { message: String },
}

impl ConvergenceReport {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub identity: Identity,
    /// The caller-visible value after the operation. For reads this is what
    /// the host reported.
    pub value: GrainValue,
    /// Appends and removals made by a list update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ListDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceReport>,
}

pub struct GrainEngine {
    creds: Arc<Credentials>,
    gate: ReadinessGate,
    scalar: ScalarReconciler,
    list: ListReconciler,
    trigger: ConvergenceTrigger,
}

impl GrainEngine {
    pub fn new(
        shell: Arc<dyn RemoteShell>,
        inventory: Arc<dyn Inventory>,
        creds: Arc<Credentials>,
    ) -> Self {
        let salt = SaltCall::new();
        Self {
            creds,
            gate: ReadinessGate::new(inventory),
            scalar: ScalarReconciler::new(shell.clone(), salt.clone()),
            list: ListReconciler::new(shell.clone(), salt.clone()),
            trigger: ConvergenceTrigger::new(shell, salt),
        }
    }

    pub fn with_gate(mut self, gate: ReadinessGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_trigger(mut self, trigger: ConvergenceTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub async fn wait_ready(&self, host: &Host) -> Result<()> {
        self.gate.wait_until_ready(host).await
    }

    pub async fn create(&self, desired: &DesiredState) -> Result<Outcome> {
        self.wait_ready(&desired.host).await?;
        let (host, key, creds) = (&desired.host, &desired.key, self.creds.as_ref());

        match &desired.value {
            GrainValue::Scalar(value) => self.scalar.create(host, creds, key, value).await?,
            GrainValue::List(items) => self.list.create(host, creds, key, items).await?,
        }
        info!("created {}", desired.identity());

        Ok(self.finish(desired, None).await)
    }

    /// Replace the desired value with what the host reports. The variant of
    /// `desired.value` picks scalar or list decoding.
    pub async fn read(&self, desired: &DesiredState) -> Result<Outcome> {
        self.wait_ready(&desired.host).await?;
        let (host, key, creds) = (&desired.host, &desired.key, self.creds.as_ref());

        let value = match &desired.value {
            GrainValue::Scalar(_) => GrainValue::Scalar(self.scalar.read(host, creds, key).await?),
            GrainValue::List(_) => GrainValue::List(self.list.read(host, creds, key).await?),
        };

        Ok(Outcome {
            identity: desired.identity(),
            value,
            changes: None,
            convergence: None,
        })
    }

    pub async fn update(&self, desired: &DesiredState) -> Result<Outcome> {
        self.wait_ready(&desired.host).await?;
        let (host, key, creds) = (&desired.host, &desired.key, self.creds.as_ref());

        let changes = match &desired.value {
            GrainValue::Scalar(value) => {
                self.scalar.update(host, creds, key, value).await?;
                None
            }
            GrainValue::List(items) => Some(self.list.update(host, creds, key, items).await?),
        };
        info!("updated {}", desired.identity());

        Ok(self.finish(desired, changes).await)
    }

    pub async fn delete(&self, desired: &DesiredState) -> Result<Outcome> {
        self.wait_ready(&desired.host).await?;
        let (host, key, creds) = (&desired.host, &desired.key, self.creds.as_ref());

        match &desired.value {
            GrainValue::Scalar(_) => self.scalar.delete(host, creds, key).await?,
            GrainValue::List(items) => self.list.delete(host, creds, key, items).await?,
        }
        info!("deleted {}", desired.identity());

        Ok(self.finish(desired, None).await)
    }

    async fn finish(&self, desired: &DesiredState, changes: Option<ListDiff>) -> Outcome {
        let convergence = if desired.apply {
            Some(self.converge(&desired.host).await)
        } else {
            None
        };
        Outcome {
            identity: desired.identity(),
            value: desired.value.clone(),
            changes,
            convergence,
        }
    }

    async fn converge(&self, host: &Host) -> ConvergenceReport {
        match self.trigger.converge(host, &self.creds).await {
            Ok(log) => ConvergenceReport::Completed { log },
            Err(e) => {
                warn!("apply state on {} failed: {}", host, e);
                ConvergenceReport::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}
