//! Core types for Saltgrain

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Network address of a managed host (minion) - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Host(Arc<str>);

impl Host {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Host {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Host {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Namespaced grain name, e.g. `roles` or `app:release`
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrainKey(Arc<str>);

impl GrainKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GrainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GrainKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for GrainKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Value of a grain. Lists are membership sets: order and duplicates carry
/// no meaning when comparing desired against live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GrainValue {
    Scalar(String),
    List(Vec<String>),
}

impl GrainValue {
    pub fn scalar(s: impl Into<String>) -> Self {
        Self::Scalar(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Scalar(_) => None,
        }
    }

    /// Set equality for lists, string equality for scalars.
    pub fn same_members(&self, other: &GrainValue) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
            }
            _ => false,
        }
    }
}

/// SSH principal and private key material. Read-only once built; shared
/// between operations behind an `Arc`.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    private_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            private_key: private_key.into(),
        }
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Login for the fleet-inventory service.
#[derive(Clone)]
pub struct InventoryCredentials {
    pub base_url: String,
    pub login: String,
    password: String,
}

impl InventoryCredentials {
    pub fn new(
        base_url: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            login: login.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for InventoryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryCredentials")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What the caller wants a grain to look like on a host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    pub host: Host,
    pub key: GrainKey,
    pub value: GrainValue,
    #[serde(default)]
    pub apply: bool,
}

impl DesiredState {
    pub fn new(host: impl Into<Host>, key: impl Into<GrainKey>, value: GrainValue) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            value,
            apply: false,
        }
    }

    pub fn with_apply(mut self, apply: bool) -> Self {
        self.apply = apply;
        self
    }

    pub fn identity(&self) -> Identity {
        Identity::new(&self.host, &self.key)
    }
}

/// `"{host}-{key}"` correlation label handed back to the caller.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(host: &Host, key: &GrainKey) -> Self {
        Self(format!("{}-{}", host, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
