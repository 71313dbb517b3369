//! Server identity: the token that ties persisted files to one installation.

use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Stable identifier of one server installation's persistent state.
///
/// Results files carry the identity they were written under. A file whose
/// identity differs from the current one came from another installation
/// (or from before a restore) and must not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerIdentity(String);

impl ServerIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Server-wide settings exposed by the host.
///
/// Queried on every store operation, so an implementation may change its
/// answer over the life of the process.
pub trait ServerSettings {
    fn server_identity(&self) -> ServerIdentity;
}

/// [`ServerSettings`] backed by a value held in memory.
#[derive(Debug)]
pub struct StaticServerSettings {
    identity: RwLock<ServerIdentity>,
}

impl StaticServerSettings {
    pub fn new(identity: impl Into<ServerIdentity>) -> Self {
        Self {
            identity: RwLock::new(identity.into()),
        }
    }

    /// Replace the identity, e.g. after the host reports a restored backup.
    pub fn set_identity(&self, identity: impl Into<ServerIdentity>) {
        let mut guard = self
            .identity
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = identity.into();
    }
}

impl ServerSettings for StaticServerSettings {
    fn server_identity(&self) -> ServerIdentity {
        self.identity
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl<T: ServerSettings + ?Sized> ServerSettings for &T {
    fn server_identity(&self) -> ServerIdentity {
        (**self).server_identity()
    }
}

impl<T: ServerSettings + ?Sized> ServerSettings for std::sync::Arc<T> {
    fn server_identity(&self) -> ServerIdentity {
        (**self).server_identity()
    }
}
