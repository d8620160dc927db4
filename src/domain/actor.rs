//! Requesting identities and the capabilities they carry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::DomainError;

/// A blanket permission checked once per bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ChangeFigure,
    DeleteFigure,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ChangeFigure => "change_figure",
            Capability::DeleteFigure => "delete_figure",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    MonitoringExpert,
    RegionalCoordinator,
    Guest,
}

impl UserRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(UserRole::Admin),
            "monitoring_expert" => Some(UserRole::MonitoringExpert),
            "regional_coordinator" => Some(UserRole::RegionalCoordinator),
            "guest" => Some(UserRole::Guest),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::MonitoringExpert => "monitoring_expert",
            UserRole::RegionalCoordinator => "regional_coordinator",
            UserRole::Guest => "guest",
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            UserRole::Admin => &[Capability::ChangeFigure, Capability::DeleteFigure],
            UserRole::MonitoringExpert | UserRole::RegionalCoordinator => {
                &[Capability::ChangeFigure]
            }
            UserRole::Guest => &[],
        }
    }
}

/// The user an operation runs as. Passed explicitly to every per-record mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub username: String,
    pub role: UserRole,
}

impl Actor {
    pub fn has_permission(&self, capability: Capability) -> bool {
        self.role.capabilities().contains(&capability)
    }
}

/// Resolves stored user references into actors.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve by primary key. `DomainError::NotFound` when the user is gone.
    async fn resolve(&self, user_id: i32) -> Result<Actor, DomainError>;

    /// Resolve by login name, as carried in a bearer token.
    async fn resolve_username(&self, username: &str) -> Result<Actor, DomainError>;
}
