//! Roles and the management ordering between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::actor::Actor;
use crate::capability::Capability;

/// Rank of a role.
///
/// Numbered levels form a total order; `Admin` and `Founder` are the two
/// reserved top ranks that outrank every numbered level. Rank is the sole
/// basis for management comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RoleRank {
    /// Numbered level, 1 and up
    Level(u8),
    /// Reserved top rank below founder
    Admin,
    /// Reserved topmost rank
    Founder,
}

impl RoleRank {
    /// Comparable precedence value (higher = more authority).
    fn precedence(&self) -> u16 {
        match self {
            Self::Level(n) => u16::from(*n),
            Self::Admin => u16::MAX - 1,
            Self::Founder => u16::MAX,
        }
    }

    /// Whether this is one of the two reserved top ranks.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Admin | Self::Founder)
    }

    /// Numbered level, if this rank is numbered.
    pub fn level(&self) -> Option<u8> {
        match self {
            Self::Level(n) => Some(*n),
            _ => None,
        }
    }
}

impl PartialOrd for RoleRank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoleRank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.precedence().cmp(&other.precedence())
    }
}

/// Errors from role construction and mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoleError {
    /// Roles must carry at least one capability
    #[error("role '{name}' has an empty permission set")]
    EmptyPermissionSet { name: String },
}

/// A named role with a rank and a permission set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Unique identifier
    pub id: String,
    /// Role name
    pub name: String,
    /// Rank in the hierarchy
    pub rank: RoleRank,
    /// Capability grants
    pub permissions: HashSet<Capability>,
    /// Description
    pub description: String,
    /// When the role was created
    pub created_at: DateTime<Utc>,
    /// When the role was last edited
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Create a role, enforcing the non-empty permission set invariant.
    pub fn new(
        name: impl Into<String>,
        rank: RoleRank,
        permissions: HashSet<Capability>,
        description: impl Into<String>,
    ) -> Result<Self, RoleError> {
        let name = name.into();
        if permissions.is_empty() {
            return Err(RoleError::EmptyPermissionSet { name });
        }
        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            rank,
            permissions,
            description: description.into(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Membership and management checks over roles and actors.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleHierarchy;

impl RoleHierarchy {
    /// Create the hierarchy.
    pub fn new() -> Self {
        Self
    }

    /// Whether the actor holds `capability`.
    pub fn has_permission(&self, actor: &Actor, capability: Capability) -> bool {
        actor.effective_permissions.contains(&capability)
    }

    /// Whether the actor holds any of `capabilities`.
    pub fn has_any(&self, actor: &Actor, capabilities: &[Capability]) -> bool {
        capabilities
            .iter()
            .any(|c| actor.effective_permissions.contains(c))
    }

    /// Whether the actor holds all of `capabilities`.
    pub fn has_all(&self, actor: &Actor, capabilities: &[Capability]) -> bool {
        capabilities
            .iter()
            .all(|c| actor.effective_permissions.contains(c))
    }

    /// Whether `actor_rank` may create/edit/delete a role of `target_rank`.
    ///
    /// Strictly-greater rank only. Equal ranks can never manage each other
    /// (this blocks lateral privilege edits): not symmetric, not reflexive.
    /// Callers mutating role records must re-check this at commit time, not
    /// only when the action was offered, because ranks can change between
    /// read and write.
    pub fn can_manage(&self, actor_rank: RoleRank, target_rank: RoleRank) -> bool {
        actor_rank > target_rank
    }
}
