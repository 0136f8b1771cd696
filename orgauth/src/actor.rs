//! Actors and their org-unit position.
//!
//! The ambient "current user" of the original system becomes explicit here:
//! every authorization-aware operation takes the actor as an argument, never
//! an implicit/global lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::capability::Capability;
use crate::role::RoleRank;

/// An authenticated principal with resolved org-unit membership.
///
/// `direct_reports` is the transitive closure of reports ("team"); the store
/// resolves it before handing the actor to this crate. Effective permissions
/// are the role's permissions with additive overrides already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Unique identifier (also the agent id leads are assigned to)
    pub id: String,
    /// Role the actor holds
    pub role_id: String,
    /// Rank of that role
    pub rank: RoleRank,
    /// Flattened capability set (role permissions + additive overrides)
    pub effective_permissions: HashSet<Capability>,
    /// Branch the actor belongs to
    pub branch_id: String,
    /// Region the branch belongs to
    pub region_id: String,
    /// Transitive direct-report closure
    pub direct_reports: HashSet<String>,
}

impl Actor {
    /// Create an actor with no reports.
    pub fn new(
        id: impl Into<String>,
        role_id: impl Into<String>,
        rank: RoleRank,
        effective_permissions: HashSet<Capability>,
        branch_id: impl Into<String>,
        region_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role_id: role_id.into(),
            rank,
            effective_permissions,
            branch_id: branch_id.into(),
            region_id: region_id.into(),
            direct_reports: HashSet::new(),
        }
    }

    /// Set the direct-report closure.
    pub fn with_reports(mut self, reports: impl IntoIterator<Item = String>) -> Self {
        self.direct_reports = reports.into_iter().collect();
        self
    }

    /// Grant an additional capability on top of the role's set.
    pub fn with_override(mut self, capability: Capability) -> Self {
        self.effective_permissions.insert(capability);
        self
    }

    /// The actor's own view as an assignee.
    pub fn as_agent_ref(&self) -> AgentRef {
        AgentRef {
            id: self.id.clone(),
            branch_id: self.branch_id.clone(),
            region_id: self.region_id.clone(),
        }
    }
}

/// Org-unit view of an agent, used as the target of scope predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AgentRef {
    /// Agent id
    pub id: String,
    /// Branch the agent belongs to
    pub branch_id: String,
    /// Region the branch belongs to
    pub region_id: String,
}

impl AgentRef {
    /// Create an agent reference.
    pub fn new(
        id: impl Into<String>,
        branch_id: impl Into<String>,
        region_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            branch_id: branch_id.into(),
            region_id: region_id.into(),
        }
    }
}
