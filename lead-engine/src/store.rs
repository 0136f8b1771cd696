//! Injected persistence collaborators.
//!
//! The engine performs no blocking I/O itself; stores are clean abstractions
//! over whatever the embedder persists with. The in-memory implementations
//! here back the tests and small deployments.

use async_trait::async_trait;
use dashmap::DashMap;

use funnel::Lead;
use orgauth::{Actor, AgentRef, Role, ScopePredicate};

/// Error types for store operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Entity does not exist
    #[error("entity '{0}' not found")]
    NotFound(String),

    /// An expected-version commit lost to a concurrent write
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    /// Store unreachable or otherwise faulted
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for leads and the agent org-unit directory.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Load a lead with its current version.
    async fn get_lead(&self, id: &str) -> Result<Lead, StoreError>;

    /// Insert a fresh lead. Fails if the id already exists.
    async fn insert_lead(&self, lead: Lead) -> Result<Lead, StoreError>;

    /// Commit a lead iff the stored version equals `expected_version`.
    ///
    /// On success the stored version becomes `expected_version + 1`.
    async fn save_lead(&self, lead: Lead, expected_version: u64) -> Result<Lead, StoreError>;

    /// Leads whose assignee falls inside the predicate.
    async fn query_leads(&self, predicate: &ScopePredicate) -> Result<Vec<Lead>, StoreError>;

    /// Org-unit view of an agent.
    async fn get_agent_ref(&self, agent_id: &str) -> Result<AgentRef, StoreError>;
}

/// Persistence for roles and actor resolution.
///
/// Role writes serialize per-record with last-writer-wins; edits to
/// different roles are independent.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Load a role.
    async fn get_role(&self, id: &str) -> Result<Role, StoreError>;

    /// All roles.
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    /// Upsert a role record.
    async fn save_role(&self, role: Role) -> Result<Role, StoreError>;

    /// Delete a role record.
    async fn delete_role(&self, id: &str) -> Result<(), StoreError>;

    /// Load an actor with org-unit closure resolved.
    async fn get_actor(&self, id: &str) -> Result<Actor, StoreError>;
}

/// In-memory lead store.
#[derive(Debug, Default)]
pub struct MemoryLeadStore {
    leads: DashMap<String, Lead>,
    agents: DashMap<String, AgentRef>,
}

impl MemoryLeadStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent's org-unit view.
    pub fn register_agent(&self, agent: AgentRef) {
        self.agents.insert(agent.id.clone(), agent);
    }

    /// Number of stored leads.
    pub fn len(&self) -> usize {
        self.leads.len()
    }

    /// Whether the store holds no leads.
    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn get_lead(&self, id: &str) -> Result<Lead, StoreError> {
        self.leads
            .get(id)
            .map(|l| l.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn insert_lead(&self, lead: Lead) -> Result<Lead, StoreError> {
        match self.leads.entry(lead.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::Unavailable(format!(
                "lead '{}' already exists",
                lead.id
            ))),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(lead.clone());
                Ok(lead)
            },
        }
    }

    async fn save_lead(&self, mut lead: Lead, expected_version: u64) -> Result<Lead, StoreError> {
        match self.leads.entry(lead.id.clone()) {
            dashmap::mapref::entry::Entry::Vacant(_) => {
                Err(StoreError::NotFound(lead.id.clone()))
            },
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                let actual = entry.get().version;
                if actual != expected_version {
                    return Err(StoreError::VersionConflict {
                        expected: expected_version,
                        actual,
                    });
                }
                lead.version = expected_version + 1;
                entry.insert(lead.clone());
                Ok(lead)
            },
        }
    }

    async fn query_leads(&self, predicate: &ScopePredicate) -> Result<Vec<Lead>, StoreError> {
        let mut matched: Vec<Lead> = self
            .leads
            .iter()
            .filter(|entry| match &entry.assigned_agent {
                Some(agent_id) => self
                    .agents
                    .get(agent_id)
                    .map(|agent| predicate.matches(&agent))
                    .unwrap_or(false),
                None => predicate.matches_unassigned(),
            })
            .map(|entry| entry.clone())
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matched)
    }

    async fn get_agent_ref(&self, agent_id: &str) -> Result<AgentRef, StoreError> {
        self.agents
            .get(agent_id)
            .map(|a| a.clone())
            .ok_or_else(|| StoreError::NotFound(agent_id.to_string()))
    }
}

/// In-memory role store.
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    roles: DashMap<String, Role>,
    actors: DashMap<String, Actor>,
}

impl MemoryRoleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor with its org-unit closure resolved.
    pub fn register_actor(&self, actor: Actor) {
        self.actors.insert(actor.id.clone(), actor);
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn get_role(&self, id: &str) -> Result<Role, StoreError> {
        self.roles
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        Ok(self.roles.iter().map(|r| r.clone()).collect())
    }

    async fn save_role(&self, role: Role) -> Result<Role, StoreError> {
        // Entry holds the shard lock for the record, so concurrent saves of
        // the same role serialize; last writer wins.
        self.roles.insert(role.id.clone(), role.clone());
        Ok(role)
    }

    async fn delete_role(&self, id: &str) -> Result<(), StoreError> {
        self.roles
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get_actor(&self, id: &str) -> Result<Actor, StoreError> {
        self.actors
            .get(id)
            .map(|a| a.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
