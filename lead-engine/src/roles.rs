//! Role administration.
//!
//! Every mutation re-checks rank authority against the freshly loaded
//! target at commit time, so a stale management console cannot promote or
//! delete past the actor's own rank.

use std::sync::Arc;

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info};

use orgauth::{Actor, AuthzError, Capability, Role, RoleHierarchy, RoleRank};

use crate::error::{EngineError, Result};
use crate::store::RoleStore;

/// Requested changes to an existing role. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    /// New display name
    pub name: Option<String>,
    /// New rank
    pub rank: Option<RoleRank>,
    /// Replacement permission set
    pub permissions: Option<HashSet<Capability>>,
    /// New description
    pub description: Option<String>,
}

/// Administers the role catalog under rank authority rules.
pub struct RoleAdmin {
    role_store: Arc<dyn RoleStore>,
    hierarchy: RoleHierarchy,
}

impl RoleAdmin {
    /// Create a role admin over the given store.
    pub fn new(role_store: Arc<dyn RoleStore>) -> Self {
        Self {
            role_store,
            hierarchy: RoleHierarchy::new(),
        }
    }

    /// Create a new role below the actor's own rank.
    pub async fn create_role(
        &self,
        actor: &Actor,
        name: impl Into<String>,
        rank: RoleRank,
        permissions: HashSet<Capability>,
        description: impl Into<String>,
    ) -> Result<Role> {
        self.check_manage(actor, rank)?;

        let role = Role::new(name, rank, permissions, description)?;
        let saved = self.role_store.save_role(role).await?;
        info!(role_id = %saved.id, role_name = %saved.name, actor_id = %actor.id, "role created");
        Ok(saved)
    }

    /// Apply an update to an existing role.
    ///
    /// Authority is checked against the target's current rank, and again
    /// against the new rank when the update changes it.
    pub async fn update_role(&self, actor: &Actor, role_id: &str, update: RoleUpdate) -> Result<Role> {
        let mut role = self.role_store.get_role(role_id).await?;
        self.check_manage(actor, role.rank)?;

        if let Some(rank) = update.rank {
            self.check_manage(actor, rank)?;
            role.rank = rank;
        }
        if let Some(name) = update.name {
            role.name = name;
        }
        if let Some(permissions) = update.permissions {
            if permissions.is_empty() {
                return Err(orgauth::RoleError::EmptyPermissionSet {
                    name: role.name.clone(),
                }
                .into());
            }
            role.permissions = permissions;
        }
        if let Some(description) = update.description {
            role.description = description;
        }
        role.updated_at = Utc::now();

        let saved = self.role_store.save_role(role).await?;
        info!(role_id = %saved.id, actor_id = %actor.id, "role updated");
        Ok(saved)
    }

    /// Delete a role.
    pub async fn delete_role(&self, actor: &Actor, role_id: &str) -> Result<()> {
        let role = self.role_store.get_role(role_id).await?;
        self.check_manage(actor, role.rank)?;

        self.role_store.delete_role(role_id).await?;
        info!(role_id = %role_id, actor_id = %actor.id, "role deleted");
        Ok(())
    }

    /// All roles, visible to anyone holding `ManageRoles`.
    pub async fn list_roles(&self, actor: &Actor) -> Result<Vec<Role>> {
        if !self.hierarchy.has_permission(actor, Capability::ManageRoles) {
            debug!(actor_id = %actor.id, "role listing denied");
            return Err(AuthzError::Forbidden.into());
        }
        let mut roles = self.role_store.list_roles().await?;
        roles.sort_by(|a, b| b.rank.cmp(&a.rank).then_with(|| a.name.cmp(&b.name)));
        Ok(roles)
    }

    /// Capability plus rank-authority check for a mutation touching `rank`.
    fn check_manage(&self, actor: &Actor, rank: RoleRank) -> Result<()> {
        if !self.hierarchy.has_permission(actor, Capability::ManageRoles) {
            debug!(actor_id = %actor.id, "role mutation denied");
            return Err(AuthzError::Forbidden.into());
        }
        if !self.hierarchy.can_manage(actor.rank, rank) {
            debug!(actor_id = %actor.id, "rank not strictly above target");
            return Err(AuthzError::Forbidden.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRoleStore;

    fn admin_actor(rank: RoleRank) -> Actor {
        Actor::new(
            "actor-1",
            "role-admin",
            rank,
            [Capability::ManageRoles].into_iter().collect(),
            "branch-1",
            "region-1",
        )
    }

    fn caps(list: &[Capability]) -> HashSet<Capability> {
        list.iter().copied().collect()
    }

    fn admin() -> (Arc<MemoryRoleStore>, RoleAdmin) {
        let store = Arc::new(MemoryRoleStore::new());
        (store.clone(), RoleAdmin::new(store))
    }

    #[tokio::test]
    async fn test_create_below_own_rank() {
        let (_store, admin) = admin();
        let actor = admin_actor(RoleRank::Level(6));

        let role = admin
            .create_role(
                &actor,
                "Team Lead",
                RoleRank::Level(4),
                caps(&[Capability::ViewTeamLeads, Capability::ManageTeamMembers]),
                "Leads a sales team",
            )
            .await
            .unwrap();
        assert_eq!(role.rank, RoleRank::Level(4));
    }

    #[tokio::test]
    async fn test_cannot_create_at_or_above_own_rank() {
        let (_store, admin) = admin();
        let actor = admin_actor(RoleRank::Level(6));

        for rank in [RoleRank::Level(6), RoleRank::Level(7), RoleRank::Admin] {
            let err = admin
                .create_role(&actor, "Peer", rank, caps(&[Capability::EditLeads]), "")
                .await
                .unwrap_err();
            assert_eq!(err, EngineError::Authorization(AuthzError::Forbidden));
        }
    }

    #[tokio::test]
    async fn test_admin_cannot_mint_admin_or_founder() {
        let (_store, admin) = admin();
        let actor = admin_actor(RoleRank::Admin);

        for rank in [RoleRank::Admin, RoleRank::Founder] {
            let err = admin
                .create_role(&actor, "Top", rank, caps(&[Capability::SystemSettings]), "")
                .await
                .unwrap_err();
            assert_eq!(err, EngineError::Authorization(AuthzError::Forbidden));
        }
    }

    #[tokio::test]
    async fn test_missing_manage_roles_capability() {
        let (_store, admin) = admin();
        let mut actor = admin_actor(RoleRank::Founder);
        actor.effective_permissions = caps(&[Capability::EditLeads]);

        let err = admin
            .create_role(
                &actor,
                "Agent",
                RoleRank::Level(1),
                caps(&[Capability::ViewAssignedLeads]),
                "",
            )
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Authorization(AuthzError::Forbidden));
    }

    #[tokio::test]
    async fn test_update_rechecks_rank_at_commit() {
        let (store, admin) = admin();
        let founder = admin_actor(RoleRank::Founder);

        let role = admin
            .create_role(
                &founder,
                "Manager",
                RoleRank::Level(5),
                caps(&[Capability::ViewTeamLeads]),
                "",
            )
            .await
            .unwrap();

        // Someone else promotes the role to 7 behind this actor's back.
        let mut promoted = store.get_role(&role.id).await.unwrap();
        promoted.rank = RoleRank::Level(7);
        store.save_role(promoted).await.unwrap();

        // Level 6 actor working from a stale view of a level-5 role: the
        // commit-time check against the current rank (7) denies.
        let level6 = admin_actor(RoleRank::Level(6));
        let err = admin
            .update_role(
                &level6,
                &role.id,
                RoleUpdate {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Authorization(AuthzError::Forbidden));
    }

    #[tokio::test]
    async fn test_update_cannot_raise_above_own_rank() {
        let (_store, admin) = admin();
        let actor = admin_actor(RoleRank::Level(6));

        let role = admin
            .create_role(
                &actor,
                "Manager",
                RoleRank::Level(4),
                caps(&[Capability::ViewTeamLeads]),
                "",
            )
            .await
            .unwrap();

        let err = admin
            .update_role(
                &actor,
                &role.id,
                RoleUpdate {
                    rank: Some(RoleRank::Level(6)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Authorization(AuthzError::Forbidden));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_permission_set() {
        let (_store, admin) = admin();
        let actor = admin_actor(RoleRank::Founder);

        let role = admin
            .create_role(
                &actor,
                "Agent",
                RoleRank::Level(1),
                caps(&[Capability::ViewAssignedLeads]),
                "",
            )
            .await
            .unwrap();

        let err = admin
            .update_role(
                &actor,
                &role.id,
                RoleUpdate {
                    permissions: Some(HashSet::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Role(_)));
    }

    #[tokio::test]
    async fn test_delete_requires_authority_over_current_rank() {
        let (_store, admin) = admin();
        let founder = admin_actor(RoleRank::Founder);

        let role = admin
            .create_role(
                &founder,
                "Director",
                RoleRank::Level(8),
                caps(&[Capability::ViewRegionalData]),
                "",
            )
            .await
            .unwrap();

        let level6 = admin_actor(RoleRank::Level(6));
        let err = admin.delete_role(&level6, &role.id).await.unwrap_err();
        assert_eq!(err, EngineError::Authorization(AuthzError::Forbidden));

        admin.delete_role(&founder, &role.id).await.unwrap();
        let err = admin.delete_role(&founder, &role.id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_sorted_by_rank() {
        let (_store, admin) = admin();
        let founder = admin_actor(RoleRank::Founder);

        admin
            .create_role(
                &founder,
                "Agent",
                RoleRank::Level(1),
                caps(&[Capability::ViewAssignedLeads]),
                "",
            )
            .await
            .unwrap();
        admin
            .create_role(
                &founder,
                "Director",
                RoleRank::Level(8),
                caps(&[Capability::ViewRegionalData]),
                "",
            )
            .await
            .unwrap();

        let roles = admin.list_roles(&founder).await.unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].name, "Director");
        assert_eq!(roles[1].name, "Agent");
    }
}
