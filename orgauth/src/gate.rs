//! Permission gating: capability check combined with scope predicate.

use tracing::debug;

use crate::actor::{Actor, AgentRef};
use crate::capability::Capability;
use crate::error::AuthzError;
use crate::role::RoleHierarchy;
use crate::scope::{Scope, ScopeResolver};

/// Per-item outcome of a bulk authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    /// The target this outcome is about
    pub target_id: String,
    /// Whether the target passed the scope predicate
    pub allowed: bool,
}

/// Authorizes single actions and bulk batches.
///
/// A gate decision is capability membership first, then the recomputed scope
/// predicate; a target outside the predicate is denied even when the
/// capability is held.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionGate {
    hierarchy: RoleHierarchy,
    resolver: ScopeResolver,
}

impl PermissionGate {
    /// Create a gate.
    pub fn new() -> Self {
        Self {
            hierarchy: RoleHierarchy::new(),
            resolver: ScopeResolver::new(),
        }
    }

    /// The scope resolver behind this gate.
    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    /// The role hierarchy behind this gate.
    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Authorize one action against one target.
    pub fn authorize(
        &self,
        actor: &Actor,
        capability: Capability,
        scope: Scope,
        target: &AgentRef,
    ) -> Result<(), AuthzError> {
        self.check_capability(actor, capability)?;

        let predicate = self.resolver.resolve_predicate(actor, scope)?;
        if !predicate.matches(target) {
            debug!(
                actor_id = %actor.id,
                target_id = %target.id,
                scope = %scope,
                "authorization denied: target outside scope"
            );
            return Err(AuthzError::OutOfScope { scope });
        }
        Ok(())
    }

    /// Authorize an action with no specific target (intake, import).
    pub fn authorize_action(
        &self,
        actor: &Actor,
        capability: Capability,
    ) -> Result<(), AuthzError> {
        self.check_capability(actor, capability)
    }

    /// Authorize a batch, returning a per-item outcome list.
    ///
    /// A missing capability or unavailable scope fails the whole batch; an
    /// out-of-scope target fails only its own item. No partial silent drops:
    /// callers learn exactly which ids were rejected.
    pub fn authorize_bulk(
        &self,
        actor: &Actor,
        capability: Capability,
        scope: Scope,
        targets: &[AgentRef],
    ) -> Result<Vec<BulkOutcome>, AuthzError> {
        self.check_capability(actor, capability)?;
        let predicate = self.resolver.resolve_predicate(actor, scope)?;

        Ok(targets
            .iter()
            .map(|target| BulkOutcome {
                target_id: target.id.clone(),
                allowed: predicate.matches(target),
            })
            .collect())
    }

    fn check_capability(&self, actor: &Actor, capability: Capability) -> Result<(), AuthzError> {
        if !self.hierarchy.has_permission(actor, capability) {
            // The capability goes to the log, never into the error surface.
            debug!(
                actor_id = %actor.id,
                capability = ?capability,
                "authorization denied: missing capability"
            );
            return Err(AuthzError::Forbidden);
        }
        Ok(())
    }
}
