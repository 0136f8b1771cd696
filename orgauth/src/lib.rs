//! Hierarchical authorization for the lead funnel.
//!
//! Derives what an actor may see and change from role rank and org-unit
//! position:
//!
//! - [`Capability`]: closed set of permission tokens, checked by membership
//! - [`RoleHierarchy`]: permission checks and the strict "can manage" ordering
//! - [`ScopeResolver`]: rank-gated visibility scopes (`own` .. `all`) resolved
//!   into server-side predicates, never trusted from clients
//! - [`PermissionGate`]: capability check + scope predicate for one action or
//!   a bulk batch with per-item outcomes
//!
//! # Example
//!
//! ```
//! use std::collections::HashSet;
//! use orgauth::{Actor, Capability, PermissionGate, RoleRank, Scope};
//!
//! let actor = Actor::new(
//!     "agent-7",
//!     "role-telecaller",
//!     RoleRank::Level(2),
//!     [Capability::ViewAssignedLeads, Capability::UpdateLeadStatus]
//!         .into_iter()
//!         .collect::<HashSet<_>>(),
//!     "branch-pune",
//!     "region-west",
//! );
//!
//! let gate = PermissionGate::new();
//! assert!(gate
//!     .authorize(&actor, Capability::UpdateLeadStatus, Scope::Own, &actor.as_agent_ref())
//!     .is_ok());
//! ```

pub mod actor;
pub mod capability;
pub mod error;
pub mod gate;
pub mod role;
pub mod scope;

// Re-export main types
pub use actor::{Actor, AgentRef};
pub use capability::Capability;
pub use error::AuthzError;
pub use gate::{BulkOutcome, PermissionGate};
pub use role::{Role, RoleError, RoleHierarchy, RoleRank};
pub use scope::{
    Scope, ScopePredicate, ScopeResolver, BRANCH_MIN_LEVEL, REGION_MIN_LEVEL, TEAM_MIN_LEVEL,
};
