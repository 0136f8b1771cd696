//! Visibility scopes derived from rank and org-unit position.
//!
//! A scope token is never trusted from a client; the predicate is always
//! recomputed server-side from the actor's identity.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::actor::{Actor, AgentRef};
use crate::error::AuthzError;
use crate::role::RoleRank;

/// Minimum numbered level that unlocks the team scope.
pub const TEAM_MIN_LEVEL: u8 = 4;
/// Minimum numbered level that unlocks the branch scope.
pub const BRANCH_MIN_LEVEL: u8 = 6;
/// Minimum numbered level that unlocks the region scope.
pub const REGION_MIN_LEVEL: u8 = 8;

/// The subset of organizational data visible to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Leads assigned to the actor
    Own,
    /// Actor plus transitive direct reports
    Team,
    /// Everyone in the actor's branch
    Branch,
    /// Everyone in the actor's region
    Region,
    /// No filter (reserved ranks only)
    All,
}

impl Scope {
    /// String representation matching the serde wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Own => "own",
            Self::Team => "team",
            Self::Branch => "branch",
            Self::Region => "region",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recomputed visibility predicate, evaluated against an assignee.
///
/// The variants capture the actor's data at resolution time so evaluation
/// needs nothing but the target's org-unit view.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopePredicate {
    /// `assigned_to == actor.id`
    Own(String),
    /// `assigned_to ∈ reports ∪ {actor.id}`
    Team(HashSet<String>),
    /// `branch(assigned_to) == actor.branch`
    Branch(String),
    /// `region(assigned_to) == actor.region`
    Region(String),
    /// No filter
    All,
}

impl ScopePredicate {
    /// Whether an assigned agent falls inside the predicate.
    pub fn matches(&self, agent: &AgentRef) -> bool {
        match self {
            Self::Own(id) => agent.id == *id,
            Self::Team(members) => members.contains(&agent.id),
            Self::Branch(branch_id) => agent.branch_id == *branch_id,
            Self::Region(region_id) => agent.region_id == *region_id,
            Self::All => true,
        }
    }

    /// Whether an unassigned lead falls inside the predicate.
    ///
    /// Unassigned leads are visible only with no filter.
    pub fn matches_unassigned(&self) -> bool {
        matches!(self, Self::All)
    }

    /// The scope this predicate was resolved for.
    pub fn scope(&self) -> Scope {
        match self {
            Self::Own(_) => Scope::Own,
            Self::Team(_) => Scope::Team,
            Self::Branch(_) => Scope::Branch,
            Self::Region(_) => Scope::Region,
            Self::All => Scope::All,
        }
    }
}

/// Derives visibility predicates from actor rank and org-unit position.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeResolver;

impl ScopeResolver {
    /// Create the resolver.
    pub fn new() -> Self {
        Self
    }

    /// The scopes an actor may request, gated by rank.
    ///
    /// Monotonically non-decreasing in level; the reserved top ranks get
    /// everything including the unfiltered scope.
    pub fn available_scopes(&self, actor: &Actor) -> Vec<Scope> {
        match actor.rank {
            RoleRank::Admin | RoleRank::Founder => vec![
                Scope::Own,
                Scope::Team,
                Scope::Branch,
                Scope::Region,
                Scope::All,
            ],
            RoleRank::Level(level) => {
                let mut scopes = vec![Scope::Own];
                if level >= TEAM_MIN_LEVEL {
                    scopes.push(Scope::Team);
                }
                if level >= BRANCH_MIN_LEVEL {
                    scopes.push(Scope::Branch);
                }
                if level >= REGION_MIN_LEVEL {
                    scopes.push(Scope::Region);
                }
                scopes
            },
        }
    }

    /// Resolve `scope` into a predicate for `actor`.
    ///
    /// Requesting a scope outside [`Self::available_scopes`] is an
    /// authorization error, never a silently-empty result.
    pub fn resolve_predicate(
        &self,
        actor: &Actor,
        scope: Scope,
    ) -> Result<ScopePredicate, AuthzError> {
        if !self.available_scopes(actor).contains(&scope) {
            return Err(AuthzError::ScopeUnavailable { scope });
        }

        Ok(match scope {
            Scope::Own => ScopePredicate::Own(actor.id.clone()),
            Scope::Team => {
                let mut members = actor.direct_reports.clone();
                members.insert(actor.id.clone());
                ScopePredicate::Team(members)
            },
            Scope::Branch => ScopePredicate::Branch(actor.branch_id.clone()),
            Scope::Region => ScopePredicate::Region(actor.region_id.clone()),
            Scope::All => ScopePredicate::All,
        })
    }

    /// The widest scope available to the actor.
    pub fn widest_scope(&self, actor: &Actor) -> Scope {
        self.available_scopes(actor)
            .last()
            .copied()
            .unwrap_or(Scope::Own)
    }
}
