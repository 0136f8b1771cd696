//! Authorization error types.

use crate::scope::Scope;

/// A forbidden operation.
///
/// Always surfaced distinctly from an empty result set, even when a UI
/// chooses to render both the same way. `Forbidden` deliberately does not
/// name the missing capability so callers cannot enumerate permissions by
/// probing; the gate logs the detail instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The actor lacks a required capability
    #[error("not authorized")]
    Forbidden,

    /// The requested scope is outside the actor's available scopes
    #[error("scope '{scope}' is not available to this actor")]
    ScopeUnavailable { scope: Scope },

    /// The target falls outside the resolved scope predicate
    #[error("target is outside the '{scope}' scope")]
    OutOfScope { scope: Scope },
}
