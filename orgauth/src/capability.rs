//! Capability token definitions.
//!
//! Capabilities are a closed sum type rather than free-form strings so that
//! permission checks get compile-time exhaustiveness. Serde names match the
//! flattened capability list attached to sessions by the serving layer.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// An opaque named grant checked via set membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    // ========== Lead operations ==========
    /// See leads assigned to the actor
    ViewAssignedLeads,
    /// Create leads by intake
    CreateLeads,
    /// Edit lead contact/requirement fields
    EditLeads,
    /// Delete leads
    DeleteLeads,
    /// Move leads through the funnel
    UpdateLeadStatus,
    /// See leads assigned to direct reports
    ViewTeamLeads,

    // ========== Agent operations ==========
    /// See agents within the actor's branch
    ViewBranchAgents,
    /// Manage team membership
    ManageTeamMembers,
    /// Create agent accounts
    CreateAgents,
    /// Edit agents within the actor's team
    EditTeamAgents,
    /// Delete agent accounts
    DeleteAgents,

    // ========== Analytics ==========
    /// Team performance dashboards
    ViewTeamPerformance,
    /// Branch-level analytics
    ViewBranchAnalytics,
    /// Region-level data
    ViewRegionalData,
    /// Company-wide analytics
    CompanyAnalytics,

    // ========== Administration ==========
    /// Bulk lead operations
    BulkOperations,
    /// Spreadsheet import/export
    ImportExportData,
    /// Create/edit/delete roles
    ManageRoles,
    /// System settings
    SystemSettings,
}

impl Capability {
    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ViewAssignedLeads => "View leads assigned to you",
            Self::CreateLeads => "Create new leads",
            Self::EditLeads => "Edit lead details",
            Self::DeleteLeads => "Delete leads",
            Self::UpdateLeadStatus => "Move leads through the funnel",
            Self::ViewTeamLeads => "View leads assigned to your team",
            Self::ViewBranchAgents => "View agents in your branch",
            Self::ManageTeamMembers => "Manage team membership",
            Self::CreateAgents => "Create agent accounts",
            Self::EditTeamAgents => "Edit agents in your team",
            Self::DeleteAgents => "Delete agent accounts",
            Self::ViewTeamPerformance => "View team performance",
            Self::ViewBranchAnalytics => "View branch analytics",
            Self::ViewRegionalData => "View regional data",
            Self::CompanyAnalytics => "View company-wide analytics",
            Self::BulkOperations => "Run bulk operations",
            Self::ImportExportData => "Import and export data",
            Self::ManageRoles => "Manage roles",
            Self::SystemSettings => "Change system settings",
        }
    }

    /// All capabilities as a list.
    pub fn all() -> Vec<Self> {
        vec![
            Self::ViewAssignedLeads,
            Self::CreateLeads,
            Self::EditLeads,
            Self::DeleteLeads,
            Self::UpdateLeadStatus,
            Self::ViewTeamLeads,
            Self::ViewBranchAgents,
            Self::ManageTeamMembers,
            Self::CreateAgents,
            Self::EditTeamAgents,
            Self::DeleteAgents,
            Self::ViewTeamPerformance,
            Self::ViewBranchAnalytics,
            Self::ViewRegionalData,
            Self::CompanyAnalytics,
            Self::BulkOperations,
            Self::ImportExportData,
            Self::ManageRoles,
            Self::SystemSettings,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_serialization() {
        let cap = Capability::UpdateLeadStatus;
        let json = serde_json::to_string(&cap).unwrap();
        assert_eq!(json, "\"UPDATE_LEAD_STATUS\"");

        let parsed: Capability = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cap);
    }

    #[test]
    fn test_all_capabilities() {
        let all = Capability::all();
        assert_eq!(all.len(), 19);
        assert!(all.contains(&Capability::ManageRoles));
    }
}
