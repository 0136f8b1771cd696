//! Status catalog lookups.
//!
//! The status / sub-status / required-field table is a versioned contract:
//! every serving layer and every consumer fetches it from this one source
//! instead of hardcoding a copy. `StatusRegistry` is a pure, total, stateless
//! lookup over a [`StatusCatalog`]; unknown or unlisted statuses never panic,
//! they return empty sets so callers degrade gracefully.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::types::{FieldId, LeadStatus, SubStatus};

/// Catalog version shipped with this crate's builtin table.
pub const BUILTIN_CATALOG_VERSION: &str = "2024.1";

/// Catalog entry for one status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Allowed sub-statuses, in display order
    #[serde(default)]
    pub sub_statuses: Vec<SubStatus>,
    /// Fields that must be present to enter this status
    #[serde(default)]
    pub required_fields: Vec<FieldId>,
}

/// The versioned status/sub-status/required-field table.
///
/// Serde data, loadable from YAML so deployments can evolve sub-status sets
/// without a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCatalog {
    /// Contract version, bumped on any table change
    pub version: String,
    /// Per-status entries; statuses absent here have no sub-classification
    /// and no required fields
    pub entries: HashMap<LeadStatus, StatusEntry>,
}

impl StatusCatalog {
    /// The builtin reference catalog.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();

        entries.insert(
            LeadStatus::Callback,
            StatusEntry {
                sub_statuses: subs(&["interested", "not_reachable", "busy", "follow_up"]),
                required_fields: vec![],
            },
        );
        entries.insert(
            LeadStatus::ScheduleMeeting,
            StatusEntry {
                sub_statuses: subs(&["scheduled", "rescheduled", "completed", "no_show"]),
                required_fields: vec![FieldId::ScheduleDate],
            },
        );
        entries.insert(
            LeadStatus::ScheduleSiteVisit,
            StatusEntry {
                sub_statuses: subs(&["scheduled", "rescheduled", "completed", "no_show"]),
                required_fields: vec![FieldId::ScheduleDate],
            },
        );
        entries.insert(
            LeadStatus::Book,
            StatusEntry {
                sub_statuses: vec![],
                required_fields: vec![
                    FieldId::BookingUnderName,
                    FieldId::BookDate,
                    FieldId::AgreementValue,
                    FieldId::ChooseProperty,
                    FieldId::TokenDone,
                ],
            },
        );
        entries.insert(
            LeadStatus::NotInterested,
            StatusEntry {
                sub_statuses: subs(&[
                    "budget_mismatch",
                    "location_mismatch",
                    "postponed",
                    "bought_elsewhere",
                ]),
                required_fields: vec![],
            },
        );
        entries.insert(
            LeadStatus::Drop,
            StatusEntry {
                sub_statuses: subs(&["invalid_number", "duplicate", "not_responding"]),
                required_fields: vec![],
            },
        );

        Self {
            version: BUILTIN_CATALOG_VERSION.to_string(),
            entries,
        }
    }

    /// Load a catalog from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn subs(labels: &[&str]) -> Vec<SubStatus> {
    labels.iter().map(|l| SubStatus::new(*l)).collect()
}

/// Pure lookup over a [`StatusCatalog`].
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    catalog: StatusCatalog,
}

impl StatusRegistry {
    /// Create a registry over the builtin catalog.
    pub fn new() -> Self {
        Self::with_catalog(StatusCatalog::builtin())
    }

    /// Create a registry over a specific catalog (e.g. fetched contract).
    pub fn with_catalog(catalog: StatusCatalog) -> Self {
        Self { catalog }
    }

    /// Catalog version string.
    pub fn version(&self) -> &str {
        &self.catalog.version
    }

    /// Ordered sub-statuses allowed under `status`.
    ///
    /// Empty slice for statuses with no sub-classification.
    pub fn sub_statuses_of(&self, status: LeadStatus) -> &[SubStatus] {
        self.catalog
            .entries
            .get(&status)
            .map(|e| e.sub_statuses.as_slice())
            .unwrap_or(&[])
    }

    /// Fields that must be present to enter `status`.
    pub fn required_fields_of(&self, status: LeadStatus) -> &[FieldId] {
        self.catalog
            .entries
            .get(&status)
            .map(|e| e.required_fields.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `sub_status` is valid under `status`.
    pub fn allows_sub_status(&self, status: LeadStatus, sub_status: &SubStatus) -> bool {
        self.sub_statuses_of(status).contains(sub_status)
    }

    /// The full field catalog.
    pub fn field_catalog(&self) -> Vec<FieldId> {
        FieldId::all()
    }

    /// Drift check for consumers holding a copy of the table.
    ///
    /// SHA-256 hex digest of a canonical string form, so any consumer in any
    /// language computes the same value from the same table and compares
    /// hashes instead of diffing.
    pub fn catalog_hash(&self) -> String {
        // Canonicalize: statuses in fixed funnel order.
        let mut canonical = String::new();
        canonical.push_str(&self.catalog.version);
        for status in LeadStatus::all() {
            canonical.push('|');
            canonical.push_str(status.as_str());
            for sub in self.sub_statuses_of(status) {
                canonical.push(',');
                canonical.push_str(sub.as_str());
            }
            canonical.push(';');
            for field in self.required_fields_of(status) {
                canonical.push(',');
                canonical.push_str(field.as_str());
            }
        }
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields_within_catalog() {
        let registry = StatusRegistry::new();
        let catalog = registry.field_catalog();

        for status in LeadStatus::all() {
            for field in registry.required_fields_of(status) {
                assert!(
                    catalog.contains(field),
                    "{:?} requires {:?} which is outside the field catalog",
                    status,
                    field
                );
            }
        }
    }

    #[test]
    fn test_total_over_all_statuses() {
        let registry = StatusRegistry::new();
        // Every status answers without panicking, including ones with no entry.
        for status in LeadStatus::all() {
            let _ = registry.sub_statuses_of(status);
            let _ = registry.required_fields_of(status);
        }
        assert!(registry.sub_statuses_of(LeadStatus::New).is_empty());
        assert!(registry.required_fields_of(LeadStatus::Negotiation).is_empty());
    }

    #[test]
    fn test_schedule_requires_date() {
        let registry = StatusRegistry::new();
        assert_eq!(
            registry.required_fields_of(LeadStatus::ScheduleMeeting),
            &[FieldId::ScheduleDate]
        );
        assert_eq!(
            registry.required_fields_of(LeadStatus::ScheduleSiteVisit),
            &[FieldId::ScheduleDate]
        );
    }

    #[test]
    fn test_book_requires_five_fields() {
        let registry = StatusRegistry::new();
        let required = registry.required_fields_of(LeadStatus::Book);
        assert_eq!(required.len(), 5);
        assert!(required.contains(&FieldId::TokenDone));
        assert!(required.contains(&FieldId::BookingUnderName));
    }

    #[test]
    fn test_allows_sub_status() {
        let registry = StatusRegistry::new();
        assert!(registry.allows_sub_status(LeadStatus::Callback, &SubStatus::from("interested")));
        assert!(!registry.allows_sub_status(LeadStatus::Callback, &SubStatus::from("no_show")));
        assert!(!registry.allows_sub_status(LeadStatus::New, &SubStatus::from("interested")));
    }

    #[test]
    fn test_yaml_round_trip() {
        let catalog = StatusCatalog::builtin();
        let yaml = catalog.to_yaml().unwrap();
        let reloaded = StatusCatalog::from_yaml(&yaml).unwrap();

        let a = StatusRegistry::with_catalog(catalog);
        let b = StatusRegistry::with_catalog(reloaded);
        assert_eq!(a.catalog_hash(), b.catalog_hash());
    }

    #[test]
    fn test_catalog_hash_detects_drift() {
        let registry = StatusRegistry::new();

        let mut drifted = StatusCatalog::builtin();
        drifted
            .entries
            .get_mut(&LeadStatus::Callback)
            .unwrap()
            .sub_statuses
            .push(SubStatus::from("warm"));
        let other = StatusRegistry::with_catalog(drifted);

        assert_ne!(registry.catalog_hash(), other.catalog_hash());
    }

    #[test]
    fn test_catalog_hash_is_sha256_of_canonical_form() {
        let registry = StatusRegistry::new();
        let hash = registry.catalog_hash();
        assert_eq!(hash.len(), 64); // SHA256 = 32 bytes = 64 hex chars
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

        // Independent instances over equal tables agree, so a consumer can
        // recompute the digest from the published canonical form.
        let other = StatusRegistry::with_catalog(StatusCatalog::builtin());
        assert_eq!(hash, other.catalog_hash());
    }
}
