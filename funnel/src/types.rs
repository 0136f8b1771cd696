//! Core types for the lead funnel.
//!
//! With the `typescript` feature enabled, these types can be exported to
//! TypeScript using ts-rs so frontends share one definition of the funnel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Funnel status of a lead.
///
/// A lead carries exactly one status at any instant. The funnel is a labeled
/// digraph, not a DAG: `Callback` and `ScheduleMeeting` may be revisited
/// repeatedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Freshly captured, not yet worked
    New,
    /// Agent owes the lead a call back
    Callback,
    /// Office/online meeting planned
    ScheduleMeeting,
    /// Property site visit planned
    ScheduleSiteVisit,
    /// Lead has expressed concrete interest
    ExpressionOfInterest,
    /// Price/terms under negotiation
    Negotiation,
    /// Booking completed
    Book,
    /// Lead declined
    NotInterested,
    /// Lead dropped (unreachable, invalid, duplicate)
    Drop,
}

impl LeadStatus {
    /// Statuses from which further funnel progress is not expected.
    ///
    /// Soft-terminal: notes may still be appended and transitions out are
    /// discouraged but never hard-locked.
    pub fn is_soft_terminal(&self) -> bool {
        matches!(self, Self::Book | Self::NotInterested | Self::Drop)
    }

    /// String representation matching the serde wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Callback => "callback",
            Self::ScheduleMeeting => "schedule_meeting",
            Self::ScheduleSiteVisit => "schedule_site_visit",
            Self::ExpressionOfInterest => "expression_of_interest",
            Self::Negotiation => "negotiation",
            Self::Book => "book",
            Self::NotInterested => "not_interested",
            Self::Drop => "drop",
        }
    }

    /// All statuses in funnel order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::New,
            Self::Callback,
            Self::ScheduleMeeting,
            Self::ScheduleSiteVisit,
            Self::ExpressionOfInterest,
            Self::Negotiation,
            Self::Book,
            Self::NotInterested,
            Self::Drop,
        ]
    }
}

/// A finer classification valid only within one parent status.
///
/// Sub-statuses are catalog data, not a closed enum: the catalog is a
/// versioned contract and communities of use extend it without code changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SubStatus(pub String);

impl SubStatus {
    /// Create a sub-status from any string-ish value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The underlying label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubStatus {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lead priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Closed catalog of lead field identifiers.
///
/// Serde names match the external wire contract (camelCase field bags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    // Identity fields (mandatory at creation)
    Name,
    Phone,
    Email,
    // Requirement fields
    BudgetMin,
    BudgetMax,
    City,
    PropertyType,
    Purpose,
    // Status-conditional fields
    ScheduleDate,
    BookingUnderName,
    BookDate,
    AgreementValue,
    ChooseProperty,
    TokenDone,
}

impl FieldId {
    /// Wire name of the field (camelCase, matches serde).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::BudgetMin => "budgetMin",
            Self::BudgetMax => "budgetMax",
            Self::City => "city",
            Self::PropertyType => "propertyType",
            Self::Purpose => "purpose",
            Self::ScheduleDate => "scheduleDate",
            Self::BookingUnderName => "bookingUnderName",
            Self::BookDate => "bookDate",
            Self::AgreementValue => "agreementValue",
            Self::ChooseProperty => "chooseProperty",
            Self::TokenDone => "tokenDone",
        }
    }

    /// The full field catalog.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Name,
            Self::Phone,
            Self::Email,
            Self::BudgetMin,
            Self::BudgetMax,
            Self::City,
            Self::PropertyType,
            Self::Purpose,
            Self::ScheduleDate,
            Self::BookingUnderName,
            Self::BookDate,
            Self::AgreementValue,
            Self::ChooseProperty,
            Self::TokenDone,
        ]
    }
}

/// Raw field input from a caller (form submit, import row).
pub type FieldBag = HashMap<FieldId, serde_json::Value>;

/// Normalized status-conditional fields.
///
/// The single shape handed to the persistence layer: every conditional field
/// is an explicit `Option`, unset values serialize as nulls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct StatusFields {
    /// Planned meeting / site visit date (ISO-8601 string, parsed upstream)
    pub schedule_date: Option<String>,
    /// Name the booking is registered under
    pub booking_under_name: Option<String>,
    /// Date of booking (ISO-8601 string)
    pub book_date: Option<String>,
    /// Agreed sale value
    pub agreement_value: Option<f64>,
    /// Reference to the chosen property
    pub choose_property: Option<String>,
    /// Whether the booking token payment is done
    pub token_done: Option<bool>,
}

/// Buyer requirement captured at intake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub purpose: Option<String>,
}

/// An entry in a lead's ordered note log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Actor who wrote the note
    pub author_id: String,
    /// Note body
    pub body: String,
    /// When the note was appended
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Create a note stamped with the current time.
    pub fn new(author_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// A prospective customer tracked through the sales funnel.
///
/// Leads are created by an intake action and mutated only through the
/// lifecycle engine's transition operation, never by direct field assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Unique identifier
    pub id: String,
    /// Contact name
    pub name: String,
    /// Contact phone
    pub phone: String,
    /// Contact email
    pub email: Option<String>,
    /// Buyer requirement
    pub requirement: Requirement,
    /// Current funnel status
    pub status: LeadStatus,
    /// Sub-status within the current status, if any
    pub sub_status: Option<SubStatus>,
    /// Priority
    pub priority: Priority,
    /// Agent the lead is assigned to
    pub assigned_agent: Option<String>,
    /// Ordered note log
    pub notes: Vec<Note>,
    /// Status-conditional fields, normalized
    pub fields: StatusFields,
    /// Version for optimistic concurrency; bumps on every committed write
    pub version: u64,
    /// When the lead was created
    pub created_at: DateTime<Utc>,
    /// When the lead was last written
    pub updated_at: DateTime<Utc>,
    /// When the lead was last contacted (any lifecycle touch)
    pub last_contacted_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// Create a fresh lead at the top of the funnel.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            phone: phone.into(),
            email: None,
            requirement: Requirement::default(),
            status: LeadStatus::New,
            sub_status: None,
            priority: Priority::default(),
            assigned_agent: None,
            notes: Vec::new(),
            fields: StatusFields::default(),
            version: 0,
            created_at: now,
            updated_at: now,
            last_contacted_at: None,
        }
    }

    /// Assign the lead to an agent.
    pub fn with_assigned_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.assigned_agent = Some(agent_id.into());
        self
    }

    /// Set the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}
