//! Lead funnel catalog and transition validation.
//!
//! This crate is the single source of truth for the status / sub-status /
//! required-field table that was previously duplicated across presentation
//! components:
//!
//! - [`StatusRegistry`]: pure, total lookup over the versioned status catalog
//! - [`TransitionValidator`]: validates a proposed status change, batching
//!   every problem instead of failing fast
//! - [`Lead`] and friends: the lead data model with explicit-null normalized
//!   status fields
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use funnel::{StatusRegistry, TransitionValidator, ValidationMode, LeadStatus, FieldBag};
//!
//! let registry = Arc::new(StatusRegistry::new());
//! let validator = TransitionValidator::new(registry);
//!
//! let result = validator.validate(
//!     LeadStatus::Callback,
//!     Some(&"interested".into()),
//!     &FieldBag::new(),
//!     ValidationMode::Transition,
//! );
//! assert!(result.is_ok());
//! ```

pub mod registry;
pub mod types;
pub mod validator;

// Re-export main types
pub use registry::{StatusCatalog, StatusEntry, StatusRegistry, BUILTIN_CATALOG_VERSION};
pub use types::*;
pub use validator::{
    fields_to_bag, TransitionValidator, ValidationError, ValidationMode, CREATE_REQUIRED_FIELDS,
};
