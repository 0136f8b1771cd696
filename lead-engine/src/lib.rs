//! Lead Lifecycle Engine - The Funnel Orchestrator
//!
//! Composes the status machine (`funnel`) and the authorization layer
//! (`orgauth`) into one committed write path:
//!
//! - **Authorize**: capability plus scope over the target lead
//! - **Validate**: status-conditional fields, batched errors
//! - **Commit**: expected-version write with one internal retry
//! - **Emit**: fire-and-forget domain events after the commit
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  LeadLifecycleEngine                        │
//! │                                                             │
//! │  ┌───────────┐  ┌──────────┐  ┌────────┐  ┌──────────┐    │
//! │  │ Authorize │──│ Validate │──│ Commit │──│   Emit   │    │
//! │  └───────────┘  └──────────┘  └────────┘  └──────────┘    │
//! │        │              │            │             │         │
//! │  PermissionGate  Transition-   LeadStore    EventSink      │
//! │                  Validator                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod roles;
pub mod store;

// Re-export main types
pub use config::EngineConfig;
pub use engine::{ImportOutcome, LeadLifecycleEngine};
pub use error::{EngineError, Result};
pub use events::{EventSink, EventSinkError, LeadEvent, LeadEventKind, NullEventSink, RecordingEventSink};
pub use roles::{RoleAdmin, RoleUpdate};
pub use store::{LeadStore, MemoryLeadStore, MemoryRoleStore, RoleStore, StoreError};
