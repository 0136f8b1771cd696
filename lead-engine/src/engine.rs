//! The lead lifecycle engine.
//!
//! Orchestrates one committed change: authorize, validate, commit, emit.
//! The engine itself is stateless between calls; persistence and event
//! delivery are injected collaborators, so it is agnostic to the caller's
//! execution model.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use funnel::{
    FieldBag, FieldId, Lead, LeadStatus, Note, Priority, Requirement, StatusRegistry, SubStatus,
    TransitionValidator, ValidationError, ValidationMode,
};
use orgauth::{Actor, AgentRef, AuthzError, Capability, PermissionGate, Scope};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::{EventSink, LeadEvent, LeadEventKind};
use crate::store::{LeadStore, StoreError};

/// Per-row outcome of a batch import.
///
/// Import never collapses into a single pass/fail: callers learn exactly
/// which rows were rejected and why.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// Row became a lead
    Created { row: usize, lead_id: String },
    /// Row failed create-mode validation
    Rejected {
        row: usize,
        errors: Vec<ValidationError>,
    },
}

/// Orchestrates lead mutations: authorize, validate, commit, emit.
pub struct LeadLifecycleEngine {
    validator: TransitionValidator,
    gate: PermissionGate,
    lead_store: Arc<dyn LeadStore>,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl LeadLifecycleEngine {
    /// Create an engine with default configuration.
    pub fn new(
        registry: Arc<StatusRegistry>,
        lead_store: Arc<dyn LeadStore>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            validator: TransitionValidator::new(registry),
            gate: PermissionGate::new(),
            lead_store,
            sink,
            config: EngineConfig::default(),
        }
    }

    /// Override the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The validator (and through it the status registry) in use.
    pub fn validator(&self) -> &TransitionValidator {
        &self.validator
    }

    /// Move a lead through the funnel.
    ///
    /// Authorizes `UpdateLeadStatus` over the lead, validates the proposed
    /// state, commits with an expected-version check and appends an audit
    /// note (auto-generated when none is supplied). A conflicted commit is
    /// reloaded and retried once before surfacing. Re-running an identical
    /// target state is a no-op: no duplicate auto-note, no event.
    pub async fn transition(
        &self,
        actor: &Actor,
        lead_id: &str,
        proposed_status: LeadStatus,
        proposed_sub_status: Option<SubStatus>,
        bag: FieldBag,
        note: Option<String>,
    ) -> Result<Lead> {
        let mut attempts = 0;
        loop {
            let current = self.lead_store.get_lead(lead_id).await?;
            self.authorize_over_lead(actor, Capability::UpdateLeadStatus, &current)
                .await?;

            let normalized = self
                .validator
                .validate(
                    proposed_status,
                    proposed_sub_status.as_ref(),
                    &bag,
                    ValidationMode::Transition,
                )
                .map_err(EngineError::Validation)?;

            if current.status == proposed_status
                && current.sub_status == proposed_sub_status
                && current.fields == normalized
                && note.is_none()
            {
                debug!(lead_id = %current.id, status = proposed_status.as_str(), "transition is a no-op");
                return Ok(current);
            }

            if current.status.is_soft_terminal() && current.status != proposed_status {
                debug!(
                    lead_id = %current.id,
                    from = current.status.as_str(),
                    "transitioning out of a soft-terminal status"
                );
            }

            let from = current.status;
            let expected_version = current.version;
            let mut updated = current;
            updated.status = proposed_status;
            updated.sub_status = proposed_sub_status.clone();
            updated.fields = normalized;

            let body = note.clone().unwrap_or_else(|| {
                self.config
                    .render_auto_note(from.as_str(), proposed_status.as_str())
            });
            updated.notes.push(Note::new(actor.id.as_str(), body));

            let now = Utc::now();
            updated.updated_at = now;
            updated.last_contacted_at = Some(now);

            match self.lead_store.save_lead(updated, expected_version).await {
                Ok(saved) => {
                    info!(
                        lead_id = %saved.id,
                        from = from.as_str(),
                        to = proposed_status.as_str(),
                        actor_id = %actor.id,
                        "lead transition committed"
                    );
                    self.emit(LeadEvent::status_changed(
                        &saved.id,
                        from,
                        proposed_status,
                        actor.id.as_str(),
                    ))
                    .await;
                    return Ok(saved);
                },
                Err(StoreError::VersionConflict { expected, actual }) => {
                    if attempts < self.config.conflict_retries {
                        attempts += 1;
                        warn!(lead_id = %lead_id, expected, actual, "conflicted commit, reloading and retrying");
                        continue;
                    }
                    return Err(EngineError::Conflict { expected, actual });
                },
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Create a lead by intake.
    ///
    /// Uses the same validator in `Create` mode so the required-field rules
    /// have one source of truth. The lead starts at the top of the funnel,
    /// assigned to the creating actor.
    pub async fn create_lead(
        &self,
        actor: &Actor,
        bag: FieldBag,
        priority: Option<Priority>,
    ) -> Result<Lead> {
        self.gate.authorize_action(actor, Capability::CreateLeads)?;

        let mut lead = self.build_lead(actor, &bag)?;
        if let Some(priority) = priority {
            lead.priority = priority;
        }
        let saved = self.lead_store.insert_lead(lead).await?;
        info!(lead_id = %saved.id, actor_id = %actor.id, "lead created");
        self.emit(LeadEvent::created(
            &saved.id,
            saved.status,
            actor.id.as_str(),
            LeadEventKind::Created,
        ))
        .await;
        Ok(saved)
    }

    /// Create leads from pre-parsed import rows, one outcome per row.
    ///
    /// Duplicate detection (phone/email) is the import adapter's job, not
    /// this engine's.
    pub async fn import_leads(
        &self,
        actor: &Actor,
        rows: Vec<FieldBag>,
    ) -> Result<Vec<ImportOutcome>> {
        self.gate
            .authorize_action(actor, Capability::ImportExportData)?;
        self.gate
            .authorize_action(actor, Capability::BulkOperations)?;

        let mut outcomes = Vec::with_capacity(rows.len());
        for (row, bag) in rows.iter().enumerate() {
            match self.build_lead(actor, bag) {
                Ok(lead) => {
                    let saved = self.lead_store.insert_lead(lead).await?;
                    self.emit(LeadEvent::created(
                        &saved.id,
                        saved.status,
                        actor.id.as_str(),
                        LeadEventKind::Imported,
                    ))
                    .await;
                    outcomes.push(ImportOutcome::Created {
                        row,
                        lead_id: saved.id,
                    });
                },
                Err(EngineError::Validation(errors)) => {
                    outcomes.push(ImportOutcome::Rejected { row, errors });
                },
                Err(err) => return Err(err),
            }
        }
        info!(
            actor_id = %actor.id,
            total = rows.len(),
            created = outcomes.iter().filter(|o| matches!(o, ImportOutcome::Created { .. })).count(),
            "import finished"
        );
        Ok(outcomes)
    }

    /// Leads visible to the actor under `scope`.
    ///
    /// This is the server-side list-fetch authority: the scope token is
    /// recomputed into a predicate from the actor, never trusted as sent.
    pub async fn list_leads(&self, actor: &Actor, scope: Scope) -> Result<Vec<Lead>> {
        let capability = match scope {
            Scope::Own => Capability::ViewAssignedLeads,
            _ => Capability::ViewTeamLeads,
        };
        self.gate.authorize_action(actor, capability)?;

        let predicate = self.gate.resolver().resolve_predicate(actor, scope)?;
        Ok(self.lead_store.query_leads(&predicate).await?)
    }

    /// Append a note to a lead.
    ///
    /// Allowed on soft-terminal leads; notes are the one mutation the funnel
    /// never locks.
    pub async fn add_note(
        &self,
        actor: &Actor,
        lead_id: &str,
        body: impl Into<String>,
    ) -> Result<Lead> {
        let body = body.into();
        let mut attempts = 0;
        loop {
            let current = self.lead_store.get_lead(lead_id).await?;
            self.authorize_over_lead(actor, Capability::EditLeads, &current)
                .await?;

            let expected_version = current.version;
            let mut updated = current;
            updated.notes.push(Note::new(actor.id.as_str(), body.clone()));
            let now = Utc::now();
            updated.updated_at = now;
            updated.last_contacted_at = Some(now);

            match self.lead_store.save_lead(updated, expected_version).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::VersionConflict { expected, actual }) => {
                    if attempts < self.config.conflict_retries {
                        attempts += 1;
                        continue;
                    }
                    return Err(EngineError::Conflict { expected, actual });
                },
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Authorize `capability` over a lead via the narrowest available scope
    /// containing it.
    async fn authorize_over_lead(
        &self,
        actor: &Actor,
        capability: Capability,
        lead: &Lead,
    ) -> Result<()> {
        self.gate.authorize_action(actor, capability)?;

        // An assignee missing from the directory cannot be placed in any
        // org unit; only the unfiltered scope still sees the lead.
        let target: Option<AgentRef> = match &lead.assigned_agent {
            Some(agent_id) => match self.lead_store.get_agent_ref(agent_id).await {
                Ok(agent) => Some(agent),
                Err(StoreError::NotFound(_)) => None,
                Err(err) => return Err(err.into()),
            },
            None => None,
        };

        let scopes = self.gate.resolver().available_scopes(actor);
        for &scope in &scopes {
            let predicate = self.gate.resolver().resolve_predicate(actor, scope)?;
            let matched = match &target {
                Some(agent) => predicate.matches(agent),
                None => predicate.matches_unassigned(),
            };
            if matched {
                return Ok(());
            }
        }

        debug!(
            actor_id = %actor.id,
            lead_id = %lead.id,
            "lead outside every available scope"
        );
        Err(AuthzError::OutOfScope {
            scope: self.gate.resolver().widest_scope(actor),
        }
        .into())
    }

    /// Validate a field bag in create mode and shape it into a fresh lead.
    fn build_lead(&self, actor: &Actor, bag: &FieldBag) -> Result<Lead> {
        let normalized = self
            .validator
            .validate(LeadStatus::New, None, bag, ValidationMode::Create)
            .map_err(EngineError::Validation)?;

        // Identity fields are guaranteed present by create-mode validation.
        let name = string_field(bag, FieldId::Name).unwrap_or_default();
        let phone = string_field(bag, FieldId::Phone).unwrap_or_default();

        let mut lead = Lead::new(name, phone).with_assigned_agent(actor.id.as_str());
        lead.email = string_field(bag, FieldId::Email);
        lead.requirement = Requirement {
            budget_min: number_field(bag, FieldId::BudgetMin),
            budget_max: number_field(bag, FieldId::BudgetMax),
            city: string_field(bag, FieldId::City),
            property_type: string_field(bag, FieldId::PropertyType),
            purpose: string_field(bag, FieldId::Purpose),
        };
        lead.fields = normalized;
        Ok(lead)
    }

    /// Fire-and-forget event delivery.
    async fn emit(&self, event: LeadEvent) {
        if let Err(err) = self.sink.publish(event).await {
            warn!(error = %err, "event delivery failed; write already committed");
        }
    }
}

fn string_field(bag: &FieldBag, field: FieldId) -> Option<String> {
    match bag.get(&field) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn number_field(bag: &FieldBag, field: FieldId) -> Option<f64> {
    match bag.get(&field) {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEventSink;
    use crate::store::MemoryLeadStore;
    use async_trait::async_trait;
    use orgauth::RoleRank;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn agent_actor(id: &str, rank: RoleRank, caps: &[Capability]) -> Actor {
        Actor::new(
            id,
            "role-1",
            rank,
            caps.iter().copied().collect::<HashSet<_>>(),
            "branch-1",
            "region-1",
        )
    }

    fn full_caps() -> Vec<Capability> {
        Capability::all()
    }

    struct Fixture {
        store: Arc<MemoryLeadStore>,
        sink: Arc<RecordingEventSink>,
        engine: LeadLifecycleEngine,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryLeadStore::new());
        store.register_agent(AgentRef::new("agent-1", "branch-1", "region-1"));
        store.register_agent(AgentRef::new("agent-2", "branch-2", "region-2"));
        let sink = Arc::new(RecordingEventSink::new());
        let engine = LeadLifecycleEngine::new(
            Arc::new(StatusRegistry::new()),
            store.clone(),
            sink.clone(),
        );
        Fixture {
            store,
            sink,
            engine,
        }
    }

    async fn seed_lead(store: &MemoryLeadStore, agent: &str) -> Lead {
        store
            .insert_lead(Lead::new("Asha Verma", "+91-9000000001").with_assigned_agent(agent))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_transition_commits_note_and_event() {
        let f = fixture();
        let lead = seed_lead(&f.store, "agent-1").await;
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let updated = f
            .engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::Callback,
                Some(SubStatus::from("interested")),
                FieldBag::new(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(updated.status, LeadStatus::Callback);
        assert_eq!(updated.sub_status, Some(SubStatus::from("interested")));
        assert_eq!(updated.version, 1);
        assert_eq!(updated.notes.len(), 1);
        assert_eq!(
            updated.notes[0].body,
            "Status changed from new to callback"
        );
        assert!(updated.last_contacted_at.is_some());

        let events = f.sink.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].from_status, Some(LeadStatus::New));
        assert_eq!(events[0].to_status, LeadStatus::Callback);
        assert_eq!(events[0].actor_id, "agent-1");
    }

    #[tokio::test]
    async fn test_identical_transition_is_a_noop() {
        let f = fixture();
        let lead = seed_lead(&f.store, "agent-1").await;
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let first = f
            .engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::Callback,
                Some(SubStatus::from("interested")),
                FieldBag::new(),
                None,
            )
            .await
            .unwrap();

        let second = f
            .engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::Callback,
                Some(SubStatus::from("interested")),
                FieldBag::new(),
                None,
            )
            .await
            .unwrap();

        // No duplicate auto-note, no version bump, no second event.
        assert_eq!(second.version, first.version);
        assert_eq!(second.notes.len(), 1);
        assert_eq!(f.sink.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_capability_is_forbidden() {
        let f = fixture();
        let lead = seed_lead(&f.store, "agent-1").await;
        let actor = agent_actor("agent-1", RoleRank::Level(2), &[Capability::ViewAssignedLeads]);

        let err = f
            .engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::Callback,
                None,
                FieldBag::new(),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Authorization(AuthzError::Forbidden));
    }

    #[tokio::test]
    async fn test_lead_outside_scope_denied() {
        let f = fixture();
        // Lead belongs to an agent in another branch and region.
        let lead = seed_lead(&f.store, "agent-2").await;
        let actor = agent_actor("agent-1", RoleRank::Level(3), &full_caps());

        let err = f
            .engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::Callback,
                None,
                FieldBag::new(),
                None,
            )
            .await
            .unwrap_err();
        // The denial names the actor's widest scope, not the requested one.
        assert_eq!(
            err,
            EngineError::Authorization(AuthzError::OutOfScope { scope: Scope::Own })
        );
    }

    #[tokio::test]
    async fn test_validation_errors_batched_through_engine() {
        let f = fixture();
        let lead = seed_lead(&f.store, "agent-1").await;
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let bag: FieldBag = [
            (FieldId::BookingUnderName, json!("")),
            (FieldId::BookDate, json!("2024-05-01")),
            (FieldId::AgreementValue, json!(5_000_000)),
            (FieldId::ChooseProperty, json!("p1")),
            (FieldId::TokenDone, json!(false)),
        ]
        .into_iter()
        .collect();

        let err = f
            .engine
            .transition(&actor, &lead.id, LeadStatus::Book, None, bag, None)
            .await
            .unwrap_err();
        match err {
            EngineError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
        // Nothing committed, nothing emitted.
        assert_eq!(f.store.get_lead(&lead.id).await.unwrap().version, 0);
        assert!(f.sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_not_found() {
        let f = fixture();
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());
        let err = f
            .engine
            .transition(
                &actor,
                "missing",
                LeadStatus::Callback,
                None,
                FieldBag::new(),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound("missing".to_string()));
    }

    /// Lead store that fails the first N saves with a version conflict.
    struct FlakyLeadStore {
        inner: Arc<MemoryLeadStore>,
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl LeadStore for FlakyLeadStore {
        async fn get_lead(&self, id: &str) -> std::result::Result<Lead, StoreError> {
            self.inner.get_lead(id).await
        }

        async fn insert_lead(&self, lead: Lead) -> std::result::Result<Lead, StoreError> {
            self.inner.insert_lead(lead).await
        }

        async fn save_lead(
            &self,
            lead: Lead,
            expected_version: u64,
        ) -> std::result::Result<Lead, StoreError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::VersionConflict {
                    expected: expected_version,
                    actual: expected_version + 1,
                });
            }
            self.inner.save_lead(lead, expected_version).await
        }

        async fn query_leads(
            &self,
            predicate: &orgauth::ScopePredicate,
        ) -> std::result::Result<Vec<Lead>, StoreError> {
            self.inner.query_leads(predicate).await
        }

        async fn get_agent_ref(&self, agent_id: &str) -> std::result::Result<AgentRef, StoreError> {
            self.inner.get_agent_ref(agent_id).await
        }
    }

    async fn flaky_fixture(failures: u32) -> (Arc<MemoryLeadStore>, LeadLifecycleEngine, Lead) {
        let inner = Arc::new(MemoryLeadStore::new());
        inner.register_agent(AgentRef::new("agent-1", "branch-1", "region-1"));
        let lead = seed_lead(&inner, "agent-1").await;

        let flaky = Arc::new(FlakyLeadStore {
            inner: inner.clone(),
            failures_left: AtomicU32::new(failures),
        });
        let engine = LeadLifecycleEngine::new(
            Arc::new(StatusRegistry::new()),
            flaky,
            Arc::new(crate::events::NullEventSink),
        );
        (inner, engine, lead)
    }

    #[tokio::test]
    async fn test_conflict_retried_once_then_succeeds() {
        let (_store, engine, lead) = flaky_fixture(1).await;
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let updated = engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::Callback,
                None,
                FieldBag::new(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.status, LeadStatus::Callback);
    }

    #[tokio::test]
    async fn test_persistent_conflict_surfaces() {
        let (_store, engine, lead) = flaky_fixture(10).await;
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let err = engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::Callback,
                None,
                FieldBag::new(),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict { .. }));
    }

    /// Sink that always fails.
    struct FailingEventSink;

    #[async_trait]
    impl EventSink for FailingEventSink {
        async fn publish(
            &self,
            _event: LeadEvent,
        ) -> std::result::Result<(), crate::events::EventSinkError> {
            Err(crate::events::EventSinkError("sink down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_sink_failure_never_rolls_back() {
        let store = Arc::new(MemoryLeadStore::new());
        store.register_agent(AgentRef::new("agent-1", "branch-1", "region-1"));
        let lead = seed_lead(&store, "agent-1").await;
        let engine = LeadLifecycleEngine::new(
            Arc::new(StatusRegistry::new()),
            store.clone(),
            Arc::new(FailingEventSink),
        );
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let updated = engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::Callback,
                None,
                FieldBag::new(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(updated.status, LeadStatus::Callback);
        assert_eq!(
            store.get_lead(&lead.id).await.unwrap().status,
            LeadStatus::Callback
        );
    }

    #[tokio::test]
    async fn test_create_lead() {
        let f = fixture();
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let bag: FieldBag = [
            (FieldId::Name, json!("Asha Verma")),
            (FieldId::Phone, json!("+91-9000000001")),
            (FieldId::City, json!("Pune")),
            (FieldId::BudgetMax, json!(7_500_000)),
        ]
        .into_iter()
        .collect();

        let lead = f
            .engine
            .create_lead(&actor, bag, Some(Priority::High))
            .await
            .unwrap();
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.priority, Priority::High);
        assert_eq!(lead.assigned_agent.as_deref(), Some("agent-1"));
        assert_eq!(lead.requirement.city.as_deref(), Some("Pune"));
        assert_eq!(lead.requirement.budget_max, Some(7_500_000.0));

        let events = f.sink.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LeadEventKind::Created);
    }

    #[tokio::test]
    async fn test_create_without_identity_fields_rejected() {
        let f = fixture();
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let err = f
            .engine
            .create_lead(&actor, FieldBag::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_reports_per_row() {
        let f = fixture();
        let actor = agent_actor("agent-1", RoleRank::Level(8), &full_caps());

        let rows = vec![
            [
                (FieldId::Name, json!("Asha")),
                (FieldId::Phone, json!("+91-9000000001")),
            ]
            .into_iter()
            .collect::<FieldBag>(),
            // Missing phone
            [(FieldId::Name, json!("Ravi"))].into_iter().collect(),
            [
                (FieldId::Name, json!("Meera")),
                (FieldId::Phone, json!("+91-9000000003")),
            ]
            .into_iter()
            .collect(),
        ];

        let outcomes = f.engine.import_leads(&actor, rows).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], ImportOutcome::Created { row: 0, .. }));
        assert!(matches!(
            outcomes[1],
            ImportOutcome::Rejected { row: 1, .. }
        ));
        assert!(matches!(outcomes[2], ImportOutcome::Created { row: 2, .. }));
        assert_eq!(f.store.len(), 2);
    }

    #[tokio::test]
    async fn test_import_requires_both_capabilities() {
        let f = fixture();
        let actor = agent_actor("agent-1", RoleRank::Level(8), &[Capability::ImportExportData]);

        let err = f.engine.import_leads(&actor, vec![]).await.unwrap_err();
        assert_eq!(err, EngineError::Authorization(AuthzError::Forbidden));
    }

    #[tokio::test]
    async fn test_list_leads_respects_scope() {
        let f = fixture();
        seed_lead(&f.store, "agent-1").await;
        seed_lead(&f.store, "agent-2").await;

        let low = agent_actor("agent-1", RoleRank::Level(3), &full_caps());
        let own = f.engine.list_leads(&low, Scope::Own).await.unwrap();
        assert_eq!(own.len(), 1);

        // Level 3 cannot ask for branch visibility.
        let err = f.engine.list_leads(&low, Scope::Branch).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Authorization(AuthzError::ScopeUnavailable { .. })
        ));

        let admin = agent_actor("boss", RoleRank::Admin, &full_caps());
        let all = f.engine.list_leads(&admin, Scope::All).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_add_note_on_soft_terminal_lead() {
        let f = fixture();
        let lead = seed_lead(&f.store, "agent-1").await;
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let bag: FieldBag = [
            (FieldId::BookingUnderName, json!("Asha Verma")),
            (FieldId::BookDate, json!("2024-05-01")),
            (FieldId::AgreementValue, json!(5_000_000)),
            (FieldId::ChooseProperty, json!("p1")),
            (FieldId::TokenDone, json!(true)),
        ]
        .into_iter()
        .collect();
        f.engine
            .transition(&actor, &lead.id, LeadStatus::Book, None, bag, None)
            .await
            .unwrap();

        let noted = f
            .engine
            .add_note(&actor, &lead.id, "Handover docs shared")
            .await
            .unwrap();
        assert_eq!(noted.status, LeadStatus::Book);
        assert_eq!(noted.notes.len(), 2);
        assert_eq!(noted.notes[1].body, "Handover docs shared");
    }

    #[tokio::test]
    async fn test_backtracking_is_allowed() {
        // The funnel is a digraph, not a DAG: callback may be revisited.
        let f = fixture();
        let lead = seed_lead(&f.store, "agent-1").await;
        let actor = agent_actor("agent-1", RoleRank::Level(2), &full_caps());

        let bag: FieldBag = [(FieldId::ScheduleDate, json!("2024-06-10"))]
            .into_iter()
            .collect();
        f.engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::ScheduleMeeting,
                None,
                bag,
                None,
            )
            .await
            .unwrap();

        let back = f
            .engine
            .transition(
                &actor,
                &lead.id,
                LeadStatus::Callback,
                Some(SubStatus::from("follow_up")),
                FieldBag::new(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(back.status, LeadStatus::Callback);
        assert_eq!(back.version, 2);
    }
}
