//! Blade lifecycle workflow
//!
//! Lookup by code, registration of unknown codes, and sharpening
//! registration with the conditional terminal transition. Every operation
//! ends by re-running the lookup, so callers always display what the store
//! holds rather than locally patched state.
//!
//! The final sharpening is two independent writes (the event, then the
//! blade's terminal flag). There is no rollback: when the second write fails
//! the caller gets [`LifecycleError::PartialTermination`] naming the event
//! that was stored.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::core::session::Session;
use crate::core::store::{DocumentStore, StoreError};
use crate::core::validation::{optional, required, selected, ValidationError};
use crate::entities::{Blade, BladeType, Branch, SharpeningEvent, SharpeningKind};

/// Message shown for any failed store call
pub const RETRY_MESSAGE: &str = "Operation failed, please try again";

#[derive(Debug, Error, Diagnostic)]
pub enum LifecycleError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error("no blade registered with code '{0}'")]
    #[diagnostic(
        code(sawtrack::lifecycle::not_found),
        help("Register it first with 'sawtrack blade register {0}'")
    )]
    BladeNotFound(String),

    #[error("blade '{0}' already received its terminal sharpening")]
    #[diagnostic(
        code(sawtrack::lifecycle::terminal),
        help("Terminal blades cannot be sharpened again")
    )]
    TerminalBlade(String),

    #[error("a blade with code '{0}' is already registered")]
    #[diagnostic(code(sawtrack::lifecycle::duplicate_code))]
    DuplicateCode(String),

    #[error("branch {0} does not exist")]
    #[diagnostic(code(sawtrack::lifecycle::unknown_branch))]
    UnknownBranch(EntityId),

    #[error("blade type {0} does not exist")]
    #[diagnostic(code(sawtrack::lifecycle::unknown_blade_type))]
    UnknownBladeType(EntityId),

    #[error("blade type '{0}' is inactive")]
    #[diagnostic(
        code(sawtrack::lifecycle::inactive_blade_type),
        help("Pick an active type or reactivate it with 'sawtrack type edit'")
    )]
    InactiveBladeType(String),

    #[error("sharpening {event} was recorded but blade '{code}' could not be marked terminal")]
    #[diagnostic(
        code(sawtrack::lifecycle::partial_termination),
        help("The event is stored; the blade is still open. Contact an administrator.")
    )]
    PartialTermination {
        event: EntityId,
        code: String,
        cause: StoreError,
    },

    #[error("Operation failed, please try again")]
    #[diagnostic(code(sawtrack::lifecycle::collaborator))]
    Collaborator { cause: StoreError },
}

/// Log a store failure and hide it behind the generic retry message
fn collaborator(cause: StoreError) -> LifecycleError {
    error!(error = %cause, "document store call failed");
    LifecycleError::Collaborator { cause }
}

/// A blade together with its sharpening history, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BladeSnapshot {
    pub blade: Blade,
    pub history: Vec<SharpeningEvent>,
}

/// Result of looking up a code
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// Unknown code; registration is offered
    NotFound { code: String },
    /// Blade exists and accepts sharpenings
    Available(BladeSnapshot),
    /// Blade already received its final sharpening
    Terminal(BladeSnapshot),
}

impl LookupOutcome {
    pub fn snapshot(&self) -> Option<&BladeSnapshot> {
        match self {
            LookupOutcome::NotFound { .. } => None,
            LookupOutcome::Available(s) | LookupOutcome::Terminal(s) => Some(s),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LookupOutcome::Terminal(_))
    }

    /// Whether the registration path applies
    pub fn can_register(&self) -> bool {
        matches!(self, LookupOutcome::NotFound { .. })
    }

    /// Whether a sharpening may be recorded
    pub fn can_sharpen(&self) -> bool {
        matches!(self, LookupOutcome::Available(_))
    }
}

/// Input of blade registration
#[derive(Debug, Clone, Default)]
pub struct NewBlade {
    pub code: String,
    pub branch: Option<EntityId>,
    pub blade_type: Option<EntityId>,
}

/// Input of sharpening registration
#[derive(Debug, Clone, Default)]
pub struct SharpeningForm {
    pub kind: Option<SharpeningKind>,
    pub timestamp: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Marks the blade terminal after the event is stored
    pub final_sharpening: bool,
}

/// What a successful sharpening registration produced
#[derive(Debug, Clone)]
pub struct SharpeningReceipt {
    pub event: SharpeningEvent,
    pub outcome: LookupOutcome,
}

/// The lifecycle workflow for one signed-in user
pub struct BladeLifecycle<'a, S: DocumentStore> {
    store: &'a mut S,
    session: &'a Session,
}

impl<'a, S: DocumentStore> BladeLifecycle<'a, S> {
    pub fn new(store: &'a mut S, session: &'a Session) -> Self {
        Self { store, session }
    }

    /// Look a code up and classify the blade's lifecycle state
    pub fn lookup(&self, code: &str) -> Result<LookupOutcome, LifecycleError> {
        let code = required("code", code)?;
        let matches: Vec<Blade> = self
            .store
            .fetch_where("code", &Value::String(code.clone()))
            .map_err(collaborator)?;

        let Some(blade) = matches.into_iter().next() else {
            return Ok(LookupOutcome::NotFound { code });
        };

        let history = self.history(&blade)?;
        let snapshot = BladeSnapshot { blade, history };
        if snapshot.blade.is_terminal() {
            warn!(code = %code, "blade already received its terminal sharpening");
            Ok(LookupOutcome::Terminal(snapshot))
        } else {
            Ok(LookupOutcome::Available(snapshot))
        }
    }

    fn history(&self, blade: &Blade) -> Result<Vec<SharpeningEvent>, LifecycleError> {
        let mut events: Vec<SharpeningEvent> = self
            .store
            .fetch_where("blade", &Value::String(blade.id.to_string()))
            .map_err(collaborator)?;
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    /// Register a blade for a code that is not yet known
    pub fn register_blade(&mut self, form: NewBlade) -> Result<LookupOutcome, LifecycleError> {
        let code = required("code", &form.code)?;
        let branch_id = selected("branch", form.branch)?;
        let type_id = selected("blade type", form.blade_type)?;

        if !self.lookup(&code)?.can_register() {
            return Err(LifecycleError::DuplicateCode(code));
        }

        self.store
            .fetch::<Branch>(&branch_id)
            .map_err(collaborator)?
            .ok_or(LifecycleError::UnknownBranch(branch_id))?;
        let blade_type = self
            .store
            .fetch::<BladeType>(&type_id)
            .map_err(collaborator)?
            .ok_or(LifecycleError::UnknownBladeType(type_id))?;
        if !blade_type.active {
            return Err(LifecycleError::InactiveBladeType(blade_type.code));
        }

        let mut blade = Blade::new(&code, branch_id, type_id);
        blade.registered_by = Some(self.session.user_id());
        self.store.create(&blade).map_err(collaborator)?;
        info!(id = %blade.id(), code = %code, "registered blade");

        self.lookup(&code)
    }

    /// Record a sharpening and, when final, close the blade's lifecycle
    pub fn record_sharpening(
        &mut self,
        code: &str,
        form: SharpeningForm,
    ) -> Result<SharpeningReceipt, LifecycleError> {
        let code = required("code", code)?;
        let kind = selected("sharpening kind", form.kind)?;
        let timestamp = selected("timestamp", form.timestamp)?;

        let mut blade = match self.lookup(&code)? {
            LookupOutcome::NotFound { code } => return Err(LifecycleError::BladeNotFound(code)),
            LookupOutcome::Terminal(_) => return Err(LifecycleError::TerminalBlade(code)),
            LookupOutcome::Available(snapshot) => snapshot.blade,
        };

        let mut event = SharpeningEvent::for_blade(&blade, kind, timestamp);
        event.notes = optional(form.notes.as_deref());
        event.recorded_by = Some(self.session.user_id());
        self.store.create(&event).map_err(collaborator)?;
        info!(event = %event.id, blade = %blade.id, kind = %kind, "recorded sharpening");

        if form.final_sharpening && blade.mark_terminal(timestamp) {
            if let Err(cause) = self.store.update(&blade) {
                error!(error = %cause, event = %event.id, "blade update failed after event was stored");
                return Err(LifecycleError::PartialTermination {
                    event: event.id,
                    code,
                    cause,
                });
            }
            info!(blade = %blade.id, "blade marked terminal");
        }

        let outcome = self.lookup(&code)?;
        Ok(SharpeningReceipt { event, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::core::store::{MemoryStore, WriteOp};
    use crate::entities::{Role, User};
    use chrono::TimeZone;

    struct Fixture {
        store: MemoryStore,
        session: Session,
        branch: EntityId,
        blade_type: EntityId,
    }

    fn fixture() -> Fixture {
        let mut store = MemoryStore::new();
        let branch = Branch {
            id: EntityId::new(EntityPrefix::Brn),
            name: "B1".to_string(),
            address: "Av. Central 10".to_string(),
            phone: "555-0100".to_string(),
            manager: None,
            created: Utc::now(),
        };
        let blade_type = BladeType {
            id: EntityId::new(EntityPrefix::Bty),
            code: "T1".to_string(),
            name: "Circular 300mm".to_string(),
            active: true,
            description: None,
            created: Utc::now(),
        };
        store.create(&branch).unwrap();
        store.create(&blade_type).unwrap();

        let user = User {
            id: EntityId::new(EntityPrefix::Usr),
            email: "op@example.com".to_string(),
            name: "Operator".to_string(),
            role: Role::Operator,
            branch: branch.id,
            active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        Fixture {
            store,
            session: Session::new(user, Utc::now()),
            branch: branch.id,
            blade_type: blade_type.id,
        }
    }

    fn new_blade(fx: &Fixture, code: &str) -> NewBlade {
        NewBlade {
            code: code.to_string(),
            branch: Some(fx.branch),
            blade_type: Some(fx.blade_type),
        }
    }

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, month, day, 9, 30, 0).unwrap()
    }

    fn sharpening(kind: SharpeningKind, ts: DateTime<Utc>, final_sharpening: bool) -> SharpeningForm {
        SharpeningForm {
            kind: Some(kind),
            timestamp: Some(ts),
            notes: None,
            final_sharpening,
        }
    }

    #[test]
    fn test_unknown_code_offers_registration() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let lifecycle = BladeLifecycle::new(&mut fx.store, &session);

        let outcome = lifecycle.lookup("ZZ-9999").unwrap();
        assert_eq!(
            outcome,
            LookupOutcome::NotFound {
                code: "ZZ-9999".to_string()
            }
        );
        assert!(outcome.can_register());
        assert!(!outcome.can_sharpen());
    }

    #[test]
    fn test_blank_code_is_a_validation_error() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let lifecycle = BladeLifecycle::new(&mut fx.store, &session);

        assert!(matches!(
            lifecycle.lookup("   "),
            Err(LifecycleError::Validation(ValidationError::Required("code")))
        ));
    }

    #[test]
    fn test_full_lifecycle() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let form = new_blade(&fx, "SN-1001");
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);

        // registered, no history
        let outcome = lifecycle.register_blade(form).unwrap();
        let LookupOutcome::Available(snapshot) = &outcome else {
            panic!("expected available, got {:?}", outcome);
        };
        assert!(snapshot.history.is_empty());
        assert!(!snapshot.blade.terminal_sharpening_done);
        assert_eq!(snapshot.blade.registered_by, Some(session.user_id()));

        // one non-final sharpening
        let receipt = lifecycle
            .record_sharpening("SN-1001", sharpening(SharpeningKind::Edge, at(3, 1), false))
            .unwrap();
        assert!(receipt.outcome.can_sharpen());
        assert_eq!(receipt.outcome.snapshot().unwrap().history.len(), 1);
        assert_eq!(receipt.event.recorded_by, Some(session.user_id()));

        // final sharpening
        let receipt = lifecycle
            .record_sharpening("SN-1001", sharpening(SharpeningKind::Face, at(4, 2), true))
            .unwrap();
        let LookupOutcome::Terminal(snapshot) = &receipt.outcome else {
            panic!("expected terminal, got {:?}", receipt.outcome);
        };
        assert_eq!(snapshot.history.len(), 2);
        assert!(snapshot.blade.terminal_sharpening_done);
        assert_eq!(snapshot.blade.terminal_sharpening_date, Some(at(4, 2)));

        // no further sharpening
        assert!(matches!(
            lifecycle.record_sharpening("SN-1001", sharpening(SharpeningKind::Edge, at(5, 1), false)),
            Err(LifecycleError::TerminalBlade(_))
        ));
        assert_eq!(lifecycle.lookup("SN-1001").unwrap().snapshot().unwrap().history.len(), 2);
    }

    #[test]
    fn test_terminal_blade_without_history_is_refused() {
        let mut fx = fixture();
        let mut blade = Blade::new("SN-7", fx.branch, fx.blade_type);
        blade.mark_terminal(at(1, 10));
        fx.store.create(&blade).unwrap();

        let session = fx.session.clone();
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
        assert!(lifecycle.lookup("SN-7").unwrap().is_terminal());
        assert!(matches!(
            lifecycle.record_sharpening("SN-7", sharpening(SharpeningKind::Edge, at(2, 1), false)),
            Err(LifecycleError::TerminalBlade(_))
        ));
        assert!(fx.store.is_empty(EntityPrefix::Shp));
    }

    #[test]
    fn test_history_is_sorted_by_timestamp() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let form = new_blade(&fx, "SN-2");
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
        lifecycle.register_blade(form).unwrap();

        lifecycle
            .record_sharpening("SN-2", sharpening(SharpeningKind::Face, at(6, 1), false))
            .unwrap();
        let receipt = lifecycle
            .record_sharpening("SN-2", sharpening(SharpeningKind::Edge, at(2, 1), false))
            .unwrap();

        let history = &receipt.outcome.snapshot().unwrap().history;
        assert_eq!(history[0].timestamp, at(2, 1));
        assert_eq!(history[1].timestamp, at(6, 1));
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let form = new_blade(&fx, "SN-3");
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
        lifecycle.register_blade(form).unwrap();
        lifecycle
            .record_sharpening("SN-3", sharpening(SharpeningKind::Edge, at(3, 3), false))
            .unwrap();

        assert_eq!(lifecycle.lookup("SN-3").unwrap(), lifecycle.lookup("SN-3").unwrap());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let first = new_blade(&fx, "SN-4");
        let second = new_blade(&fx, " SN-4 ");
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);

        lifecycle.register_blade(first).unwrap();
        assert!(matches!(
            lifecycle.register_blade(second),
            Err(LifecycleError::DuplicateCode(code)) if code == "SN-4"
        ));
        assert_eq!(fx.store.len(EntityPrefix::Bld), 1);
    }

    #[test]
    fn test_registration_validates_before_store_calls() {
        let mut fx = fixture();
        fx.store.inject_failure(WriteOp::Create, EntityPrefix::Bld);
        let session = fx.session.clone();
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);

        let form = NewBlade {
            code: "SN-5".to_string(),
            branch: None,
            blade_type: None,
        };
        assert!(matches!(
            lifecycle.register_blade(form),
            Err(LifecycleError::Validation(ValidationError::Required("branch")))
        ));
    }

    #[test]
    fn test_inactive_blade_type_rejected() {
        let mut fx = fixture();
        let retired = BladeType {
            id: EntityId::new(EntityPrefix::Bty),
            code: "OLD".to_string(),
            name: "Retired".to_string(),
            active: false,
            description: None,
            created: Utc::now(),
        };
        fx.store.create(&retired).unwrap();

        let session = fx.session.clone();
        let form = NewBlade {
            code: "SN-6".to_string(),
            branch: Some(fx.branch),
            blade_type: Some(retired.id),
        };
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
        assert!(matches!(
            lifecycle.register_blade(form),
            Err(LifecycleError::InactiveBladeType(code)) if code == "OLD"
        ));
    }

    #[test]
    fn test_sharpening_requires_kind_and_timestamp() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let form = new_blade(&fx, "SN-8");
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
        lifecycle.register_blade(form).unwrap();

        let missing_kind = SharpeningForm {
            timestamp: Some(at(1, 1)),
            ..Default::default()
        };
        assert!(matches!(
            lifecycle.record_sharpening("SN-8", missing_kind),
            Err(LifecycleError::Validation(ValidationError::Required("sharpening kind")))
        ));

        let missing_time = SharpeningForm {
            kind: Some(SharpeningKind::Face),
            ..Default::default()
        };
        assert!(matches!(
            lifecycle.record_sharpening("SN-8", missing_time),
            Err(LifecycleError::Validation(ValidationError::Required("timestamp")))
        ));
    }

    #[test]
    fn test_sharpening_unknown_blade() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);

        assert!(matches!(
            lifecycle.record_sharpening("NOPE", sharpening(SharpeningKind::Edge, at(1, 1), false)),
            Err(LifecycleError::BladeNotFound(_))
        ));
    }

    #[test]
    fn test_failed_event_write_surfaces_generic_error() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let form = new_blade(&fx, "SN-9");
        {
            let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
            lifecycle.register_blade(form).unwrap();
        }
        fx.store.inject_failure(WriteOp::Create, EntityPrefix::Shp);

        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
        let err = lifecycle
            .record_sharpening("SN-9", sharpening(SharpeningKind::Edge, at(1, 1), true))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Collaborator { .. }));
        assert_eq!(err.to_string(), RETRY_MESSAGE);

        let outcome = lifecycle.lookup("SN-9").unwrap();
        assert!(outcome.can_sharpen());
        assert!(outcome.snapshot().unwrap().history.is_empty());
    }

    #[test]
    fn test_partial_termination_keeps_event() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let form = new_blade(&fx, "SN-10");
        {
            let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
            lifecycle.register_blade(form).unwrap();
        }
        fx.store.inject_failure(WriteOp::Update, EntityPrefix::Bld);

        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
        let err = lifecycle
            .record_sharpening("SN-10", sharpening(SharpeningKind::Face, at(2, 2), true))
            .unwrap_err();
        let (event, code) = match err {
            LifecycleError::PartialTermination { event, code, .. } => (event, code),
            other => panic!("expected partial termination, got {:?}", other),
        };
        assert_eq!(code, "SN-10");

        let outcome = lifecycle.lookup("SN-10").unwrap();
        let snapshot = outcome.snapshot().unwrap();
        assert!(!snapshot.blade.terminal_sharpening_done);
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].id, event);
    }

    #[test]
    fn test_event_copies_branch_at_creation() {
        let mut fx = fixture();
        let session = fx.session.clone();
        let form = new_blade(&fx, "SN-11");
        let mut lifecycle = BladeLifecycle::new(&mut fx.store, &session);
        lifecycle.register_blade(form).unwrap();

        let mut form = sharpening(SharpeningKind::Edge, at(7, 7), false);
        form.notes = Some("  teeth 3-5 chipped ".to_string());
        let receipt = lifecycle.record_sharpening("SN-11", form).unwrap();

        assert_eq!(receipt.event.branch, fx.branch);
        assert_eq!(receipt.event.notes.as_deref(), Some("teeth 3-5 chipped"));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = LookupOutcome::NotFound {
            code: "ZZ-9999".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["code"], "ZZ-9999");
    }
}
