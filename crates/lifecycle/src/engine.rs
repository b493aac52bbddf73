//! Lifecycle engine - the sole mutator of record status
//!
//! Coordinates catalog lookup, recidive detection, fine calculation,
//! the authorization policy and the audit chain. Every mutating
//! operation appends exactly one audit entry: the state change commits
//! first and the append comes last, and a failed append compensates
//! the state change so no mutation survives without its entry.

use crate::authz::{AuthorizationPolicy, DenialReason};
use crate::directory::{Notification, NotificationKind, Notifier, OffenderDirectory};
use crate::error::{LifecycleError, LifecycleResult};
use crate::recidive::RecidiveDetector;
use crate::record::{ContraventionRecord, OffenderRef, RecordStatus};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use fineflow_audit::{AuditAction, AuditChain, EntryDraft};
use fineflow_calc as calc;
use fineflow_catalog::InfractionCatalog;
use fineflow_core::{Actor, Amount, Clock, SystemConfig};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Bounded internal retry on optimistic store conflicts
const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// Input for creating a contravention
#[derive(Debug, Clone)]
pub struct CreateContravention {
    pub agent: Actor,
    pub violation_type_id: String,
    pub offender: OffenderRef,
    pub offense_time: DateTime<Utc>,
    pub location: String,
    pub accident: bool,
    pub notes: Option<String>,
    pub client_info: Option<String>,
}

/// The contravention state machine orchestrator.
///
/// Other components (contestation workflow, impound manager, service
/// facade) request status changes through these operations and never
/// write status directly.
pub struct LifecycleEngine {
    config: SystemConfig,
    catalog: Arc<InfractionCatalog>,
    store: Arc<dyn RecordStore>,
    chain: Arc<AuditChain>,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn OffenderDirectory>,
    notifier: Arc<dyn Notifier>,
    policy: AuthorizationPolicy,
    recidive: RecidiveDetector,
}

impl LifecycleEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SystemConfig,
        catalog: Arc<InfractionCatalog>,
        store: Arc<dyn RecordStore>,
        chain: Arc<AuditChain>,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn OffenderDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let policy = AuthorizationPolicy::new(&config);
        let recidive = RecidiveDetector::new(Arc::clone(&store), config.recidive_window());
        Self {
            config,
            catalog,
            store,
            chain,
            clock,
            directory,
            notifier,
            policy,
            recidive,
        }
    }

    /// Create a contravention record.
    ///
    /// Requires at least one offender reference that resolves in the
    /// external directory. Computes the recidive flag, the aggravated
    /// amount and the payment deadline, then appends a `RecordCreated`
    /// entry whose hash is anchored on the record.
    pub fn create(&self, req: CreateContravention) -> LifecycleResult<ContraventionRecord> {
        let now = self.clock.now();

        if !req.offender.has_reference() {
            return Err(LifecycleError::Validation(
                "at least one offender reference (vehicle or person) is required".to_string(),
            ));
        }
        if !self.offender_resolves(&req.offender) {
            return Err(LifecycleError::Validation(
                "no offender reference resolves in the directory".to_string(),
            ));
        }
        if req.location.trim().is_empty() {
            return Err(LifecycleError::Validation("location is required".to_string()));
        }

        let vt = self.catalog.get(&req.violation_type_id)?;
        let recidive = self
            .recidive
            .has_recidive(&req.offender, &vt.id, now)?;
        let base = calc::base_amount(vt)?;
        let amount_due = calc::aggravated_amount(
            base,
            req.accident,
            recidive,
            vt.accident_penalty,
            vt.recidive_percent,
        )?;

        let uid = Uuid::new_v4().simple().to_string();
        let id = format!("CTV-{uid}");
        let number = format!(
            "CTV-{}-{}",
            req.offense_time.format("%Y%m%d"),
            &uid[..8].to_uppercase()
        );
        let payment_deadline = req.offense_time + self.config.standard_payment_window();

        let record = ContraventionRecord {
            id: id.clone(),
            number,
            agent_id: req.agent.id.clone(),
            violation_type_id: vt.id.clone(),
            offender: req.offender,
            offense_time: req.offense_time,
            location: req.location,
            amount_due,
            accident: req.accident,
            recidive,
            notes: req.notes,
            status: RecordStatus::Unpaid,
            payment_deadline,
            paid_at: None,
            created_at: now,
            create_entry_hash: String::new(),
            version: 0,
        };

        let mut draft = EntryDraft::new(AuditAction::RecordCreated, &id)
            .actor(&req.agent.id)
            .payload(json!({
                "number": record.number,
                "violation_type": vt.id,
                "legal_code": vt.legal_code,
                "vehicle_plate": record.offender.vehicle_plate,
                "person_id": record.offender.person_id,
                "amount_due": amount_due,
                "accident": req.accident,
                "recidive": recidive,
                "payment_deadline": payment_deadline.to_rfc3339(),
            }));
        if let Some(ref info) = req.client_info {
            draft = draft.client_info(info.clone());
        }

        self.store.insert(record.clone())?;
        let entry = match self.chain.append(draft) {
            Ok(entry) => entry,
            Err(e) => {
                // Unwind the insert so no record exists without its entry
                if let Err(remove_err) = self.store.remove(&id) {
                    error!(record = %id, error = %remove_err, "rollback after failed audit append did not apply");
                }
                return Err(e.into());
            }
        };
        let record = self.update_with_retry(&id, |r| {
            r.create_entry_hash = entry.hash.clone();
            Ok(())
        })?;
        info!(record = %record.id, amount = %amount_due, recidive, "contravention created");

        self.dispatch(Notification {
            kind: NotificationKind::RecordCreated,
            record_id: record.id.clone(),
            message: format!(
                "Contravention {} recorded; {} due by {}",
                record.number,
                amount_due,
                payment_deadline.format("%Y-%m-%d")
            ),
        });

        Ok(record)
    }

    /// Cancel a record, subject to the authorization policy.
    ///
    /// `impound_held` is the caller-supplied status of any associated
    /// impound case; a held case restricts cancellation to supervisors.
    /// Cancelling a Paid record voids the payment in the audit payload;
    /// the refund itself is executed externally.
    pub fn cancel(
        &self,
        record_id: &str,
        actor: &Actor,
        impound_held: bool,
        reason: Option<String>,
        client_info: Option<String>,
    ) -> LifecycleResult<ContraventionRecord> {
        let now = self.clock.now();
        let record = self.store.get(record_id)?;

        if record.status == RecordStatus::Cancelled {
            return Err(LifecycleError::InvalidState {
                from: RecordStatus::Cancelled,
                to: RecordStatus::Cancelled,
            });
        }

        let decision = self.policy.can_cancel(&record, impound_held, actor, now);
        if !decision.granted {
            return Err(LifecycleError::PermissionDenied(
                decision.denial.unwrap_or(DenialReason::NoGrant),
            ));
        }

        let payment_voided = record.status == RecordStatus::Paid;
        let updated =
            self.update_with_retry(record_id, |r| r.transition(RecordStatus::Cancelled))?;

        let mut draft = EntryDraft::new(AuditAction::RecordCancelled, record_id)
            .actor(&actor.id)
            .payload(json!({
                "reason": reason,
                "payment_voided": payment_voided,
                "actor_role": actor.role,
            }));
        if let Some(info) = client_info {
            draft = draft.client_info(info);
        }
        if let Err(e) = self.chain.append(draft) {
            self.restore_snapshot(&record);
            return Err(e.into());
        }
        info!(record = %record_id, by = %actor.id, payment_voided, "contravention cancelled");

        self.dispatch(Notification {
            kind: NotificationKind::RecordCancelled,
            record_id: record_id.to_string(),
            message: format!("Contravention {} cancelled", updated.number),
        });

        Ok(updated)
    }

    /// Record a confirmed payment outcome (the gateway protocol lives
    /// outside the core).
    ///
    /// Unpaid -> Paid only. The confirmed amount must equal the amount
    /// due including any late penalty at confirmation time.
    pub fn confirm_payment(
        &self,
        record_id: &str,
        amount_paid: Amount,
        reference: Option<String>,
        client_info: Option<String>,
    ) -> LifecycleResult<ContraventionRecord> {
        let now = self.clock.now();
        let record = self.store.get(record_id)?;

        if record.status != RecordStatus::Unpaid {
            return Err(LifecycleError::InvalidState {
                from: record.status,
                to: RecordStatus::Paid,
            });
        }

        let penalty = self.late_penalty(&record, now)?;
        let due = record
            .amount_due
            .checked_add(&penalty)
            .ok_or_else(|| LifecycleError::Internal("amount overflow".to_string()))?;

        if amount_paid != due {
            return Err(LifecycleError::AmountMismatch {
                expected: due,
                actual: amount_paid,
            });
        }

        let updated = self.update_with_retry(record_id, |r| {
            r.transition(RecordStatus::Paid)?;
            r.paid_at = Some(now);
            Ok(())
        })?;

        let mut draft = EntryDraft::new(AuditAction::PaymentConfirmed, record_id).payload(json!({
            "amount_paid": amount_paid,
            "late_penalty": penalty,
            "reference": reference,
        }));
        if let Some(info) = client_info {
            draft = draft.client_info(info);
        }
        if let Err(e) = self.chain.append(draft) {
            self.restore_snapshot(&record);
            return Err(e.into());
        }
        info!(record = %record_id, amount = %amount_paid, "payment confirmed");

        self.dispatch(Notification {
            kind: NotificationKind::PaymentConfirmed,
            record_id: record_id.to_string(),
            message: format!("Payment of {} confirmed for {}", amount_paid, updated.number),
        });

        Ok(updated)
    }

    /// Amount due right now, including any late penalty
    pub fn amount_due_with_penalty(
        &self,
        record: &ContraventionRecord,
        now: DateTime<Utc>,
    ) -> LifecycleResult<Amount> {
        let penalty = self.late_penalty(record, now)?;
        record
            .amount_due
            .checked_add(&penalty)
            .ok_or_else(|| LifecycleError::Internal("amount overflow".to_string()))
    }

    /// Unpaid -> Contested; suspends the deadline by the contestation
    /// window. Called by the contestation workflow only.
    pub fn mark_contested(&self, record_id: &str) -> LifecycleResult<ContraventionRecord> {
        let window = self.config.contestation_window();
        self.update_with_retry(record_id, |r| {
            r.transition(RecordStatus::Contested)?;
            r.payment_deadline = r.payment_deadline + window;
            Ok(())
        })
    }

    /// Contested -> Unpaid after a rejected contestation; the deadline
    /// restarts from now, not from the original offense date.
    pub fn reopen_after_contestation(
        &self,
        record_id: &str,
    ) -> LifecycleResult<ContraventionRecord> {
        let deadline = self.clock.now() + self.config.standard_payment_window();
        self.update_with_retry(record_id, |r| {
            r.transition(RecordStatus::Unpaid)?;
            r.payment_deadline = deadline;
            Ok(())
        })
    }

    /// Contested -> Cancelled on an accepted contestation. Bypasses the
    /// direct-cancellation window by design; the reviewing supervisor's
    /// authority was already checked by the workflow.
    pub fn cancel_for_contestation(
        &self,
        record_id: &str,
    ) -> LifecycleResult<ContraventionRecord> {
        self.update_with_retry(record_id, |r| r.transition(RecordStatus::Cancelled))
    }

    /// Best-effort compensation after a failed audit append: writes the
    /// prior status, deadline and payment timestamp back so the state
    /// change does not survive without its entry. Bypasses the
    /// transition matrix on purpose; a failure to restore is logged,
    /// not raised, because the caller is already returning the append
    /// error.
    pub fn restore_snapshot(&self, prior: &ContraventionRecord) {
        let result = self.update_with_retry(&prior.id, |r| {
            r.status = prior.status;
            r.payment_deadline = prior.payment_deadline;
            r.paid_at = prior.paid_at;
            Ok(())
        });
        if let Err(e) = result {
            error!(record = %prior.id, error = %e, "rollback after failed audit append did not apply");
        }
    }

    /// Read a record
    pub fn record(&self, record_id: &str) -> LifecycleResult<ContraventionRecord> {
        self.store.get(record_id)
    }

    /// Trailing-window repeat-offense query at the current time
    pub fn query_recidive(
        &self,
        offender: &OffenderRef,
        violation_type_id: &str,
    ) -> LifecycleResult<bool> {
        self.recidive
            .has_recidive(offender, violation_type_id, self.clock.now())
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn late_penalty(
        &self,
        record: &ContraventionRecord,
        now: DateTime<Utc>,
    ) -> LifecycleResult<Amount> {
        Ok(calc::late_penalty(
            record.amount_due,
            record.days_overdue(now),
            self.config.late_penalty_percent,
        )?)
    }

    fn offender_resolves(&self, offender: &OffenderRef) -> bool {
        let vehicle_ok = offender
            .vehicle_plate
            .as_deref()
            .is_some_and(|p| self.directory.vehicle_exists(p));
        let person_ok = offender
            .person_id
            .as_deref()
            .is_some_and(|p| self.directory.person_exists(p));
        vehicle_ok || person_ok
    }

    /// Re-read, mutate and store with an optimistic version check.
    /// Conflicts are retried a bounded number of times; validation runs
    /// against the freshly read record on every attempt.
    fn update_with_retry<F>(&self, record_id: &str, mutate: F) -> LifecycleResult<ContraventionRecord>
    where
        F: Fn(&mut ContraventionRecord) -> LifecycleResult<()>,
    {
        let mut attempts = 0;
        loop {
            let mut record = self.store.get(record_id)?;
            mutate(&mut record)?;
            match self.store.update(record) {
                Ok(updated) => return Ok(updated),
                Err(LifecycleError::ConcurrencyConflict(id)) => {
                    attempts += 1;
                    if attempts >= MAX_UPDATE_ATTEMPTS {
                        return Err(LifecycleError::ConcurrencyConflict(id));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn dispatch(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(notification) {
            warn!(error = %e, "notification dispatch failed");
        }
    }
}
