//! Contestation workflow logic

use crate::contestation::{ContestationRecord, ContestationStatus, ContestationStore};
use crate::error::{ContestError, ContestResult};
use fineflow_audit::{AuditAction, AuditChain, EntryDraft};
use fineflow_core::{Actor, Clock};
use fineflow_lifecycle::{
    LifecycleEngine, Notification, NotificationKind, Notifier, RecordStatus,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Input for filing a contestation
#[derive(Debug, Clone)]
pub struct SubmitContestation {
    pub record_id: String,
    pub claimant_name: String,
    pub claimant_contact: String,
    pub justification: String,
    pub documents: Vec<String>,
    pub client_info: Option<String>,
}

/// Drives disputes from submission to decision.
///
/// All record status changes go through the lifecycle engine; this
/// workflow owns only the contestation records themselves.
pub struct ContestationWorkflow {
    store: Arc<dyn ContestationStore>,
    lifecycle: Arc<LifecycleEngine>,
    chain: Arc<AuditChain>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    min_justification_len: usize,
}

impl ContestationWorkflow {
    pub fn new(
        store: Arc<dyn ContestationStore>,
        lifecycle: Arc<LifecycleEngine>,
        chain: Arc<AuditChain>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let min_justification_len = lifecycle.config().contestation_min_justification_len;
        Self {
            store,
            lifecycle,
            chain,
            clock,
            notifier,
            min_justification_len,
        }
    }

    /// File a dispute against a record.
    ///
    /// The record moves to Contested and its payment deadline is
    /// suspended by the contestation window.
    pub fn submit(&self, req: SubmitContestation) -> ContestResult<ContestationRecord> {
        let record = self.lifecycle.record(&req.record_id)?;

        if !record.status.can_transition(RecordStatus::Contested) {
            return Err(ContestError::RecordNotContestable(record.status));
        }

        let justification = req.justification.trim();
        if justification.chars().count() < self.min_justification_len {
            return Err(ContestError::JustificationTooShort {
                actual: justification.chars().count(),
                minimum: self.min_justification_len,
            });
        }

        if req.claimant_name.trim().is_empty() {
            return Err(ContestError::Validation(
                "claimant name is required".to_string(),
            ));
        }

        if let Some(active) = self.store.active_for_record(&req.record_id)? {
            return Err(ContestError::ActiveContestationExists(active.record_id));
        }

        let updated = self.lifecycle.mark_contested(&req.record_id)?;

        let contestation = ContestationRecord {
            id: format!("CST-{}", Uuid::new_v4().simple()),
            record_id: req.record_id.clone(),
            submitted_at: self.clock.now(),
            claimant_name: req.claimant_name,
            claimant_contact: req.claimant_contact,
            justification: justification.to_string(),
            documents: req.documents,
            status: ContestationStatus::Pending,
            reviewer_id: None,
            rationale: None,
            decided_at: None,
        };
        self.store.insert(contestation.clone())?;

        let mut draft = EntryDraft::new(AuditAction::ContestationSubmitted, &req.record_id)
            .payload(json!({
                "contestation_id": contestation.id,
                "claimant_name": contestation.claimant_name,
                "documents": contestation.documents,
                "deadline_suspended_until": updated.payment_deadline.to_rfc3339(),
            }));
        if let Some(info) = req.client_info {
            draft = draft.client_info(info);
        }
        if let Err(e) = self.chain.append(draft) {
            // Unwind both state changes: drop the contestation and put
            // the record back to Unpaid with its original deadline
            if let Err(remove_err) = self.store.remove(&contestation.id) {
                error!(contestation = %contestation.id, error = %remove_err, "rollback after failed audit append did not apply");
            }
            self.lifecycle.restore_snapshot(&record);
            return Err(fatal_or_internal(e));
        }

        info!(contestation = %contestation.id, record = %req.record_id, "contestation submitted");
        Ok(contestation)
    }

    /// Pending -> UnderReview; assigns the reviewer.
    pub fn begin_review(
        &self,
        contestation_id: &str,
        reviewer: &Actor,
    ) -> ContestResult<ContestationRecord> {
        if !reviewer.role.is_supervisory() {
            return Err(ContestError::PermissionDenied);
        }

        let mut contestation = self.store.get(contestation_id)?;
        if contestation.status != ContestationStatus::Pending {
            return Err(ContestError::AlreadyDecided(contestation.status));
        }

        contestation.status = ContestationStatus::UnderReview;
        contestation.reviewer_id = Some(reviewer.id.clone());
        self.store.update(contestation)
    }

    /// Decide a contestation.
    ///
    /// Accept: the record is cancelled through the lifecycle engine,
    /// bypassing the direct-cancellation window; the audit payload
    /// references both the contestation and the record's original
    /// creation-entry hash. Reject: the record returns to Unpaid with
    /// a fresh deadline counted from now.
    pub fn decide(
        &self,
        contestation_id: &str,
        reviewer: &Actor,
        accept: bool,
        rationale: impl Into<String>,
        client_info: Option<String>,
    ) -> ContestResult<ContestationRecord> {
        if !reviewer.role.is_supervisory() {
            return Err(ContestError::PermissionDenied);
        }

        let rationale = rationale.into();
        if rationale.trim().is_empty() {
            return Err(ContestError::Validation(
                "a decision rationale is required".to_string(),
            ));
        }

        let mut contestation = self.store.get(contestation_id)?;
        if !contestation.status.is_active() {
            return Err(ContestError::AlreadyDecided(contestation.status));
        }
        let prior_contestation = contestation.clone();

        let record = self.lifecycle.record(&contestation.record_id)?;
        let now = self.clock.now();

        let (action, payload) = if accept {
            self.lifecycle
                .cancel_for_contestation(&contestation.record_id)?;
            contestation.status = ContestationStatus::Accepted;
            (
                AuditAction::ContestationAccepted,
                json!({
                    "contestation_id": contestation.id,
                    "create_entry_hash": record.create_entry_hash,
                    "rationale": rationale,
                }),
            )
        } else {
            let reopened = self
                .lifecycle
                .reopen_after_contestation(&contestation.record_id)?;
            contestation.status = ContestationStatus::Rejected;
            (
                AuditAction::ContestationRejected,
                json!({
                    "contestation_id": contestation.id,
                    "rationale": rationale,
                    "new_deadline": reopened.payment_deadline.to_rfc3339(),
                }),
            )
        };

        contestation.reviewer_id = Some(reviewer.id.clone());
        contestation.rationale = Some(rationale);
        contestation.decided_at = Some(now);
        let decided = self.store.update(contestation)?;

        let mut draft = EntryDraft::new(action, &decided.record_id)
            .actor(&reviewer.id)
            .payload(payload);
        if let Some(info) = client_info {
            draft = draft.client_info(info);
        }
        if let Err(e) = self.chain.append(draft) {
            // Put the contestation and the record back as they were
            if let Err(restore_err) = self.store.update(prior_contestation) {
                error!(contestation = %decided.id, error = %restore_err, "rollback after failed audit append did not apply");
            }
            self.lifecycle.restore_snapshot(&record);
            return Err(fatal_or_internal(e));
        }

        info!(
            contestation = %decided.id,
            record = %decided.record_id,
            accepted = accept,
            "contestation decided"
        );

        if let Err(e) = self.notifier.notify(Notification {
            kind: NotificationKind::ContestationDecided,
            record_id: decided.record_id.clone(),
            message: format!(
                "Contestation {} was {}",
                decided.id,
                if accept { "accepted" } else { "rejected" }
            ),
        }) {
            warn!(error = %e, "notification dispatch failed");
        }

        Ok(decided)
    }

    /// Read a contestation
    pub fn contestation(&self, id: &str) -> ContestResult<ContestationRecord> {
        self.store.get(id)
    }
}

fn fatal_or_internal(e: fineflow_audit::AuditError) -> ContestError {
    ContestError::Lifecycle(e.into())
}
