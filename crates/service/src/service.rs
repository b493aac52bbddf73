//! The compliance service - one entry point over all engines
//!
//! Owns the wiring: one audit chain, one record store, and the three
//! engines sharing them. Callers (HTTP layer, CLI, batch jobs) talk to
//! this facade and never to an engine directly, so cross-component
//! rules - a held impound restricting cancellation, impound cases
//! auto-opened at creation - are enforced in exactly one place.

use crate::error::ServiceResult;
use fineflow_audit::{AuditChain, AuditEntry};
use fineflow_catalog::InfractionCatalog;
use fineflow_contest::{
    ContestationRecord, ContestationWorkflow, InMemoryContestationStore, SubmitContestation,
};
use fineflow_core::{Actor, Amount, Clock, SystemClock, SystemConfig};
use fineflow_impound::{ImpoundCase, ImpoundCaseManager, InMemoryImpoundStore, ReleaseDecision};
use fineflow_lifecycle::{
    ContraventionRecord, CreateContravention, InMemoryRecordStore, LifecycleEngine,
    LifecycleError, Notifier, NullNotifier, OffenderDirectory, OffenderRef, RecordStore,
    StaticDirectory,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// What creation hands back: the record, plus the impound case that
/// was auto-opened when the violation type requires one.
#[derive(Debug, Clone)]
pub struct ContraventionTicket {
    pub record: ContraventionRecord,
    pub impound_case: Option<ImpoundCase>,
}

/// The wired-up compliance system.
pub struct ComplianceService {
    catalog: Arc<InfractionCatalog>,
    chain: Arc<AuditChain>,
    lifecycle: Arc<LifecycleEngine>,
    contest: ContestationWorkflow,
    impound: ImpoundCaseManager,
    clock: Arc<dyn Clock>,
}

impl ComplianceService {
    /// Wire a service with an in-memory audit chain.
    pub fn new(
        config: SystemConfig,
        catalog: Arc<InfractionCatalog>,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn OffenderDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> ServiceResult<Self> {
        let chain = Arc::new(AuditChain::new(Arc::clone(&clock)));
        Self::wire(config, catalog, clock, directory, notifier, chain)
    }

    /// Wire a service whose audit chain is mirrored to a JSONL file;
    /// an existing file is replayed and verified first.
    pub fn with_audit_file(
        path: impl AsRef<Path>,
        config: SystemConfig,
        catalog: Arc<InfractionCatalog>,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn OffenderDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> ServiceResult<Self> {
        let chain = Arc::new(AuditChain::with_file(path, Arc::clone(&clock))?);
        Self::wire(config, catalog, clock, directory, notifier, chain)
    }

    /// Default configuration, seeded catalog, wall clock, permissive
    /// directory, no notifications. Meant for demos and tests.
    pub fn with_defaults() -> ServiceResult<Self> {
        Self::new(
            SystemConfig::default(),
            Arc::new(InfractionCatalog::with_defaults()),
            Arc::new(SystemClock),
            Arc::new(StaticDirectory::permissive()),
            Arc::new(NullNotifier),
        )
    }

    fn wire(
        config: SystemConfig,
        catalog: Arc<InfractionCatalog>,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn OffenderDirectory>,
        notifier: Arc<dyn Notifier>,
        chain: Arc<AuditChain>,
    ) -> ServiceResult<Self> {
        let records: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());

        let lifecycle = Arc::new(LifecycleEngine::new(
            config.clone(),
            Arc::clone(&catalog),
            Arc::clone(&records),
            Arc::clone(&chain),
            Arc::clone(&clock),
            directory,
            Arc::clone(&notifier),
        ));
        let contest = ContestationWorkflow::new(
            Arc::new(InMemoryContestationStore::new()),
            Arc::clone(&lifecycle),
            Arc::clone(&chain),
            Arc::clone(&clock),
            notifier,
        );
        let impound = ImpoundCaseManager::new(
            &config,
            Arc::new(InMemoryImpoundStore::new()),
            Arc::clone(&records),
            Arc::clone(&chain),
            Arc::clone(&clock),
        )?;

        info!("compliance service wired");
        Ok(Self {
            catalog,
            chain,
            lifecycle,
            contest,
            impound,
            clock,
        })
    }

    // === Records ===

    /// Create a contravention. When the violation type requires
    /// impound, a case is opened in the same call, located at the
    /// offense site until the vehicle is moved.
    pub fn create_contravention(
        &self,
        req: CreateContravention,
    ) -> ServiceResult<ContraventionTicket> {
        let agent = req.agent.clone();
        let client_info = req.client_info.clone();
        let record = self.lifecycle.create(req)?;

        let vt = self
            .catalog
            .get(&record.violation_type_id)
            .map_err(LifecycleError::from)?;
        let impound_case = if vt.requires_impound {
            Some(
                self.impound
                    .open(&record.id, record.location.clone(), &agent, client_info)?,
            )
        } else {
            None
        };

        Ok(ContraventionTicket {
            record,
            impound_case,
        })
    }

    /// Cancel a record. The current impound custody status feeds the
    /// authorization policy: a held vehicle restricts cancellation to
    /// supervisors.
    pub fn cancel_contravention(
        &self,
        record_id: &str,
        actor: &Actor,
        reason: Option<String>,
        client_info: Option<String>,
    ) -> ServiceResult<ContraventionRecord> {
        let held = self.impound.held_for_record(record_id)?;
        Ok(self
            .lifecycle
            .cancel(record_id, actor, held, reason, client_info)?)
    }

    /// Record a payment confirmed by the external gateway.
    pub fn confirm_payment(
        &self,
        record_id: &str,
        amount_paid: Amount,
        reference: Option<String>,
        client_info: Option<String>,
    ) -> ServiceResult<ContraventionRecord> {
        Ok(self
            .lifecycle
            .confirm_payment(record_id, amount_paid, reference, client_info)?)
    }

    /// Amount due right now, late penalty included.
    pub fn amount_due(&self, record_id: &str) -> ServiceResult<Amount> {
        let record = self.lifecycle.record(record_id)?;
        Ok(self
            .lifecycle
            .amount_due_with_penalty(&record, self.clock.now())?)
    }

    pub fn record(&self, record_id: &str) -> ServiceResult<ContraventionRecord> {
        Ok(self.lifecycle.record(record_id)?)
    }

    /// Repeat-offense check for an offender/violation-type pair.
    pub fn query_recidive(
        &self,
        offender: &OffenderRef,
        violation_type_id: &str,
    ) -> ServiceResult<bool> {
        Ok(self.lifecycle.query_recidive(offender, violation_type_id)?)
    }

    // === Contestations ===

    pub fn submit_contestation(
        &self,
        req: SubmitContestation,
    ) -> ServiceResult<ContestationRecord> {
        Ok(self.contest.submit(req)?)
    }

    pub fn begin_contestation_review(
        &self,
        contestation_id: &str,
        reviewer: &Actor,
    ) -> ServiceResult<ContestationRecord> {
        Ok(self.contest.begin_review(contestation_id, reviewer)?)
    }

    pub fn decide_contestation(
        &self,
        contestation_id: &str,
        reviewer: &Actor,
        accept: bool,
        rationale: impl Into<String>,
        client_info: Option<String>,
    ) -> ServiceResult<ContestationRecord> {
        Ok(self
            .contest
            .decide(contestation_id, reviewer, accept, rationale, client_info)?)
    }

    pub fn contestation(&self, id: &str) -> ServiceResult<ContestationRecord> {
        Ok(self.contest.contestation(id)?)
    }

    // === Impound ===

    /// Open an impound case manually, for types that do not impound
    /// automatically. At most one case ever exists per record.
    pub fn open_impound_case(
        &self,
        record_id: &str,
        location: impl Into<String>,
        actor: &Actor,
        client_info: Option<String>,
    ) -> ServiceResult<ImpoundCase> {
        Ok(self.impound.open(record_id, location, actor, client_info)?)
    }

    pub fn release_impound_case(
        &self,
        case_id: &str,
        fee_paid_confirmed: bool,
        actor: &Actor,
        client_info: Option<String>,
    ) -> ServiceResult<ImpoundCase> {
        Ok(self
            .impound
            .release(case_id, fee_paid_confirmed, actor, client_info)?)
    }

    pub fn impound_release_eligibility(
        &self,
        case_id: &str,
        fee_paid_confirmed: bool,
    ) -> ServiceResult<ReleaseDecision> {
        Ok(self
            .impound
            .eligible_for_release(case_id, fee_paid_confirmed)?)
    }

    pub fn impound_fee_accrued(&self, case_id: &str) -> ServiceResult<Amount> {
        Ok(self.impound.accrued_fee(case_id)?)
    }

    pub fn impound_case(&self, case_id: &str) -> ServiceResult<ImpoundCase> {
        Ok(self.impound.case(case_id)?)
    }

    // === Audit ===

    /// Verify the hash chain from `from_sequence` (or the start).
    pub fn verify_audit_chain(&self, from_sequence: Option<u64>) -> ServiceResult<()> {
        Ok(self.chain.verify(from_sequence)?)
    }

    /// All audit entries targeting one record or case.
    pub fn audit_trail(&self, target_id: &str) -> Vec<AuditEntry> {
        self.chain.entries_for_target(target_id)
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.chain.entries()
    }

    pub fn audit_len(&self) -> usize {
        self.chain.len()
    }
}
