//! Workflow engine - drives claims through the stage pipeline
//!
//! A cycle runs four stage passes in fixed order. Each pass leases the claims
//! in its input status, processes them concurrently, and commits every
//! claim's transition on its own. A claim that cannot advance stays where it
//! is; nothing a provider does can abort the rest of the batch.

use crate::escalation::{EscalationHandler, EscalationOutcome};
use crate::{WorkflowConfig, WorkflowError, WorkflowMetrics};
use aegis_domain::traits::{
    ClaimQuery, ClaimStore, CommitOutcome, CredibilityScorer, EvidenceProvider, ExpertProvider,
    Lease, Notifier, SuspicionScorer,
};
use aegis_domain::{
    Claim, ClaimId, ClaimStatus, EvidenceBundle, ProviderError, TransitionError,
    VerificationEvent, VerifiedRecord,
};
use aegis_policy::{EscalationEvaluator, FusionResolver, PolicyConfig, Triage, TriageDecision};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// One pass of the pipeline, named after the work it does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// `new` → `scored`
    Score,
    /// `scored` → `archived` | `fused-pending`
    Triage,
    /// `fused-pending` → `resolved` | `escalated`
    Decide,
    /// `failed` → `escalated`, then `escalated` → `resolved` | `failed`
    Escalate,
}

impl Stage {
    /// Stages in cycle order
    pub const ALL: [Stage; 4] = [Stage::Score, Stage::Triage, Stage::Decide, Stage::Escalate];

    /// Status of the claims this stage picks up
    pub fn input_status(&self) -> ClaimStatus {
        match self {
            Stage::Score => ClaimStatus::New,
            Stage::Triage => ClaimStatus::Scored,
            Stage::Decide => ClaimStatus::FusedPending,
            Stage::Escalate => ClaimStatus::Escalated,
        }
    }

    /// Get the stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Score => "score",
            Stage::Triage => "triage",
            Stage::Decide => "decide",
            Stage::Escalate => "escalate",
        }
    }

    /// Parse a stage name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "score" => Some(Stage::Score),
            "triage" => Some(Stage::Triage),
            "decide" => Some(Stage::Decide),
            "escalate" => Some(Stage::Escalate),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one stage pass
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    /// Stage that ran
    pub stage: Stage,
    /// Claims leased for the pass
    pub selected: usize,
    /// Committed transitions, by target status
    pub transitions: BTreeMap<ClaimStatus, usize>,
    /// Claims left in place after a transient or malformed provider response
    pub deferred: usize,
    /// Claims left in place after a permanent failure, malformed evidence, or a failed write
    pub parked: usize,
    /// Commits lost to a concurrent writer
    pub conflicts: usize,
    /// Verified records written
    pub records: usize,
    /// Failed claims moved back to `escalated` (escalate stage only)
    pub requeued: usize,
    /// Escalated claims skipped because their retry budget is spent
    pub exhausted: usize,
    /// Expert adjudications requested
    pub expert_attempts: usize,
    /// Expert adjudications that failed
    pub expert_failures: usize,
}

impl StageReport {
    /// Empty report for a stage
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            selected: 0,
            transitions: BTreeMap::new(),
            deferred: 0,
            parked: 0,
            conflicts: 0,
            records: 0,
            requeued: 0,
            exhausted: 0,
            expert_attempts: 0,
            expert_failures: 0,
        }
    }

    /// Total committed transitions
    pub fn advanced(&self) -> usize {
        self.transitions.values().sum()
    }

    fn absorb(&mut self, result: ClaimResult) {
        match result.outcome {
            Outcome::Committed { to, record } => {
                *self.transitions.entry(to).or_insert(0) += 1;
                if record {
                    self.records += 1;
                }
            }
            Outcome::Deferred => self.deferred += 1,
            Outcome::Parked => self.parked += 1,
            Outcome::Conflict => self.conflicts += 1,
            Outcome::Exhausted => self.exhausted += 1,
        }
        if let Some(succeeded) = result.expert {
            self.expert_attempts += 1;
            if !succeeded {
                self.expert_failures += 1;
            }
        }
    }
}

/// Result of one cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Reports of the stages that completed, in order
    pub stages: Vec<StageReport>,
    /// The cycle hit its time bound before every stage completed
    pub timed_out: bool,
    /// Leases released when the cycle was cut short
    pub released_leases: usize,
    /// Expert calls cut off by the time bound, each charged as a failed attempt
    pub interrupted_expert_calls: usize,
    /// Wall-clock duration
    pub duration: Duration,
}

impl CycleReport {
    /// Total committed transitions across stages
    pub fn total_transitions(&self) -> usize {
        self.stages.iter().map(StageReport::advanced).sum()
    }

    /// Total verified records written
    pub fn records(&self) -> usize {
        self.stages.iter().map(|s| s.records).sum()
    }

    /// Report for one stage, if it ran
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

/// What happened to one claim in a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Committed { to: ClaimStatus, record: bool },
    Deferred,
    Parked,
    Conflict,
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
struct ClaimResult {
    outcome: Outcome,
    /// `Some(success)` when the expert was called
    expert: Option<bool>,
}

impl From<Outcome> for ClaimResult {
    fn from(outcome: Outcome) -> Self {
        Self { outcome, expert: None }
    }
}

/// The external collaborators the engine calls
#[derive(Clone)]
pub struct Providers {
    /// Text suspicion scorer
    pub suspicion: Arc<dyn SuspicionScorer>,
    /// Source credibility scorer
    pub credibility: Arc<dyn CredibilityScorer>,
    /// Evidence gatherer
    pub evidence: Arc<dyn EvidenceProvider>,
    /// Expert adjudicator
    pub expert: Arc<dyn ExpertProvider>,
    /// Receiver of verification events
    pub notifier: Arc<dyn Notifier>,
}

/// Severity used to pick which of two scorer failures to act on
fn severity(e: &ProviderError) -> u8 {
    match e {
        ProviderError::Permanent(_) => 2,
        ProviderError::Malformed(_) => 1,
        ProviderError::Timeout(_) | ProviderError::Transient(_) => 0,
    }
}

/// Treat a score outside [0, 1] as a malformed response
fn checked_score(result: Result<f64, ProviderError>, which: &str) -> Result<f64, ProviderError> {
    result.and_then(|score| {
        if (0.0..=1.0).contains(&score) {
            Ok(score)
        } else {
            Err(ProviderError::Malformed(format!(
                "{} score {} is outside [0.0, 1.0]",
                which, score
            )))
        }
    })
}

/// Claim-lifecycle workflow engine
///
/// The engine owns no claim state of its own: every pass queries the store by
/// status. Cycles of one engine are serialised; several engines may share a
/// database because batches are leased.
///
/// # Examples
///
/// ```no_run
/// use aegis_workflow::{LogNotifier, Providers, WorkflowConfig, WorkflowEngine};
/// use aegis_policy::PolicyConfig;
/// use aegis_providers::{KeywordSuspicionScorer, MockEvidence, MockExpert, ProfileCredibilityScorer};
/// use aegis_domain::Verdict;
/// use aegis_store::SqliteStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let providers = Providers {
///     suspicion: Arc::new(KeywordSuspicionScorer::new()),
///     credibility: Arc::new(ProfileCredibilityScorer::new()),
///     evidence: Arc::new(MockEvidence::default()),
///     expert: Arc::new(MockExpert::new(Verdict::Misleading, "Unclear")),
///     notifier: Arc::new(LogNotifier),
/// };
/// let engine = WorkflowEngine::new(
///     SqliteStore::new("aegis.db")?,
///     providers,
///     WorkflowConfig::default(),
///     PolicyConfig::default(),
/// )?;
///
/// engine.submit("Miracle cure found!", serde_json::json!({"handle": "@anon"}))?;
/// let report = engine.run_cycle().await?;
/// println!("{} transitions", report.total_transitions());
/// # Ok(())
/// # }
/// ```
pub struct WorkflowEngine<S> {
    store: Arc<Mutex<S>>,
    providers: Providers,
    config: WorkflowConfig,
    triage: Triage,
    evaluator: EscalationEvaluator,
    resolver: FusionResolver,
    handler: EscalationHandler,
    owner: String,
    cycle_lock: tokio::sync::Mutex<()>,
    /// Escalated claims currently with the expert
    in_flight: Mutex<HashMap<ClaimId, Claim>>,
    metrics: Mutex<WorkflowMetrics>,
}

impl<S> WorkflowEngine<S>
where
    S: ClaimStore + Send,
    S::Error: fmt::Display,
{
    /// Create an engine that owns its store
    pub fn new(
        store: S,
        providers: Providers,
        config: WorkflowConfig,
        policy: PolicyConfig,
    ) -> Result<Self, WorkflowError> {
        Self::with_shared_store(Arc::new(Mutex::new(store)), providers, config, policy)
    }

    /// Create an engine over a store shared with other components
    pub fn with_shared_store(
        store: Arc<Mutex<S>>,
        providers: Providers,
        config: WorkflowConfig,
        policy: PolicyConfig,
    ) -> Result<Self, WorkflowError> {
        config.validate()?;
        policy.validate()?;

        let handler = EscalationHandler::new(
            Arc::clone(&providers.expert),
            config.max_retries,
            config.expert_timeout(),
        );

        Ok(Self {
            store,
            triage: Triage::new(policy.clone()),
            evaluator: EscalationEvaluator::new(policy.clone()),
            resolver: FusionResolver::new(policy),
            handler,
            providers,
            config,
            owner: format!("aegis-{}", uuid::Uuid::now_v7()),
            cycle_lock: tokio::sync::Mutex::new(()),
            in_flight: Mutex::new(HashMap::new()),
            metrics: Mutex::new(WorkflowMetrics::new()),
        })
    }

    /// Use a fixed lease owner name instead of a generated one
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Lease owner name of this engine
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Active configuration
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Snapshot of the accumulated metrics
    pub fn metrics(&self) -> WorkflowMetrics {
        self.lock_metrics().clone()
    }

    /// Reset the metrics counters
    pub fn reset_metrics(&self) {
        self.lock_metrics().reset();
    }

    fn lock_metrics(&self) -> std::sync::MutexGuard<'_, WorkflowMetrics> {
        self.metrics.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<ClaimId, Claim>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut S) -> Result<R, S::Error>) -> Result<R, WorkflowError> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| WorkflowError::Store("store lock poisoned".to_string()))?;
        f(&mut store).map_err(|e| WorkflowError::Store(e.to_string()))
    }

    /// Accept a newly discovered claim in status `new`
    pub fn submit(&self, text: impl Into<String>, source_metadata: Value) -> Result<ClaimId, WorkflowError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(WorkflowError::InvalidClaim("claim text is empty".to_string()));
        }

        let claim = Claim::new(text, source_metadata);
        let id = self.with_store(|store| store.insert_claim(&claim))?;
        tracing::info!(claim_id = %id, "Submitted claim");
        Ok(id)
    }

    /// Get a claim by ID
    pub fn claim(&self, id: ClaimId) -> Result<Option<Claim>, WorkflowError> {
        self.with_store(|store| store.get_claim(id))
    }

    /// Get the verified record for a claim
    pub fn record(&self, claim_id: ClaimId) -> Result<Option<VerifiedRecord>, WorkflowError> {
        self.with_store(|store| store.get_record(claim_id))
    }

    /// Number of claims in each status
    pub fn status_counts(&self) -> Result<BTreeMap<ClaimStatus, usize>, WorkflowError> {
        self.with_store(|store| store.count_by_status())
    }

    /// Run every stage once, in order, under the cycle time bound
    ///
    /// # Errors
    ///
    /// Only store-level failures are returned. When the time bound fires the
    /// cycle is abandoned, this engine's leases are released, and the report
    /// is marked `timed_out`.
    pub async fn run_cycle(&self) -> Result<CycleReport, WorkflowError> {
        let _cycle = self.cycle_lock.lock().await;
        let started = Instant::now();
        let mut stages = Vec::with_capacity(Stage::ALL.len());
        self.lock_in_flight().clear();

        let outcome = tokio::time::timeout(self.config.cycle_timeout(), self.run_stages(&mut stages)).await;

        let mut timed_out = false;
        let mut released_leases = 0;
        let mut interrupted_expert_calls = 0;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.release_own_leases();
                tracing::error!("Cycle aborted: {}", e);
                return Err(e);
            }
            Err(_) => {
                timed_out = true;
                interrupted_expert_calls = self.fail_interrupted_escalations();
                released_leases = self.release_own_leases();
                tracing::warn!(
                    "Cycle exceeded {:?}; abandoned in-flight claims, charged {} interrupted expert calls, released {} leases",
                    self.config.cycle_timeout(),
                    interrupted_expert_calls,
                    released_leases
                );
            }
        }

        let report = CycleReport {
            stages,
            timed_out,
            released_leases,
            interrupted_expert_calls,
            duration: started.elapsed(),
        };
        self.lock_metrics()
            .record_cycle(report.duration.as_millis() as u64, timed_out);

        tracing::info!(
            "Cycle finished in {:?}: {} transitions, {} verified records",
            report.duration,
            report.total_transitions(),
            report.records()
        );
        Ok(report)
    }

    /// Run a single stage pass
    pub async fn run_stage(&self, stage: Stage) -> Result<StageReport, WorkflowError> {
        let _cycle = self.cycle_lock.lock().await;
        self.process_stage(stage).await
    }

    async fn run_stages(&self, stages: &mut Vec<StageReport>) -> Result<(), WorkflowError> {
        for stage in Stage::ALL {
            let report = self.process_stage(stage).await?;
            stages.push(report);
        }
        Ok(())
    }

    /// Charge each expert call the cycle bound cut off as a failed attempt
    fn fail_interrupted_escalations(&self) -> usize {
        let interrupted: Vec<Claim> = self.lock_in_flight().drain().map(|(_, claim)| claim).collect();
        let mut charged = 0;
        for claim in interrupted {
            let mut next = claim.clone();
            let result = match next.record_expert_failure(self.config.max_retries) {
                Ok(()) => self.commit(&next, None),
                Err(e) => self.invalid(&claim, e),
            };
            if let Outcome::Committed { .. } = result.outcome {
                charged += 1;
                tracing::error!(
                    claim_id = %claim.id,
                    "Expert call interrupted by the cycle time bound. Retry count: {}/{}",
                    next.retry_count,
                    self.config.max_retries
                );
            }
        }
        if charged > 0 {
            self.lock_metrics().record_interrupted_expert_calls(charged);
        }
        charged
    }

    fn release_own_leases(&self) -> usize {
        match self.with_store(|store| store.release_leases(&self.owner)) {
            Ok(released) => released,
            Err(e) => {
                tracing::error!("Failed to release leases for {}: {}", self.owner, e);
                0
            }
        }
    }

    fn lease(&self) -> Lease {
        Lease::new(self.owner.clone(), self.config.lease_secs)
    }

    async fn process_stage(&self, stage: Stage) -> Result<StageReport, WorkflowError> {
        let mut report = StageReport::new(stage);

        if stage == Stage::Escalate {
            self.requeue_failed(&mut report)?;
        }

        let query = ClaimQuery::by_status(stage.input_status()).with_limit(self.config.batch_size);
        let lease = self.lease();
        let batch = self.with_store(|store| store.lease_batch(&query, &lease))?;
        report.selected = batch.len();

        if batch.is_empty() {
            tracing::debug!(stage = %stage, "No claims to process");
        } else {
            let results: Vec<ClaimResult> = stream::iter(batch)
                .map(|claim| self.process_claim(stage, claim))
                .buffer_unordered(self.config.max_concurrency)
                .collect()
                .await;
            for result in results {
                report.absorb(result);
            }

            tracing::info!(
                stage = %stage,
                "Stage pass complete: {} selected, {} advanced, {} deferred, {} parked, {} conflicts",
                report.selected,
                report.advanced(),
                report.deferred,
                report.parked,
                report.conflicts
            );
        }

        self.lock_metrics().record_stage(&report);
        Ok(report)
    }

    /// Move failed claims with retry headroom back to `escalated`
    fn requeue_failed(&self, report: &mut StageReport) -> Result<(), WorkflowError> {
        let query = ClaimQuery::by_status(ClaimStatus::Failed)
            .with_retry_headroom(self.config.max_retries)
            .with_limit(self.config.batch_size);
        let lease = self.lease();
        let failed = self.with_store(|store| store.lease_batch(&query, &lease))?;

        for claim in failed {
            let mut next = claim.clone();
            let result = match next.requeue(self.config.max_retries) {
                Ok(()) => self.commit(&next, None),
                Err(e) => self.invalid(&claim, e),
            };
            if let Outcome::Committed { .. } = result.outcome {
                report.requeued += 1;
                tracing::debug!(
                    claim_id = %claim.id,
                    "Requeued failed claim (retry {}/{})",
                    claim.retry_count,
                    self.config.max_retries
                );
            }
            report.absorb(result);
        }
        Ok(())
    }

    async fn process_claim(&self, stage: Stage, claim: Claim) -> ClaimResult {
        match stage {
            Stage::Score => self.score_claim(claim).await,
            Stage::Triage => self.triage_claim(claim).await,
            Stage::Decide => self.decide_claim(claim),
            Stage::Escalate => self.escalate_claim(claim).await,
        }
    }

    async fn score_claim(&self, claim: Claim) -> ClaimResult {
        let (suspicion, credibility) = tokio::join!(
            self.bounded(self.providers.suspicion.score_suspicion(&claim.text)),
            self.bounded(self.providers.credibility.score_credibility(&claim.source_metadata)),
        );
        let suspicion = self.degrade(checked_score(suspicion, "suspicion"), &claim, "suspicion");
        let credibility = self.degrade(checked_score(credibility, "credibility"), &claim, "credibility");

        let (suspicion, credibility) = match (suspicion, credibility) {
            (Ok(s), Ok(c)) => (s, c),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => return self.provider_failure(&claim, Stage::Score, e),
            (Err(a), Err(b)) => {
                let worst = if severity(&b) > severity(&a) { b } else { a };
                return self.provider_failure(&claim, Stage::Score, worst);
            }
        };

        let mut next = claim.clone();
        match next.record_scores(suspicion, credibility) {
            Ok(()) => self.commit(&next, None),
            Err(e) => self.invalid(&claim, e),
        }
    }

    async fn triage_claim(&self, claim: Claim) -> ClaimResult {
        let Some((suspicion, credibility)) = claim.scores() else {
            return self.park(&claim, "scored claim has no scores");
        };

        let mut next = claim.clone();
        let transition = match self.triage.decide(suspicion, credibility) {
            TriageDecision::Archive => {
                tracing::debug!(claim_id = %claim.id, "Archiving clearly benign claim");
                next.archive()
            }
            TriageDecision::GatherEvidence => {
                let evidence = match self.bounded(self.providers.evidence.gather(&claim.text)).await {
                    Ok(evidence) => evidence,
                    Err(e) => return self.provider_failure(&claim, Stage::Triage, e),
                };
                next.attach_evidence(evidence)
            }
        };

        match transition {
            Ok(()) => self.commit(&next, None),
            Err(e) => self.invalid(&claim, e),
        }
    }

    fn decide_claim(&self, claim: Claim) -> ClaimResult {
        let Some((suspicion, credibility)) = claim.scores() else {
            return self.park(&claim, "fused-pending claim has no scores");
        };
        let bundle = match claim.evidence.as_ref().map(EvidenceBundle::from_value) {
            Some(Ok(bundle)) => bundle,
            Some(Err(e)) => return self.park(&claim, &e.to_string()),
            None => return self.park(&claim, "fused-pending claim has no evidence"),
        };

        let assessment = self.evaluator.evaluate(suspicion, credibility, Some(&bundle));
        tracing::debug!(claim_id = %claim.id, "Escalation assessment: {}", assessment);

        let mut next = claim.clone();
        if assessment.should_escalate() {
            return match next.escalate() {
                Ok(()) => {
                    tracing::info!(claim_id = %claim.id, "Escalating claim to expert review");
                    self.commit(&next, None)
                }
                Err(e) => self.invalid(&claim, e),
            };
        }

        let fusion = self.resolver.resolve(suspicion, credibility, Some(&bundle));
        if let Err(e) = next.resolve() {
            return self.invalid(&claim, e);
        }
        tracing::info!(
            claim_id = %claim.id,
            "Fusion resolved claim as {} (rule: {})",
            fusion.verdict,
            fusion.rule
        );
        let record = VerifiedRecord::by_fusion(claim.id, fusion.verdict, fusion.explanation);
        self.commit(&next, Some(&record))
    }

    async fn escalate_claim(&self, claim: Claim) -> ClaimResult {
        self.lock_in_flight().insert(claim.id, claim.clone());
        let outcome = self.handler.handle(&claim).await;
        self.lock_in_flight().remove(&claim.id);

        match outcome {
            Ok(EscalationOutcome::Exhausted) => {
                self.release(&claim);
                Outcome::Exhausted.into()
            }
            Ok(EscalationOutcome::Resolved { claim: next, record }) => ClaimResult {
                outcome: self.commit(&next, Some(&record)).outcome,
                expert: Some(true),
            },
            Ok(EscalationOutcome::Failed { claim: next, .. }) => ClaimResult {
                outcome: self.commit(&next, None).outcome,
                expert: Some(false),
            },
            Err(e) => self.invalid(&claim, e),
        }
    }

    /// Bound a provider call by the provider timeout
    async fn bounded<T>(&self, call: impl Future<Output = Result<T, ProviderError>>) -> Result<T, ProviderError> {
        let limit = self.config.provider_timeout();
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(ProviderError::Timeout(limit)))
    }

    /// Substitute the degraded score for a transient scorer failure, if configured
    fn degrade(&self, result: Result<f64, ProviderError>, claim: &Claim, which: &str) -> Result<f64, ProviderError> {
        match (result, self.config.degraded_score) {
            (Err(e), Some(score)) if e.is_transient() => {
                tracing::warn!(
                    claim_id = %claim.id,
                    "{} scorer failed ({}); using degraded score {}",
                    which,
                    e,
                    score
                );
                Ok(score)
            }
            (result, _) => result,
        }
    }

    /// Persist a transition; emit the event when a record was written
    fn commit(&self, next: &Claim, record: Option<&VerifiedRecord>) -> ClaimResult {
        match self.with_store(|store| store.commit_transition(next, record)) {
            Ok(CommitOutcome::Committed) => {
                tracing::debug!(claim_id = %next.id, status = %next.status, "Committed transition");
                if let Some(record) = record {
                    self.providers.notifier.notify(&VerificationEvent::from(record));
                }
                Outcome::Committed {
                    to: next.status,
                    record: record.is_some(),
                }
                .into()
            }
            Ok(CommitOutcome::Conflict) => {
                tracing::warn!(
                    claim_id = %next.id,
                    "Claim changed concurrently; dropped transition to {}",
                    next.status
                );
                Outcome::Conflict.into()
            }
            Err(e) => {
                tracing::error!(claim_id = %next.id, "Failed to commit transition to {}: {}", next.status, e);
                Outcome::Parked.into()
            }
        }
    }

    /// Leave the claim for a later cycle
    fn defer(&self, claim: &Claim, stage: Stage, error: &ProviderError) -> ClaimResult {
        tracing::warn!(
            claim_id = %claim.id,
            stage = %stage,
            "Deferred claim after {} provider failure: {}",
            error.kind(),
            error
        );
        self.release(claim);
        Outcome::Deferred.into()
    }

    /// Leave the claim in place under its lease until the lease lapses
    fn park(&self, claim: &Claim, reason: &str) -> ClaimResult {
        tracing::error!(
            claim_id = %claim.id,
            status = %claim.status,
            "Parked claim: {}",
            reason
        );
        Outcome::Parked.into()
    }

    fn provider_failure(&self, claim: &Claim, stage: Stage, error: ProviderError) -> ClaimResult {
        match error {
            ProviderError::Permanent(_) => {
                self.park(claim, &format!("permanent {} provider failure: {}", stage, error))
            }
            _ => self.defer(claim, stage, &error),
        }
    }

    fn invalid(&self, claim: &Claim, error: TransitionError) -> ClaimResult {
        self.park(claim, &format!("invalid transition: {}", error))
    }

    fn release(&self, claim: &Claim) {
        if let Err(e) = self.with_store(|store| store.release_lease(claim.id, &self.owner)) {
            tracing::error!(claim_id = %claim.id, "Failed to release lease: {}", e);
        }
    }
}
