//! End-to-end workflow tests over an in-memory store and mock providers

use crate::*;
use aegis_domain::{ClaimStatus, ProviderError, ResolutionPath, Verdict};
use aegis_policy::PolicyConfig;
use aegis_providers::{MockEvidence, MockExpert, MockScorer};
use aegis_store::SqliteStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Mocks kept alongside the engine so tests can script and inspect them
struct Harness {
    suspicion: MockScorer,
    credibility: MockScorer,
    evidence: MockEvidence,
    expert: MockExpert,
}

impl Harness {
    fn new() -> Self {
        Self {
            suspicion: MockScorer::new(0.5),
            credibility: MockScorer::new(0.5),
            evidence: MockEvidence::default(),
            expert: MockExpert::new(Verdict::False, "Debunked by primary sources."),
        }
    }

    fn providers(&self) -> (Providers, tokio::sync::mpsc::Receiver<aegis_domain::VerificationEvent>) {
        let (notifier, events) = ChannelNotifier::new(64);
        let providers = Providers {
            suspicion: Arc::new(self.suspicion.clone()),
            credibility: Arc::new(self.credibility.clone()),
            evidence: Arc::new(self.evidence.clone()),
            expert: Arc::new(self.expert.clone()),
            notifier: Arc::new(notifier),
        };
        (providers, events)
    }

    fn engine_with(
        &self,
        config: WorkflowConfig,
    ) -> (
        WorkflowEngine<SqliteStore>,
        tokio::sync::mpsc::Receiver<aegis_domain::VerificationEvent>,
    ) {
        let (providers, events) = self.providers();
        let engine = WorkflowEngine::new(
            SqliteStore::new(":memory:").unwrap(),
            providers,
            config,
            PolicyConfig::default(),
        )
        .unwrap()
        .with_owner("test-engine");
        (engine, events)
    }

    fn engine(
        &self,
    ) -> (
        WorkflowEngine<SqliteStore>,
        tokio::sync::mpsc::Receiver<aegis_domain::VerificationEvent>,
    ) {
        self.engine_with(WorkflowConfig::default())
    }
}

fn metadata(handle: &str) -> Value {
    json!({ "handle": handle, "followers": 12 })
}

fn contradicting_evidence() -> Value {
    json!({
        "knowledge_summary": "Scientists say this is a persistent myth.",
        "snippets": [{ "source": "Reuters", "text": "No evidence supports the claim." }]
    })
}

fn corroborating_evidence() -> Value {
    json!({
        "knowledge_summary": "The agency confirmed the figures.",
        "snippets": ["https://www.reuters.com/a", "https://apnews.com/b", "https://bbc.co.uk/c", "https://npr.org/d"]
    })
}

#[tokio::test]
async fn test_benign_claim_is_archived_without_record() {
    let mut harness = Harness::new();
    harness.suspicion.add_response("Nice weather today", Ok(0.1));
    harness.credibility.add_response("@met_office", Ok(0.9));
    let (engine, mut events) = harness.engine();

    let id = engine.submit("Nice weather today", metadata("@met_office")).unwrap();
    let report = engine.run_cycle().await.unwrap();

    let claim = engine.claim(id).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::Archived);
    assert_eq!(claim.scores(), Some((0.1, 0.9)));
    assert!(engine.record(id).unwrap().is_none());
    assert_eq!(harness.evidence.call_count(), 0);
    assert_eq!(report.records(), 0);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_contradicted_claim_is_escalated_and_resolved_by_expert() {
    let text = "5G towers spread the virus";
    let mut harness = Harness::new();
    harness.suspicion.add_response(text, Ok(0.9));
    harness.credibility.add_response("@anon", Ok(0.2));
    harness.evidence.add_response(text, Ok(contradicting_evidence()));
    let (engine, mut events) = harness.engine();

    let id = engine.submit(text, metadata("@anon")).unwrap();
    let report = engine.run_cycle().await.unwrap();

    let decide = report.stage(Stage::Decide).unwrap();
    assert_eq!(decide.transitions.get(&ClaimStatus::Escalated), Some(&1));

    let claim = engine.claim(id).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::Resolved);
    assert_eq!(claim.retry_count, 0);

    let record = engine.record(id).unwrap().unwrap();
    assert_eq!(record.resolution_path, ResolutionPath::ResolvedByInvestigator);
    assert_eq!(record.verdict, Verdict::False);
    assert_eq!(record.confidence, Some(0.9));
    assert_eq!(harness.expert.call_count(), 1);

    let event = events.try_recv().unwrap();
    assert_eq!(event.claim_id, id);
    assert!(event.public_alert().starts_with("This information has been confirmed as false."));
}

#[tokio::test]
async fn test_corroborated_claim_resolves_true_by_fusion() {
    let text = "Unemployment fell last quarter";
    let mut harness = Harness::new();
    harness.evidence.add_response(text, Ok(corroborating_evidence()));
    let (engine, mut events) = harness.engine();

    let id = engine.submit(text, metadata("@newsdesk")).unwrap();
    engine.run_cycle().await.unwrap();

    let claim = engine.claim(id).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::Resolved);

    let record = engine.record(id).unwrap().unwrap();
    assert_eq!(record.verdict, Verdict::True);
    assert_eq!(record.resolution_path, ResolutionPath::ResolvedByFusion);
    assert!(record.explanation.contains("4 independent credible sources"));
    assert_eq!(harness.expert.call_count(), 0);
    assert_eq!(events.try_recv().unwrap().verdict, Verdict::True);
}

#[tokio::test]
async fn test_expert_failures_stop_at_retry_bound() {
    let text = "Vaccines contain microchips";
    let mut harness = Harness::new();
    harness.suspicion.add_response(text, Ok(0.95));
    harness.credibility.add_response("@anon", Ok(0.1));
    harness.evidence.add_response(text, Ok(contradicting_evidence()));
    harness.expert = MockExpert::failing(ProviderError::Transient("503 Service Unavailable".into()));
    let (engine, _events) = harness.engine();

    let id = engine.submit(text, metadata("@anon")).unwrap();

    for expected_retries in 1..=3 {
        engine.run_cycle().await.unwrap();
        let claim = engine.claim(id).unwrap().unwrap();
        assert_eq!(claim.status, ClaimStatus::Failed);
        assert_eq!(claim.retry_count, expected_retries);
    }

    // Budget spent: further cycles never reach the expert again
    let report = engine.run_cycle().await.unwrap();
    engine.run_cycle().await.unwrap();

    let claim = engine.claim(id).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::Failed);
    assert_eq!(claim.retry_count, 3);
    assert_eq!(harness.expert.call_count(), 3);
    assert_eq!(report.stage(Stage::Escalate).unwrap().requeued, 0);
    assert!(engine.record(id).unwrap().is_none());

    let metrics = engine.metrics();
    assert_eq!(metrics.expert_attempts, 3);
    assert_eq!(metrics.expert_failures, 3);
    assert_eq!(metrics.requeued, 2);
}

#[tokio::test]
async fn test_expert_recovers_after_failure() {
    let text = "The moon landing was staged";
    let mut harness = Harness::new();
    harness.suspicion.add_response(text, Ok(0.95));
    harness.credibility.add_response("@anon", Ok(0.1));
    harness.evidence.add_response(text, Ok(contradicting_evidence()));
    harness
        .expert
        .push_result(text, Err(ProviderError::Malformed("unparseable answer".into())));
    let (engine, _events) = harness.engine();

    let id = engine.submit(text, metadata("@anon")).unwrap();
    engine.run_cycle().await.unwrap();
    assert_eq!(engine.claim(id).unwrap().unwrap().status, ClaimStatus::Failed);

    engine.run_cycle().await.unwrap();
    let claim = engine.claim(id).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::Resolved);
    assert_eq!(claim.retry_count, 1);
    assert_eq!(
        engine.record(id).unwrap().unwrap().resolution_path,
        ResolutionPath::ResolvedByInvestigator
    );
}

#[tokio::test]
async fn test_repeated_cycles_are_idempotent() {
    let harness = Harness::new();
    let (engine, mut events) = harness.engine();

    let id = engine.submit("Inflation is 2%", metadata("@stats")).unwrap();
    engine.run_cycle().await.unwrap();
    let resolved = engine.claim(id).unwrap().unwrap();
    let record = engine.record(id).unwrap().unwrap();
    assert!(events.try_recv().is_ok());

    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.total_transitions(), 0);
    assert!(report.stages.iter().all(|s| s.selected == 0));
    assert_eq!(engine.claim(id).unwrap().unwrap(), resolved);
    assert_eq!(engine.record(id).unwrap().unwrap(), record);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_malformed_evidence_isolated_to_its_claim() {
    let mut harness = Harness::new();
    harness.evidence.add_response("broken", Ok(json!({ "snippets": 42 })));
    let (engine, _events) = harness.engine();

    let broken = engine.submit("broken", metadata("@a")).unwrap();
    let healthy = engine.submit("healthy", metadata("@b")).unwrap();
    let report = engine.run_cycle().await.unwrap();

    assert_eq!(
        engine.claim(broken).unwrap().unwrap().status,
        ClaimStatus::FusedPending
    );
    assert_eq!(engine.claim(healthy).unwrap().unwrap().status, ClaimStatus::Resolved);
    assert_eq!(report.stage(Stage::Decide).unwrap().parked, 1);

    // Parked claims stay leased until the lease lapses
    let store = engine.store();
    let lease = store.lock().unwrap().lease_of(broken).unwrap();
    assert_eq!(lease.map(|(owner, _)| owner), Some("test-engine".to_string()));
}

#[tokio::test]
async fn test_provider_failure_does_not_block_siblings() {
    let mut harness = Harness::new();
    harness
        .suspicion
        .add_response("quota exceeded", Err(ProviderError::Permanent("401 Unauthorized".into())));
    harness
        .suspicion
        .add_response("flaky", Err(ProviderError::Transient("connection reset".into())));
    let (engine, _events) = harness.engine();

    let permanent = engine.submit("quota exceeded", metadata("@a")).unwrap();
    let transient = engine.submit("flaky", metadata("@b")).unwrap();
    let fine = engine.submit("fine", metadata("@c")).unwrap();
    let report = engine.run_cycle().await.unwrap();

    let score = report.stage(Stage::Score).unwrap();
    assert_eq!(score.selected, 3);
    assert_eq!(score.parked, 1);
    assert_eq!(score.deferred, 1);
    assert_eq!(score.transitions.get(&ClaimStatus::Scored), Some(&1));

    assert_eq!(engine.claim(permanent).unwrap().unwrap().status, ClaimStatus::New);
    assert_eq!(engine.claim(transient).unwrap().unwrap().status, ClaimStatus::New);
    assert_eq!(engine.claim(fine).unwrap().unwrap().status, ClaimStatus::Resolved);

    // Deferred claims are released for the next cycle, parked ones are not
    let store = engine.store();
    assert!(store.lock().unwrap().lease_of(transient).unwrap().is_none());
    assert!(store.lock().unwrap().lease_of(permanent).unwrap().is_some());

    harness.suspicion.add_response("flaky", Ok(0.4));
    engine.run_cycle().await.unwrap();
    assert_eq!(engine.claim(transient).unwrap().unwrap().status, ClaimStatus::Resolved);
    assert_eq!(engine.claim(permanent).unwrap().unwrap().status, ClaimStatus::New);
}

#[tokio::test]
async fn test_out_of_range_score_is_rejected() {
    let mut harness = Harness::new();
    harness.suspicion.add_response("overconfident", Ok(1.7));
    let (engine, _events) = harness.engine();

    let id = engine.submit("overconfident", metadata("@a")).unwrap();
    let report = engine.run_cycle().await.unwrap();

    let claim = engine.claim(id).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::New);
    assert!(claim.suspicion.is_none());
    assert_eq!(report.stage(Stage::Score).unwrap().deferred, 1);
}

#[tokio::test]
async fn test_degraded_score_applies_to_transient_failures_only() {
    let mut harness = Harness::new();
    harness
        .suspicion
        .add_response("flaky", Err(ProviderError::Timeout(Duration::from_secs(30))));
    harness
        .suspicion
        .add_response("revoked", Err(ProviderError::Permanent("key revoked".into())));
    let config = WorkflowConfig {
        degraded_score: Some(0.5),
        ..Default::default()
    };
    let (engine, _events) = harness.engine_with(config);

    let flaky = engine.submit("flaky", metadata("@a")).unwrap();
    let revoked = engine.submit("revoked", metadata("@b")).unwrap();
    engine.run_stage(Stage::Score).await.unwrap();

    let claim = engine.claim(flaky).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::Scored);
    assert_eq!(claim.suspicion, Some(0.5));
    assert_eq!(engine.claim(revoked).unwrap().unwrap().status, ClaimStatus::New);
}

#[tokio::test]
async fn test_run_stage_advances_one_step() {
    let harness = Harness::new();
    let (engine, _events) = harness.engine();

    let id = engine.submit("step by step", metadata("@a")).unwrap();

    engine.run_stage(Stage::Score).await.unwrap();
    assert_eq!(engine.claim(id).unwrap().unwrap().status, ClaimStatus::Scored);

    engine.run_stage(Stage::Triage).await.unwrap();
    let claim = engine.claim(id).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::FusedPending);
    assert!(claim.evidence.is_some());

    let report = engine.run_stage(Stage::Decide).await.unwrap();
    assert_eq!(report.records, 1);
    assert_eq!(engine.claim(id).unwrap().unwrap().status, ClaimStatus::Resolved);
}

#[tokio::test]
async fn test_cycle_timeout_releases_leases() {
    let mut harness = Harness::new();
    harness.evidence = harness.evidence.clone().with_delay(Duration::from_millis(800));
    let config = WorkflowConfig {
        cycle_timeout_secs: 2,
        provider_timeout_secs: 1,
        expert_timeout_secs: 1,
        max_concurrency: 1,
        ..Default::default()
    };
    let (engine, _events) = harness.engine_with(config);

    let ids: Vec<_> = (0..3)
        .map(|i| engine.submit(format!("Needs research {}", i), metadata("@anon")).unwrap())
        .collect();
    let report = engine.run_cycle().await.unwrap();

    // Two gathers finish inside the bound; the third is cut off mid-call
    assert!(report.timed_out);
    assert_eq!(report.stages.len(), 1);
    assert_eq!(report.released_leases, 1);
    assert_eq!(report.interrupted_expert_calls, 0);

    let counts = engine.status_counts().unwrap();
    assert_eq!(counts.get(&ClaimStatus::FusedPending), Some(&2));
    assert_eq!(counts.get(&ClaimStatus::Scored), Some(&1));
    for id in &ids {
        assert!(engine.store().lock().unwrap().lease_of(*id).unwrap().is_none());
    }
    assert_eq!(engine.metrics().timed_out_cycles, 1);
}

#[tokio::test]
async fn test_expert_cut_off_by_cycle_bound_counts_as_attempt() {
    let text = "Slow to adjudicate";
    let mut harness = Harness::new();
    harness.suspicion.add_response(text, Ok(0.95));
    harness.credibility.add_response("@anon", Ok(0.1));
    harness.evidence.add_response(text, Ok(contradicting_evidence()));
    harness.evidence = harness.evidence.clone().with_delay(Duration::from_millis(1500));
    harness.expert = MockExpert::new(Verdict::True, "late").with_delay(Duration::from_secs(5));
    let config = WorkflowConfig {
        cycle_timeout_secs: 3,
        provider_timeout_secs: 2,
        expert_timeout_secs: 2,
        ..Default::default()
    };
    let (engine, _events) = harness.engine_with(config);

    let id = engine.submit(text, metadata("@anon")).unwrap();

    // Research takes 1.5s, so the cycle bound fires while the expert is working
    let report = engine.run_cycle().await.unwrap();
    assert!(report.timed_out);
    assert_eq!(report.stages.len(), 3);
    assert_eq!(report.interrupted_expert_calls, 1);
    assert_eq!(report.released_leases, 0);

    let claim = engine.claim(id).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::Failed);
    assert_eq!(claim.retry_count, 1);
    assert!(engine.store().lock().unwrap().lease_of(id).unwrap().is_none());

    // Later attempts time out on the expert bound; the budget still holds
    for _ in 0..4 {
        engine.run_cycle().await.unwrap();
    }

    let claim = engine.claim(id).unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::Failed);
    assert_eq!(claim.retry_count, 3);
    assert_eq!(harness.expert.call_count(), 3);

    let metrics = engine.metrics();
    assert_eq!(metrics.expert_attempts, 3);
    assert_eq!(metrics.expert_failures, 3);
}

#[tokio::test]
async fn test_engines_sharing_a_database_never_double_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aegis.db");
    let harness = Harness::new();

    let build = |owner: &str| {
        let (providers, _events) = harness.providers();
        WorkflowEngine::new(
            SqliteStore::new(&path).unwrap(),
            providers,
            WorkflowConfig {
                batch_size: 5,
                ..Default::default()
            },
            PolicyConfig::default(),
        )
        .unwrap()
        .with_owner(owner)
    };
    let first = build("engine-a");
    let second = build("engine-b");

    let ids: Vec<_> = (0..20)
        .map(|i| first.submit(format!("claim number {}", i), metadata("@a")).unwrap())
        .collect();

    for _ in 0..4 {
        let (a, b) = tokio::join!(first.run_cycle(), second.run_cycle());
        a.unwrap();
        b.unwrap();
    }

    for id in &ids {
        assert_eq!(first.claim(*id).unwrap().unwrap().status, ClaimStatus::Resolved);
        assert!(second.record(*id).unwrap().is_some());
    }
    let records = first.metrics().records + second.metrics().records;
    assert_eq!(records, ids.len());
    assert_eq!(first.metrics().conflicts + second.metrics().conflicts, 0);
}

#[tokio::test]
async fn test_submit_rejects_empty_text() {
    let harness = Harness::new();
    let (engine, _events) = harness.engine();

    assert!(matches!(
        engine.submit("   ", json!({})),
        Err(WorkflowError::InvalidClaim(_))
    ));
    assert!(engine.status_counts().unwrap().values().all(|n| *n == 0));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let harness = Harness::new();
    let (providers, _events) = harness.providers();
    let result = WorkflowEngine::new(
        SqliteStore::new(":memory:").unwrap(),
        providers,
        WorkflowConfig {
            batch_size: 0,
            ..Default::default()
        },
        PolicyConfig::default(),
    );
    assert!(matches!(result, Err(WorkflowError::Config(_))));
}
