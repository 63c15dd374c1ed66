//! Expert result cache
//!
//! Wraps any [`ExpertProvider`] and reuses an earlier adjudication when the
//! same claim text (lower-cased and trimmed) comes up again. Only successful
//! adjudications are cached; failures always reach the inner expert next time.
//!
//! Expired entries are swept on every insert, and the oldest entry is evicted
//! once the cache holds `max_entries`.

use aegis_domain::traits::ExpertProvider;
use aegis_domain::{Adjudication, CaseFile, ProviderError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default cache entry lifetime (30 days)
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

/// Default entry cap
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Hit/miss counters and current size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups passed to the inner expert
    pub misses: u64,
    /// Live entries
    pub entries: usize,
}

struct Entry {
    adjudication: Adjudication,
    stored_at: Instant,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    hits: u64,
    misses: u64,
}

/// Caching decorator for an expert provider
pub struct CachedExpert<E> {
    inner: E,
    ttl: Duration,
    max_entries: usize,
    state: Mutex<State>,
}

/// Cache key for a claim text
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

impl<E: ExpertProvider> CachedExpert<E> {
    /// Wrap `inner` with the default TTL
    pub fn new(inner: E) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    /// Wrap `inner` with a custom TTL
    pub fn with_ttl(inner: E, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
            state: Mutex::new(State::default()),
        }
    }

    /// Cap the number of cached adjudications (at least one)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// The wrapped expert
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
        }
    }

    /// Drop every cached adjudication
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, key: &str) -> Option<Adjudication> {
        let mut state = self.lock();
        let fresh = state
            .entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.adjudication.clone());

        match fresh {
            Some(adjudication) => {
                state.hits += 1;
                Some(adjudication)
            }
            None => {
                state.entries.remove(key);
                state.misses += 1;
                None
            }
        }
    }

    fn store(&self, key: String, adjudication: Adjudication) {
        let mut state = self.lock();
        let ttl = self.ttl;
        state.entries.retain(|_, e| e.stored_at.elapsed() < ttl);

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_entries {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
            }
        }

        state.entries.insert(
            key,
            Entry {
                adjudication,
                stored_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl<E: ExpertProvider> ExpertProvider for CachedExpert<E> {
    async fn adjudicate(&self, case: &CaseFile) -> Result<Adjudication, ProviderError> {
        let key = normalize_key(&case.claim_text);
        if let Some(adjudication) = self.lookup(&key) {
            tracing::debug!("Expert cache hit for claim {}", case.claim_id);
            return Ok(adjudication);
        }

        let adjudication = self.inner.adjudicate(case).await?;
        self.store(key, adjudication.clone());
        Ok(adjudication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockExpert;
    use aegis_domain::{ClaimId, Verdict};
    use serde_json::json;

    fn case(text: &str) -> CaseFile {
        CaseFile {
            claim_id: ClaimId::new(),
            claim_text: text.to_string(),
            source_metadata: json!({}),
            suspicion: 0.9,
            credibility: 0.1,
            evidence: json!({}),
        }
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Vaccines Cause X \n"), "vaccines cause x");
    }

    #[tokio::test]
    async fn test_repeated_text_hits_cache() {
        let inner = MockExpert::new(Verdict::False, "Debunked");
        let cached = CachedExpert::new(inner.clone());

        cached.adjudicate(&case("The Earth is flat")).await.unwrap();
        let again = cached.adjudicate(&case("  the earth is FLAT ")).await.unwrap();

        assert_eq!(again.verdict, Verdict::False);
        assert_eq!(inner.call_count(), 1);
        assert_eq!(
            cached.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut inner = MockExpert::new(Verdict::True, "Confirmed");
        inner.push_result("claim", Err(ProviderError::Transient("503".into())));
        let cached = CachedExpert::new(inner.clone());

        assert!(cached.adjudicate(&case("claim")).await.is_err());
        assert!(cached.adjudicate(&case("claim")).await.is_ok());
        assert_eq!(inner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_are_refreshed() {
        let inner = MockExpert::new(Verdict::True, "Confirmed");
        let cached = CachedExpert::with_ttl(inner.clone(), Duration::ZERO);

        cached.adjudicate(&case("claim")).await.unwrap();
        cached.adjudicate(&case("claim")).await.unwrap();
        assert_eq!(inner.call_count(), 2);

        cached.clear();
        assert_eq!(cached.stats().entries, 0);
    }

    #[tokio::test]
    async fn test_expired_entries_swept_on_insert() {
        let inner = MockExpert::new(Verdict::True, "Confirmed");
        let cached = CachedExpert::with_ttl(inner, Duration::from_millis(50));

        for text in ["first", "second", "third"] {
            cached.adjudicate(&case(text)).await.unwrap();
        }
        assert_eq!(cached.stats().entries, 3);

        tokio::time::sleep(Duration::from_millis(80)).await;
        cached.adjudicate(&case("fourth")).await.unwrap();
        assert_eq!(cached.stats().entries, 1);
    }

    #[tokio::test]
    async fn test_oldest_entry_evicted_at_capacity() {
        let inner = MockExpert::new(Verdict::False, "Debunked");
        let cached = CachedExpert::new(inner.clone()).with_max_entries(2);

        cached.adjudicate(&case("a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cached.adjudicate(&case("b")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cached.adjudicate(&case("c")).await.unwrap();
        assert_eq!(cached.stats().entries, 2);

        // "b" and "c" are still cached, "a" went back to the expert
        cached.adjudicate(&case("b")).await.unwrap();
        cached.adjudicate(&case("c")).await.unwrap();
        assert_eq!(inner.call_count(), 3);
        cached.adjudicate(&case("a")).await.unwrap();
        assert_eq!(inner.call_count(), 4);
    }
}
