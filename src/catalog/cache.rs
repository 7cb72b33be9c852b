use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::catalog::{GeneCatalog, GeneSummary, GenomicInfo};
use crate::errors::Result;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::from_secs(0)),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock().unwrap()
    }
}

impl<C: Clock> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        self.as_ref().now()
    }
}

/// Key-value store whose entries expire a fixed time after insertion.
///
/// Expiry is checked lazily: an expired entry is evicted when it is read.
pub struct TtlCache<K, V, C = SystemClock> {
    entries: HashMap<K, (V, Instant)>,
    ttl: Duration,
    clock: C,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        TtlCache::with_clock(ttl, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Hash + Eq,
    V: Clone,
    C: Clock,
{
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        TtlCache {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some((_, inserted)) => now.duration_since(*inserted) >= self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            None
        } else {
            self.entries.get(key).map(|(value, _)| value.clone())
        }
    }

    /// Insert a value, restarting its time to live.
    pub fn insert(&mut self, key: K, value: V) {
        let now = self.clock.now();
        self.entries.insert(key, (value, now));
    }

    /// Number of stored entries, including expired ones that were not read yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type SearchKey = (String, String);

fn search_key(query: &str, genome: &str) -> SearchKey {
    (query.trim().to_lowercase(), genome.to_owned())
}

/// Gene catalog that remembers search results for a while.
/// Genomic-info lookups are passed through unchanged.
pub struct CachedCatalog<G, C = SystemClock> {
    inner: G,
    searches: Mutex<TtlCache<SearchKey, Vec<GeneSummary>, C>>,
}

impl<G: GeneCatalog> CachedCatalog<G, SystemClock> {
    pub fn new(inner: G, ttl: Duration) -> Self {
        CachedCatalog::with_clock(inner, ttl, SystemClock)
    }
}

impl<G: GeneCatalog, C: Clock> CachedCatalog<G, C> {
    pub fn with_clock(inner: G, ttl: Duration, clock: C) -> Self {
        CachedCatalog {
            inner,
            searches: Mutex::new(TtlCache::with_clock(ttl, clock)),
        }
    }
}

impl<G: GeneCatalog, C: Clock> GeneCatalog for CachedCatalog<G, C> {
    fn search(&self, query: &str, genome: &str) -> Result<Vec<GeneSummary>> {
        let key = search_key(query, genome);
        if let Some(genes) = self.searches.lock().unwrap().get(&key) {
            debug!("gene search '{}' ({}) answered from cache", query, genome);
            return Ok(genes);
        }
        let genes = self.inner.search(query, genome)?;
        self.searches.lock().unwrap().insert(key, genes.clone());
        Ok(genes)
    }

    fn genomic_info(&self, gene_id: &str) -> Result<Option<GenomicInfo>> {
        self.inner.genomic_info(gene_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    const TEN_MINUTES: Duration = Duration::from_secs(600);

    #[test]
    fn test_ttl() {
        let clock = Arc::new(ManualClock::default());
        let mut cache = TtlCache::with_clock(TEN_MINUTES, Arc::clone(&clock));
        cache.insert("brca1|hg38", 1);

        clock.advance(Duration::from_secs(599));
        assert_eq!(cache.get(&"brca1|hg38"), Some(1));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get(&"brca1|hg38"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_only_evicted_on_read() {
        let clock = Arc::new(ManualClock::default());
        let mut cache = TtlCache::with_clock(TEN_MINUTES, Arc::clone(&clock));
        cache.insert(1, "a");
        cache.insert(2, "b");
        clock.advance(TEN_MINUTES);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reinsert_restarts_ttl() {
        let clock = Arc::new(ManualClock::default());
        let mut cache = TtlCache::with_clock(TEN_MINUTES, Arc::clone(&clock));
        cache.insert("k", 1);
        clock.advance(Duration::from_secs(500));
        cache.insert("k", 2);
        clock.advance(Duration::from_secs(500));
        assert_eq!(cache.get(&"k"), Some(2));
    }

    struct CountingCatalog {
        searches: AtomicUsize,
    }

    impl GeneCatalog for CountingCatalog {
        fn search(&self, query: &str, _genome: &str) -> Result<Vec<GeneSummary>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![GeneSummary::new(
                query.to_uppercase(),
                String::new(),
                "chr17".to_owned(),
                String::new(),
                "672".to_owned(),
            )])
        }

        fn genomic_info(&self, _gene_id: &str) -> Result<Option<GenomicInfo>> {
            Ok(None)
        }
    }

    #[test]
    fn test_cached_catalog() {
        let clock = Arc::new(ManualClock::default());
        let catalog = CachedCatalog::with_clock(
            CountingCatalog {
                searches: AtomicUsize::new(0),
            },
            TEN_MINUTES,
            Arc::clone(&clock),
        );
        let first = catalog.search("brca1", "hg38").unwrap();
        let second = catalog.search(" BRCA1 ", "hg38").unwrap();
        assert_eq!(first, second);
        assert_eq!(catalog.inner.searches.load(Ordering::SeqCst), 1);

        // different assembly, different key
        catalog.search("brca1", "hg19").unwrap();
        assert_eq!(catalog.inner.searches.load(Ordering::SeqCst), 2);

        clock.advance(TEN_MINUTES);
        catalog.search("brca1", "hg38").unwrap();
        assert_eq!(catalog.inner.searches.load(Ordering::SeqCst), 3);
    }
}
