//! Network-ownership intelligence cache
//!
//! Two-tier cache over the registry records that map address prefixes to
//! their owning networks. The durable tier is an unbounded id-to-record
//! map persisted on every write and reloaded lazily. The volatile tier
//! holds bounded per-address lookup outcomes, negative results included,
//! with strict least-recently-used eviction. Sixty seconds after the last
//! operation both tiers are dropped and rebuilt on demand.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{KvStore, KEY_INTEL_RECORDS};
use crate::variants::strip_port;

/// Default bound on cached lookup outcomes
pub const DEFAULT_MAX_LOOKUP_ENTRIES: usize = 10_000;
/// Default idle period after which cached state is dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// One network-ownership registry entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntelRecord {
    /// Registry identifier (AS number or similar)
    pub id: String,
    /// Owner name
    pub name: String,
    /// CIDR prefixes announced by this network
    pub prefixes: Vec<String>,
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct IntelStats {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

/// Cached outcome of one address lookup
struct LookupEntry {
    result: Option<IntelRecord>,
    last_used: u64,
}

/// Two-tier intelligence cache backed by durable storage
pub struct IntelCache {
    store: KvStore,
    /// Durable records, absent until first use or after invalidation
    records: Option<HashMap<String, IntelRecord>>,
    /// Per-address lookup outcomes, bounded LRU
    lookup_cache: HashMap<String, LookupEntry>,
    max_lookup_entries: usize,
    idle_timeout: Duration,
    last_touched: Instant,
    /// Monotonic use counter for LRU accounting
    tick: u64,
    pub stats: IntelStats,
}

impl IntelCache {
    pub fn new(store: KvStore) -> Self {
        Self::with_limits(store, DEFAULT_MAX_LOOKUP_ENTRIES, DEFAULT_IDLE_TIMEOUT)
    }

    /// Create a cache with explicit lookup bound and idle timeout
    pub fn with_limits(store: KvStore, max_lookup_entries: usize, idle_timeout: Duration) -> Self {
        Self {
            store,
            records: None,
            lookup_cache: HashMap::new(),
            max_lookup_entries,
            idle_timeout,
            last_touched: Instant::now(),
            tick: 0,
            stats: IntelStats::default(),
        }
    }

    /// Insert or update a registry record and persist the durable tier
    ///
    /// Every add drops all cached lookup outcomes, since a new prefix can
    /// change any previously negative result.
    pub fn add(&mut self, id: &str, name: &str, prefixes: Vec<String>) {
        self.maybe_invalidate();

        let record = IntelRecord {
            id: id.to_string(),
            name: name.to_string(),
            prefixes,
        };
        self.records_mut().insert(record.id.clone(), record);
        self.persist();
        self.lookup_cache.clear();
    }

    /// Find the record whose prefixes contain the given address
    ///
    /// The address may carry a port or bracket notation. When several
    /// prefixes contain the address the most specific one wins; equal
    /// lengths fall back to the smallest record id. Unparseable addresses
    /// and uncovered addresses are negative outcomes, cached like any
    /// other.
    pub fn find_containing(&mut self, address: &str) -> Option<IntelRecord> {
        self.maybe_invalidate();
        self.stats.lookups += 1;
        self.tick += 1;

        let clean = strip_port(address).to_string();

        if let Some(entry) = self.lookup_cache.get_mut(&clean) {
            entry.last_used = self.tick;
            self.stats.hits += 1;
            return entry.result.clone();
        }

        self.stats.misses += 1;
        let result = self.scan(&clean);

        if self.lookup_cache.len() >= self.max_lookup_entries {
            self.evict_oldest();
        }
        self.lookup_cache.insert(
            clean,
            LookupEntry {
                result: result.clone(),
                last_used: self.tick,
            },
        );

        result
    }

    /// Snapshot of all durable records, sorted by id
    pub fn get_all(&mut self) -> Vec<IntelRecord> {
        self.maybe_invalidate();

        let mut all: Vec<IntelRecord> = self.records_mut().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Number of durable records
    pub fn record_count(&mut self) -> usize {
        self.maybe_invalidate();
        self.records_mut().len()
    }

    /// Number of cached lookup outcomes
    pub fn lookup_cache_len(&self) -> usize {
        self.lookup_cache.len()
    }

    /// Wipe both tiers and the stored records
    pub fn clear(&mut self) {
        self.maybe_invalidate();
        self.store.remove(KEY_INTEL_RECORDS);
        self.records = None;
        self.lookup_cache.clear();
    }

    /// Drop cached state after the idle period, then mark this operation
    fn maybe_invalidate(&mut self) {
        if self.last_touched.elapsed() >= self.idle_timeout
            && (self.records.is_some() || !self.lookup_cache.is_empty())
        {
            debug!(
                "Idle for {:?}, dropping {} cached lookups and the record map",
                self.idle_timeout,
                self.lookup_cache.len()
            );
            self.records = None;
            self.lookup_cache.clear();
            self.stats.invalidations += 1;
        }
        self.last_touched = Instant::now();
    }

    /// Durable tier, loaded from storage on first use
    fn records_mut(&mut self) -> &mut HashMap<String, IntelRecord> {
        let store = &self.store;
        self.records.get_or_insert_with(|| {
            let loaded: HashMap<String, IntelRecord> =
                store.get(KEY_INTEL_RECORDS).unwrap_or_default();
            debug!("Loaded {} intelligence records", loaded.len());
            loaded
        })
    }

    fn persist(&self) {
        if let Some(records) = &self.records {
            if let Err(e) = self.store.put(KEY_INTEL_RECORDS, records) {
                warn!("Failed to persist intelligence records: {}", e);
            }
        }
    }

    /// Linear scan of every record's prefixes for containment
    fn scan(&mut self, clean: &str) -> Option<IntelRecord> {
        let ip: IpAddr = match clean.parse() {
            Ok(ip) => ip,
            Err(_) => return None,
        };

        let mut best: Option<(IntelRecord, u8)> = None;
        for record in self.records_mut().values() {
            for prefix in &record.prefixes {
                let network: IpNetwork = match prefix.parse() {
                    Ok(network) => network,
                    // Malformed prefix never contains anything
                    Err(_) => continue,
                };
                if !network.contains(ip) {
                    continue;
                }

                let better = match &best {
                    None => true,
                    Some((current, current_len)) => {
                        network.prefix() > *current_len
                            || (network.prefix() == *current_len && record.id < current.id)
                    }
                };
                if better {
                    best = Some((record.clone(), network.prefix()));
                }
            }
        }

        best.map(|(record, _)| record)
    }

    /// Evict the least recently used lookup outcome
    fn evict_oldest(&mut self) {
        if let Some(oldest) = self
            .lookup_cache
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(address, _)| address.clone())
        {
            self.lookup_cache.remove(&oldest);
            self.stats.evictions += 1;
        }
    }
}
