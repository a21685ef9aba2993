pub mod buffer;
pub mod config;
pub mod error;
pub mod filter;
pub mod grammar;
pub mod intel;
pub mod record;
pub mod sort;
pub mod storage;
pub mod variants;
pub mod version;

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info, warn};

use buffer::StreamBuffer;
use config::Config;
use grammar::LineGrammar;
use intel::{IntelCache, IntelRecord};
use record::ConnectionRecord;
use sort::SortState;
use storage::{KvStore, KEY_CAPTURE_SORT};
use version::ReleaseNotices;

/// Core conntrail instance
///
/// Owns the line grammar, the stream window, and the intelligence cache.
/// A host session layer feeds transport callbacks in and renders the
/// query results.
pub struct Conntrail {
    config: Config,
    store: KvStore,
    grammar: LineGrammar,
    buffer: StreamBuffer,
    intel: IntelCache,
    notices: ReleaseNotices,
    paused: bool,
    last_error: Option<String>,
}

impl Conntrail {
    /// Create a new conntrail instance
    pub fn new(config: Config) -> Result<Self> {
        let store = KvStore::open(config.storage_dir())?;
        Ok(Self::with_store(config, store))
    }

    /// Create an instance over an existing storage handle
    pub fn with_store(config: Config, store: KvStore) -> Self {
        let buffer = StreamBuffer::with_capacity(store.clone(), config.buffer.capacity);
        let intel = IntelCache::with_limits(
            store.clone(),
            config.intel.max_lookup_entries,
            Duration::from_secs(config.intel.idle_timeout_secs),
        );
        let notices = ReleaseNotices::new(store.clone());

        Self {
            config,
            store,
            grammar: LineGrammar::new(),
            buffer,
            intel,
            notices,
            paused: false,
            last_error: None,
        }
    }

    /// Reload the stream window persisted by the previous session
    pub fn restore(&mut self) {
        self.buffer.restore();
    }

    /// Feed one raw transport line
    ///
    /// Lines arriving while paused are dropped. A successful line clears
    /// any recorded transport error.
    pub fn ingest_line(&mut self, line: &str) {
        if self.paused {
            debug!("Paused, dropping line");
            return;
        }
        self.last_error = None;
        self.buffer.push(line);
    }

    /// Record a transport error reported by the host
    pub fn ingest_error(&mut self, message: &str) {
        warn!("Transport error: {}", message);
        self.last_error = Some(message.to_string());
    }

    /// Most recent transport error, if the stream has not recovered
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            info!("Ingestion {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Parse the current window, skipping unparseable lines
    pub fn records(&self) -> Vec<ConnectionRecord> {
        self.buffer
            .snapshot()
            .iter()
            .filter_map(|line| self.grammar.parse(line))
            .collect()
    }

    /// Filter then sort the current window in one call
    pub fn view(&self, query: &str, sort_state: &SortState) -> Vec<ConnectionRecord> {
        let filtered = filter::filter_records(&self.records(), query);
        sort::sort_records(&filtered, sort_state)
    }

    /// Intelligence lookup for an address, for display annotation
    pub fn owner_of(&mut self, address: &str) -> Option<IntelRecord> {
        self.intel.find_containing(address)
    }

    /// Direct access to the intelligence cache
    pub fn intel_mut(&mut self) -> &mut IntelCache {
        &mut self.intel
    }

    /// Release dismissal and prerelease preferences
    pub fn release_notices(&self) -> &ReleaseNotices {
        &self.notices
    }

    /// Wipe the stream window, live and stored
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Number of raw lines currently buffered
    pub fn line_count(&self) -> usize {
        self.buffer.len()
    }

    /// Stored sort preference, default when absent or unreadable
    pub fn sort_state(&self) -> SortState {
        self.store.get(KEY_CAPTURE_SORT).unwrap_or_default()
    }

    /// Persist the sort preference
    pub fn save_sort_state(&self, state: &SortState) {
        if let Err(e) = self.store.put(KEY_CAPTURE_SORT, state) {
            warn!("Failed to save sort preference: {}", e);
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
