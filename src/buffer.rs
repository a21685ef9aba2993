//! Bounded window of recent capture lines
//!
//! Holds the newest N raw lines in arrival order and mirrors them to
//! durable storage so a session restart picks up where the last one
//! stopped. Persistence is best-effort and never interrupts ingestion.

use std::collections::VecDeque;

use tracing::{info, warn};

use crate::storage::{KvStore, KEY_CAPTURE_LINES};

/// Default window size
pub const DEFAULT_CAPACITY: usize = 1000;

/// Bounded FIFO of raw log lines with durable mirroring
pub struct StreamBuffer {
    store: KvStore,
    lines: VecDeque<String>,
    capacity: usize,
}

impl StreamBuffer {
    pub fn new(store: KvStore) -> Self {
        Self::with_capacity(store, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(store: KvStore, capacity: usize) -> Self {
        Self {
            store,
            lines: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Append a line, dropping the oldest once over capacity
    ///
    /// The capacity-truncated window is mirrored to storage after every
    /// push; a failed write logs a notice and ingestion continues.
    pub fn push(&mut self, line: &str) {
        self.lines.push_back(line.to_string());
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
        self.persist();
    }

    /// Copy of the window in arrival order
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    /// Replace the window with the stored one
    ///
    /// Missing or corrupt stored data leaves the buffer empty. A stored
    /// window larger than the capacity keeps only the newest lines.
    pub fn restore(&mut self) {
        let stored: Vec<String> = self.store.get(KEY_CAPTURE_LINES).unwrap_or_default();
        self.lines = stored.into_iter().collect();
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }

        if !self.lines.is_empty() {
            info!("Restored {} capture lines", self.lines.len());
        }
    }

    /// Wipe the window and its stored mirror
    pub fn clear(&mut self) {
        self.lines.clear();
        self.store.remove(KEY_CAPTURE_LINES);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn persist(&self) {
        let window: Vec<&String> = self.lines.iter().collect();
        if let Err(e) = self.store.put(KEY_CAPTURE_LINES, &window) {
            warn!("Failed to persist capture lines: {}", e);
        }
    }
}
