//! Connection log line parsing
//!
//! Turns raw comma-delimited capture lines into [`ConnectionRecord`]s.
//! Malformed lines are dropped, never errors.

use regex::Regex;
use tracing::debug;

use crate::record::{ConnectionRecord, Protocol};

/// Required fields: timestamp, protocol, host set, domain, source,
/// ip set, destination
const MIN_FIELDS: usize = 7;

/// Parser for capture log lines
pub struct LineGrammar {
    severity_tag: Regex,
}

impl LineGrammar {
    pub fn new() -> Self {
        Self {
            severity_tag: Regex::new(r"\s*\[[A-Z]+\]").unwrap(),
        }
    }

    /// Parse one log line
    ///
    /// Returns `None` for lines with fewer than seven comma-separated
    /// fields. Optional trailing fields (source alias, device name)
    /// default to empty. Field tokens are kept verbatim apart from the
    /// timestamp, which loses its severity tag.
    pub fn parse(&self, line: &str) -> Option<ConnectionRecord> {
        let tokens: Vec<&str> = line.trim().split(',').collect();
        if tokens.len() < MIN_FIELDS {
            debug!("Discarding line with {} fields: {:?}", tokens.len(), line);
            return None;
        }

        let timestamp_full = self
            .severity_tag
            .replace_all(tokens[0], "")
            .trim()
            .to_string();
        let timestamp = match timestamp_full.find('.') {
            Some(dot) => timestamp_full[..dot].to_string(),
            None => timestamp_full.clone(),
        };

        Some(ConnectionRecord {
            timestamp,
            timestamp_full,
            protocol: Protocol::from(tokens[1]),
            host_set: tokens[2].to_string(),
            domain: tokens[3].to_string(),
            source: tokens[4].to_string(),
            ip_set: tokens[5].to_string(),
            destination: tokens[6].to_string(),
            source_alias: tokens.get(7).copied().unwrap_or("").to_string(),
            device_name: tokens.get(8).copied().unwrap_or("").to_string(),
            raw: line.to_string(),
        })
    }
}

impl Default for LineGrammar {
    fn default() -> Self {
        Self::new()
    }
}
