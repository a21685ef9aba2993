//! Release version bookkeeping

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::storage::{KvStore, KEY_DISMISSED_VERSIONS, KEY_INCLUDE_PRERELEASE};

/// Compare two version strings segment by segment
///
/// A leading `v` or `V` is ignored, missing and non-numeric segments
/// count as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_segments = segments(a);
    let b_segments = segments(b);

    for i in 0..a_segments.len().max(b_segments.len()) {
        let a_value = a_segments.get(i).copied().unwrap_or(0);
        let b_value = b_segments.get(i).copied().unwrap_or(0);
        match a_value.cmp(&b_value) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

/// Whether `current` should treat `latest` as an upgrade
///
/// Development builds always do.
pub fn is_version_lower(current: &str, latest: &str) -> bool {
    if strip_v(current) == "dev" {
        return true;
    }
    compare_versions(current, latest) == Ordering::Less
}

fn strip_v(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

fn segments(version: &str) -> Vec<u64> {
    strip_v(version)
        .split('.')
        .map(|segment| segment.parse::<u64>().unwrap_or(0))
        .collect()
}

/// Dismissed-release and prerelease preferences over durable storage
pub struct ReleaseNotices {
    store: KvStore,
}

impl ReleaseNotices {
    pub fn new(store: KvStore) -> Self {
        Self { store }
    }

    /// Versions the user has dismissed, oldest first
    pub fn dismissed(&self) -> Vec<String> {
        self.store.get(KEY_DISMISSED_VERSIONS).unwrap_or_default()
    }

    pub fn is_dismissed(&self, version: &str) -> bool {
        self.dismissed().iter().any(|v| v == version)
    }

    /// Record a version as dismissed, once
    pub fn dismiss(&self, version: &str) {
        let mut dismissed = self.dismissed();
        if dismissed.iter().any(|v| v == version) {
            return;
        }
        dismissed.push(version.to_string());

        match self.store.put(KEY_DISMISSED_VERSIONS, &dismissed) {
            Ok(()) => debug!("Dismissed release {}", version),
            Err(e) => warn!("Failed to save dismissed version: {}", e),
        }
    }

    pub fn include_prerelease(&self) -> bool {
        self.store.get(KEY_INCLUDE_PRERELEASE).unwrap_or(false)
    }

    pub fn set_include_prerelease(&self, include: bool) {
        if let Err(e) = self.store.put(KEY_INCLUDE_PRERELEASE, &include) {
            warn!("Failed to save prerelease preference: {}", e);
        }
    }
}
