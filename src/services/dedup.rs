//! Deduplication index over previously seen titles and links.

use std::collections::HashSet;

use crate::models::PriorEntry;

/// Lower-cased titles and links seen so far.
///
/// Append-only for the lifetime of a run. Not `Sync`-guarded: a run touches
/// it from a single logical flow.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    seen: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the title and link of every prior entry.
    pub fn seed_from(&mut self, prior: &[PriorEntry]) {
        for entry in prior {
            for key in entry.keys() {
                self.add(key);
            }
        }
    }

    /// Case-insensitive membership test for a single fingerprint.
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.seen.contains(&fingerprint.to_lowercase())
    }

    /// Insert a fingerprint; returns `false` if it was already present.
    pub fn add(&mut self, fingerprint: &str) -> bool {
        self.seen.insert(fingerprint.to_lowercase())
    }

    /// A listing is a duplicate when either its title or its link was seen.
    pub fn is_duplicate(&self, title: &str, link: &str) -> bool {
        self.contains(title) || self.contains(link)
    }

    /// Register both fingerprints of an accepted listing.
    pub fn register(&mut self, title: &str, link: &str) {
        self.add(title);
        self.add(link);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
