//! Message deduplicator.
//!
//! The server fans the same photo out over every pool, and reconnects can
//! replay recent events, so inbound frames are filtered by a fingerprint of
//! `(timestamp, first 50 bytes of image_data)`. The cache is a bounded FIFO
//! set: when it exceeds the hard cap it is trimmed in one batch to a smaller
//! retained size, not incrementally, so bursts do not thrash it. A
//! fingerprint dropped by the trim may be re-admitted later; that is an
//! accepted bounded-memory trade-off.

use std::collections::{HashSet, VecDeque};

use sha2::{Digest, Sha256};

/// Bytes of `image_data` that participate in the fingerprint.
const FINGERPRINT_PREFIX_LEN: usize = 50;

/// Hard cap on retained fingerprints.
const CACHE_CAP: usize = 1000;

/// Size the cache is trimmed back to when the cap is exceeded.
const CACHE_RETAIN: usize = 500;

pub type Fingerprint = [u8; 32];

/// Derive the dedup fingerprint for an inbound photo event.
pub fn fingerprint(timestamp: &str, image_data: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.as_bytes());
    let prefix_len = image_data.len().min(FINGERPRINT_PREFIX_LEN);
    hasher.update(&image_data.as_bytes()[..prefix_len]);
    hasher.finalize().into()
}

/// Bounded FIFO fingerprint set.
#[derive(Debug, Default)]
pub struct DedupCache {
    order: VecDeque<Fingerprint>,
    seen: HashSet<Fingerprint>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a fingerprint is seen (and records it),
    /// `false` for a duplicate within the retained window (no mutation).
    pub fn admit(&mut self, fp: Fingerprint) -> bool {
        if self.seen.contains(&fp) {
            return false;
        }
        self.seen.insert(fp);
        self.order.push_back(fp);
        if self.order.len() > CACHE_CAP {
            self.trim();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Batch trim: drop the oldest entries, keep the newest `CACHE_RETAIN`.
    fn trim(&mut self) {
        while self.order.len() > CACHE_RETAIN {
            if let Some(old) = self.order.pop_front() {
                self.seen.remove(&old);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(n: u32) -> Fingerprint {
        fingerprint(&format!("2024-01-01T00:00:{n:02}"), "payload")
    }

    #[test]
    fn first_admission_passes_second_is_rejected() {
        let mut cache = DedupCache::new();
        let f = fingerprint("2024-01-01T10:00:00", "abcdef");
        assert!(cache.admit(f));
        assert!(!cache.admit(f));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fingerprint_only_depends_on_image_prefix() {
        let long_a = format!("{}AAAA", "x".repeat(FINGERPRINT_PREFIX_LEN));
        let long_b = format!("{}BBBB", "x".repeat(FINGERPRINT_PREFIX_LEN));
        assert_eq!(
            fingerprint("2024-01-01T10:00:00", &long_a),
            fingerprint("2024-01-01T10:00:00", &long_b)
        );
        assert_ne!(
            fingerprint("2024-01-01T10:00:00", "short-a"),
            fingerprint("2024-01-01T10:00:00", "short-b")
        );
    }

    #[test]
    fn overflow_trims_in_one_batch_keeping_newest() {
        let mut cache = DedupCache::new();
        for n in 0..=(CACHE_CAP as u32) {
            assert!(cache.admit(fp(n)));
        }
        assert_eq!(cache.len(), CACHE_RETAIN);
        // Newest survive the trim, oldest were dropped and can re-admit.
        assert!(!cache.admit(fp(CACHE_CAP as u32)));
        assert!(cache.admit(fp(0)));
    }
}
