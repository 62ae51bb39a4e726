//! Memoized fitness values.
//!
//! Placement is a pure function of the genome and the run configuration, so a
//! score computed once is valid for the rest of the run. Entries are never
//! invalidated.

use crate::{Error, Result};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Thread-safe, append-only fitness table keyed by a canonical genome.
#[derive(Debug)]
pub struct FitnessCache<K> {
    scores: RwLock<HashMap<K, f64>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<K: Hash + Eq + Clone> FitnessCache<K> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            scores: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Looks up a score, counting the hit or miss.
    pub fn get(&self, key: &K) -> Result<Option<f64>> {
        let scores = self
            .scores
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire fitness read lock: {}", e)))?;
        let found = scores.get(key).copied();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    /// Stores a score. The first value stored for a key is kept.
    pub fn insert(&self, key: K, score: f64) -> Result<f64> {
        let mut scores = self
            .scores
            .write()
            .map_err(|e| Error::Internal(format!("Failed to acquire fitness write lock: {}", e)))?;
        Ok(*scores.entry(key).or_insert(score))
    }

    /// Returns the cached score or computes, stores and returns it.
    pub fn get_or_compute<F>(&self, key: &K, compute: F) -> Result<f64>
    where
        F: FnOnce() -> Result<f64>,
    {
        if let Some(score) = self.get(key)? {
            return Ok(score);
        }
        let score = compute()?;
        self.insert(key.clone(), score)
    }

    /// Number of distinct genomes scored.
    pub fn len(&self) -> usize {
        self.scores.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns true if nothing has been scored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that required a computation.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

impl<K: Hash + Eq + Clone> Default for FitnessCache<K> {
    fn default() -> Self {
        Self::new()
    }
}
