//! In-memory quote cache with a fixed TTL.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{ShippingOption, ShippingRequest};
use crate::util::hundredths;

/// Quotes are reused for 30 minutes.
pub const QUOTE_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Request signature. Numbers are kept in hundredths so float noise maps to the same key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QuoteKey {
    destination: String,
    weight: i64,
    value: i64,
    dimensions: Option<[i64; 3]>,
}

impl QuoteKey {
    pub fn new(request: &ShippingRequest) -> Self {
        Self {
            destination: request.destination.as_str().to_string(),
            weight: hundredths(request.weight_kg),
            value: hundredths(request.declared_value),
            dimensions: request.dimensions.map(|d| {
                [
                    hundredths(d.height),
                    hundredths(d.width),
                    hundredths(d.length),
                ]
            }),
        }
    }
}

/// A cache hit.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedQuote {
    pub options: Vec<ShippingOption>,
    pub billable_weight: f64,
    pub age: Duration,
}

#[derive(Debug)]
struct Cached {
    options: Vec<ShippingOption>,
    billable_weight: f64,
    stored_at: Instant,
}

impl Cached {
    fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    fn if_fresh(&self, ttl: Duration) -> Option<CachedQuote> {
        let age = self.age();
        (age <= ttl).then(|| CachedQuote {
            options: self.options.clone(),
            billable_weight: self.billable_weight,
            age,
        })
    }
}

/// Process-wide quote cache. Clones share the same entries.
#[derive(Clone, Debug)]
pub struct QuoteCache {
    entries: Arc<Mutex<HashMap<QuoteKey, Cached>>>,
    ttl: Duration,
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new(QUOTE_CACHE_TTL)
    }
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `key`, if any. An expired entry is evicted and reported as absent.
    pub fn get(&self, key: &QuoteKey) -> Option<CachedQuote> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if let Some(hit) = entry.if_fresh(self.ttl) {
            return Some(hit);
        }
        debug!(age_secs = entry.age().as_secs(), "evicting expired quote");
        entries.remove(key);
        None
    }

    /// Stores `options` under `key`, replacing any previous entry. Empty lists are ignored.
    pub fn put(&self, key: QuoteKey, options: Vec<ShippingOption>, billable_weight: f64) {
        if options.is_empty() {
            return;
        }
        self.entries.lock().insert(
            key,
            Cached {
                options,
                billable_weight,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops every entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Drops expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.age() <= self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
