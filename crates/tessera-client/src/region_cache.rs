//! Bucket → region cache
//!
//! Shared by every in-flight request of a client. Insertion never overwrites:
//! the first resolver for a bucket wins and later resolvers observe its value.

use dashmap::DashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct RegionCache {
    regions: DashMap<String, String>,
}

impl RegionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: &str) -> Option<String> {
        self.regions.get(bucket).map(|r| r.value().clone())
    }

    /// Insert unless an entry exists; returns the region now cached
    pub fn insert_if_absent(&self, bucket: &str, region: &str) -> String {
        self.regions
            .entry(bucket.to_string())
            .or_insert_with(|| region.to_string())
            .value()
            .clone()
    }

    /// Evict a bucket, typically after the server reports it missing
    pub fn remove(&self, bucket: &str) -> Option<String> {
        let removed = self.regions.remove(bucket).map(|(_, region)| region);
        if removed.is_some() {
            debug!("Evicted region cache entry for bucket {}", bucket);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
