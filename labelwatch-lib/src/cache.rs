//! Time-bounded membership set used to skip addresses that were processed recently.

use moka::sync::Cache;
use std::time::Duration;

/// Addresses processed within the cache's time to live; the value carries no information.
pub type DedupCache = Cache<String, ()>;

/// Returns an empty cache forgetting every entry `ttl` after it was inserted.
pub fn dedup_cache(ttl: Duration) -> DedupCache {
    Cache::builder().time_to_live(ttl).build()
}
