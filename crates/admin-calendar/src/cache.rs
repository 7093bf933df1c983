//! Time-windowed cache of fetched calendar views.
//!
//! Validity is checked on read: an entry is fresh while its age is below the
//! TTL. Stale entries are kept around because the orchestrator serves them as
//! an emergency fallback when every endpoint is down.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared_types::{CalendarEvent, DateRange, Filters, Pagination};
use tokio::time::Instant;

/// Cache key covering the date range, every filter dimension, page and limit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(range: &DateRange, filters: &Filters, page: u32, limit: u32) -> Self {
        CacheKey(format!(
            "calendar:{}:{}:status={}:role={}:type={}:page={}:limit={}",
            range.start.timestamp(),
            range.end.timestamp(),
            filters.status.as_str(),
            filters.role.as_str(),
            filters.event_type.as_str(),
            page,
            limit
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub events: Vec<CalendarEvent>,
    pub pagination: Pagination,
    /// Wall-clock time of the fetch, for display
    pub fetched_at: DateTime<Utc>,
    /// Monotonic insertion time, used for TTL checks
    pub timestamp: Instant,
}

impl CacheEntry {
    pub fn new(key: CacheKey, events: Vec<CalendarEvent>, pagination: Pagination) -> Self {
        Self {
            key,
            events,
            pagination,
            fetched_at: Utc::now(),
            timestamp: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// In-memory TTL cache.
///
/// With a capacity set, inserting past it evicts the oldest entry.
#[derive(Debug)]
pub struct EventCache {
    ttl: Duration,
    capacity: Option<usize>,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl EventCache {
    pub fn new(ttl: Duration, capacity: Option<usize>) -> Self {
        Self {
            ttl,
            capacity: capacity.filter(|c| *c > 0),
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.age() < self.ttl
    }

    /// Entry for `key`, regardless of age
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Entry for `key` only while it is within the TTL
    pub fn get_fresh(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.get(key).filter(|entry| self.is_fresh(entry))
    }

    /// Emergency lookup: the entry for `key` if any, else the newest entry of any key
    pub fn get_any(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.get(key).or_else(|| self.most_recent())
    }

    pub fn most_recent(&self) -> Option<&CacheEntry> {
        self.entries.values().max_by_key(|entry| entry.timestamp)
    }

    /// Insert, superseding any entry with the same key (last writer wins)
    pub fn put(&mut self, entry: CacheEntry) {
        let key = entry.key.clone();
        self.entries.insert(key.clone(), entry);

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                let oldest = self
                    .entries
                    .iter()
                    .filter(|(k, _)| **k != key)
                    .min_by_key(|(_, entry)| entry.timestamp)
                    .map(|(k, _)| k.clone());

                match oldest {
                    Some(oldest) => {
                        tracing::debug!("Evicting cache entry {}", oldest);
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared_types::{EventTypeFilter, RoleFilter, StatusFilter};

    fn range() -> DateRange {
        DateRange::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap(),
        )
    }

    fn entry(key: &CacheKey) -> CacheEntry {
        CacheEntry::new(key.clone(), vec![], Pagination::first_page(100).updated(3))
    }

    #[test]
    fn test_key_covers_every_dimension() {
        let base = Filters::default();
        let keys = [
            CacheKey::new(&range(), &base, 1, 100),
            CacheKey::new(&range(), &Filters { status: StatusFilter::Pending, ..base }, 1, 100),
            CacheKey::new(&range(), &Filters { role: RoleFilter::Trainer, ..base }, 1, 100),
            CacheKey::new(&range(), &Filters { event_type: EventTypeFilter::Deadline, ..base }, 1, 100),
            CacheKey::new(&range(), &base, 2, 100),
            CacheKey::new(&range(), &base, 1, 50),
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let mut cache = EventCache::new(Duration::from_secs(300), None);
        let key = CacheKey::new(&range(), &Filters::default(), 1, 100);
        cache.put(entry(&key));

        assert!(cache.get_fresh(&key).is_some());

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get_fresh(&key).is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get_fresh(&key).is_none());
        // Stale entries remain available for emergency use
        assert!(cache.get(&key).is_some());
        assert!(cache.get_any(&key).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_any_falls_back_to_newest_entry() {
        let mut cache = EventCache::new(Duration::from_secs(300), None);
        let older = CacheKey::new(&range(), &Filters::default(), 1, 100);
        let newer = CacheKey::new(&range(), &Filters::default(), 2, 100);
        let missing = CacheKey::new(&range(), &Filters::default(), 9, 100);

        cache.put(entry(&older));
        tokio::time::advance(Duration::from_secs(5)).await;
        cache.put(entry(&newer));

        assert_eq!(cache.get_any(&missing).map(|e| &e.key), Some(&newer));
        assert_eq!(cache.get_any(&older).map(|e| &e.key), Some(&older));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest() {
        let mut cache = EventCache::new(Duration::from_secs(300), Some(2));
        let keys: Vec<_> = (1..=3)
            .map(|page| CacheKey::new(&range(), &Filters::default(), page, 100))
            .collect();

        for key in &keys {
            cache.put(entry(key));
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&keys[0]).is_none());
        assert!(cache.get(&keys[2]).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_supersedes_same_key() {
        let mut cache = EventCache::new(Duration::from_secs(300), None);
        let key = CacheKey::new(&range(), &Filters::default(), 1, 100);

        cache.put(entry(&key));
        let replacement = CacheEntry::new(key.clone(), vec![], Pagination::first_page(100).updated(99));
        cache.put(replacement);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).map(|e| e.pagination.total), Some(99));
    }
}
