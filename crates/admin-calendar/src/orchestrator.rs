//! Retry/fallback orchestrator.
//!
//! A fetch walks a fixed state machine:
//!
//! 1. serve a fresh cache entry unless a refresh is forced,
//! 2. probe the user and job endpoints (see [`crate::probe`]),
//! 3. substitute mock records outside production when nothing was found,
//! 4. retry the whole probe with exponential backoff on transport failure,
//! 5. fall back to any cached entry, even an expired one, once retries run out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared_types::{CalendarEvent, DateRange, Filters, Pagination};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::builder::{EventBuilder, MissingResumeDate};
use crate::cache::{CacheEntry, CacheKey, EventCache};
use crate::config::{env_or, Environment};
use crate::error::{CalendarError, CalendarResult};
use crate::mock;
use crate::notice::Notice;
use crate::probe::{self, ProbeOutcome};
use crate::source::{DataSource, QueryParams};

/// Configuration for fetching and caching
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// How long a cache entry stays fresh (default: 5 minutes)
    pub cache_ttl: Duration,
    /// Maximum cache entries; `None` grows for the session lifetime
    pub cache_capacity: Option<usize>,
    /// Full probe sequences attempted before giving up
    pub max_attempts: u32,
    /// Backoff after failed attempt `n` (0-based) is `backoff_base * 2^n`
    pub backoff_base: Duration,
    pub environment: Environment,
    pub missing_resume_date: MissingResumeDate,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_capacity: Some(64),
            max_attempts: 3,
            backoff_base: Duration::from_millis(1000),
            environment: Environment::Development,
            missing_resume_date: MissingResumeDate::UseNow,
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let capacity: usize = env_or("CALENDAR_CACHE_CAPACITY", 64);
        let skip_undated: bool = env_or("CALENDAR_SKIP_UNDATED_RESUMES", false);

        Self {
            cache_ttl: Duration::from_secs(env_or("CALENDAR_CACHE_TTL_SECS", 300)),
            cache_capacity: (capacity > 0).then_some(capacity),
            max_attempts: env_or("CALENDAR_MAX_ATTEMPTS", 3u32).max(1),
            backoff_base: Duration::from_millis(env_or("CALENDAR_BACKOFF_BASE_MS", 1000)),
            environment: Environment::default(),
            missing_resume_date: if skip_undated {
                MissingResumeDate::Skip
            } else {
                MissingResumeDate::UseNow
            },
        }
    }
}

/// One calendar view to load
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub range: DateRange,
    pub filters: Filters,
    pub page: u32,
    pub limit: u32,
    /// Skip the cache check and always hit the network
    pub force_refresh: bool,
}

impl FetchRequest {
    pub fn new(range: DateRange, filters: Filters, pagination: Pagination) -> Self {
        Self {
            range,
            filters,
            page: pagination.page.max(1),
            limit: pagination.limit.max(1),
            force_refresh: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.range, &self.filters, self.page, self.limit)
    }

    fn query(&self) -> QueryParams {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("sort".to_string(), "-createdAt".to_string()),
            ("populate".to_string(), "false".to_string()),
            ("lean".to_string(), "true".to_string()),
        ]
    }
}

/// Where the events of an outcome came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataOrigin {
    /// Fresh cache entry, no network call made
    Cache,
    /// Live API data; endpoints that served users and jobs
    Network {
        users: Option<&'static str>,
        jobs: Option<&'static str>,
    },
    /// Synthetic records (non-production only)
    Mock,
    /// Expired or foreign cache entry served after a terminal failure
    StaleCache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub events: Vec<CalendarEvent>,
    pub pagination: Pagination,
    pub origin: DataOrigin,
    pub notices: Vec<Notice>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchOutcome {
    fn from_entry(entry: &CacheEntry, origin: DataOrigin) -> Self {
        Self {
            events: entry.events.clone(),
            pagination: entry.pagination,
            origin,
            notices: Vec::new(),
            fetched_at: entry.fetched_at,
        }
    }
}

/// Error-count/backoff bookkeeping across fetches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureState {
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_backoff: Option<Duration>,
}

/// Delay after failed attempt `attempt` (0-based)
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Fetches calendar views through cache, endpoint probing and fallbacks
pub struct CalendarService {
    source: Arc<dyn DataSource>,
    config: FetchConfig,
    cache: Mutex<EventCache>,
    pagination: Mutex<Pagination>,
    failures: Mutex<FailureState>,
}

impl CalendarService {
    pub fn new(source: Arc<dyn DataSource>, config: FetchConfig) -> Self {
        let cache = EventCache::new(config.cache_ttl, config.cache_capacity);
        Self {
            source,
            config,
            cache: Mutex::new(cache),
            pagination: Mutex::new(Pagination::default()),
            failures: Mutex::new(FailureState::default()),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Run the fetch state machine for `request`.
    ///
    /// A cancelled fetch returns [`CalendarError::Cancelled`] and leaves the
    /// cache and pagination untouched.
    pub async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> CalendarResult<FetchOutcome> {
        let key = request.cache_key();

        if !request.force_refresh {
            if let Some(entry) = self.cache.lock().await.get_fresh(&key) {
                tracing::debug!("Cache hit for {} (age {:?})", key, entry.age());
                return Ok(FetchOutcome::from_entry(entry, DataOrigin::Cache));
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Fetch for {} cancelled", key);
                Err(CalendarError::Cancelled)
            }
            result = self.fetch_remote(request, key.clone()) => result,
        }
    }

    async fn fetch_remote(&self, request: &FetchRequest, key: CacheKey) -> CalendarResult<FetchOutcome> {
        let query = request.query();
        let mut last_error = String::from("no attempt made");

        for attempt in 0..self.config.max_attempts {
            let (users, jobs) = probe::probe_all(self.source.as_ref(), &query).await;

            let nothing_found = !users.is_found() && !jobs.is_found();
            if nothing_found && (users.is_unreachable() || jobs.is_unreachable()) {
                last_error = unreachable_reason(&users, &jobs);
                let delay = backoff_delay(self.config.backoff_base, attempt);
                self.record_failure(&last_error, delay).await;

                if attempt + 1 < self.config.max_attempts {
                    tracing::warn!(
                        "Calendar fetch attempt {}/{} failed ({}), retrying in {:?}",
                        attempt + 1,
                        self.config.max_attempts,
                        last_error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            return Ok(self.complete(request, key, users, jobs).await);
        }

        self.emergency_fallback(&key, last_error).await
    }

    async fn complete(
        &self,
        request: &FetchRequest,
        key: CacheKey,
        users: ProbeOutcome,
        jobs: ProbeOutcome,
    ) -> FetchOutcome {
        let mut notices = Vec::new();

        let partial = users.is_unreachable() || jobs.is_unreachable();
        if partial {
            let missing = if users.is_unreachable() { "users" } else { "jobs" };
            tracing::warn!("Serving partial calendar data: {} unavailable", missing);
            notices.push(Notice::warning(format!(
                "Could not load {}; the calendar is incomplete",
                missing
            )));
        }

        let users_endpoint = found_endpoint(&users);
        let jobs_endpoint = found_endpoint(&jobs);
        let (mut user_records, users_total) = users.into_records();
        let (mut job_records, jobs_total) = jobs.into_records();
        let mut origin = DataOrigin::Network {
            users: users_endpoint,
            jobs: jobs_endpoint,
        };

        if user_records.is_empty() && job_records.is_empty() {
            if self.config.environment.is_production() {
                tracing::info!("No calendar records returned for {}", key);
            } else {
                tracing::warn!("No calendar records returned, substituting sample data");
                user_records = mock::mock_users(&request.range);
                job_records = mock::mock_jobs(&request.range);
                origin = DataOrigin::Mock;
                notices.push(Notice::warning(
                    "The API returned no data; showing sample events",
                ));
            }
        }

        let report = EventBuilder::new(request.range, Utc::now())
            .with_missing_resume_date(self.config.missing_resume_date)
            .build_all(&user_records, &job_records);

        if let Some(warning) = report.warning() {
            tracing::warn!("{}", warning);
            notices.push(Notice::warning(warning));
        }

        let events: Vec<CalendarEvent> = report
            .events
            .into_iter()
            .filter(|event| request.filters.matches(event))
            .collect();

        let (users_total, jobs_total) = if origin == DataOrigin::Mock {
            (user_records.len() as u64, job_records.len() as u64)
        } else {
            (users_total, jobs_total)
        };
        let seen = u64::from(request.page) * u64::from(request.limit);
        let pagination = Pagination {
            page: request.page,
            limit: request.limit,
            has_more: seen < users_total.max(jobs_total),
            total: users_total + jobs_total,
        };

        tracing::info!(
            "Loaded {} calendar events for {} ({:?})",
            events.len(),
            key,
            origin
        );

        // Sample and partial data are never cached so the next fetch goes back to the API
        if origin != DataOrigin::Mock && !partial {
            self.cache
                .lock()
                .await
                .put(CacheEntry::new(key, events.clone(), pagination));
        }
        *self.pagination.lock().await = pagination;
        *self.failures.lock().await = FailureState::default();

        FetchOutcome {
            events,
            pagination,
            origin,
            notices,
            fetched_at: Utc::now(),
        }
    }

    async fn emergency_fallback(&self, key: &CacheKey, last_error: String) -> CalendarResult<FetchOutcome> {
        let cache = self.cache.lock().await;

        match cache.get_any(key) {
            Some(entry) => {
                tracing::warn!(
                    "Calendar fetch failed after {} attempts, serving cached {} from {}",
                    self.config.max_attempts,
                    entry.key,
                    entry.fetched_at
                );
                let mut outcome = FetchOutcome::from_entry(entry, DataOrigin::StaleCache);
                outcome.notices.push(Notice::warning(format!(
                    "Could not reach the server; showing data from {} which may be stale",
                    entry.fetched_at.format("%Y-%m-%d %H:%M UTC")
                )));
                Ok(outcome)
            }
            None => {
                tracing::error!(
                    "Calendar fetch failed after {} attempts with no cache: {}",
                    self.config.max_attempts,
                    last_error
                );
                Err(CalendarError::FetchFailed {
                    attempts: self.config.max_attempts,
                    last_error,
                })
            }
        }
    }

    async fn record_failure(&self, error: &str, backoff: Duration) {
        let mut failures = self.failures.lock().await;
        failures.consecutive_failures += 1;
        failures.last_error = Some(error.to_string());
        failures.last_backoff = Some(backoff);
    }

    /// Any cached view for `request`, ignoring the TTL
    pub async fn cached(&self, request: &FetchRequest) -> Option<FetchOutcome> {
        let cache = self.cache.lock().await;
        cache
            .get_any(&request.cache_key())
            .map(|entry| FetchOutcome::from_entry(entry, DataOrigin::StaleCache))
    }

    /// Drop every cached view
    pub async fn invalidate(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn pagination(&self) -> Pagination {
        *self.pagination.lock().await
    }

    pub async fn failure_state(&self) -> FailureState {
        self.failures.lock().await.clone()
    }
}

fn found_endpoint(outcome: &ProbeOutcome) -> Option<&'static str> {
    match outcome {
        ProbeOutcome::Found { endpoint, .. } => Some(*endpoint),
        _ => None,
    }
}

fn unreachable_reason(users: &ProbeOutcome, jobs: &ProbeOutcome) -> String {
    [users, jobs]
        .into_iter()
        .find_map(|outcome| match outcome {
            ProbeOutcome::Unreachable { last_error, .. } => Some(last_error.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "endpoints unreachable".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{portal_jobs, portal_users, ScriptedSource};
    use chrono::TimeZone;
    use serde_json::json;
    use shared_types::{EventType, EventTypeFilter};
    use tokio::time::Instant;

    fn may() -> DateRange {
        DateRange::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 59).unwrap(),
        )
    }

    fn request() -> FetchRequest {
        FetchRequest::new(may(), Filters::default(), Pagination::first_page(100))
    }

    fn service(source: &Arc<ScriptedSource>, environment: Environment) -> CalendarService {
        CalendarService::new(
            source.clone(),
            FetchConfig {
                environment,
                ..FetchConfig::default()
            },
        )
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_fetch_within_ttl_hits_cache() {
        let source = Arc::new(ScriptedSource::portal());
        let service = service(&source, Environment::Production);
        let cancel = CancellationToken::new();

        let first = service.fetch(&request(), &cancel).await.unwrap();
        assert!(matches!(first.origin, DataOrigin::Network { .. }));
        let calls = source.call_count();

        tokio::time::advance(Duration::from_secs(120)).await;
        let second = service.fetch(&request(), &cancel).await.unwrap();
        assert_eq!(second.origin, DataOrigin::Cache);
        assert_eq!(second.events, first.events);
        assert_eq!(source.call_count(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_and_forced_refresh_hit_network() {
        let source = Arc::new(ScriptedSource::portal());
        let service = service(&source, Environment::Production);
        let cancel = CancellationToken::new();

        service.fetch(&request(), &cancel).await.unwrap();
        let calls = source.call_count();

        let forced = service.fetch(&request().forced(), &cancel).await.unwrap();
        assert!(matches!(forced.origin, DataOrigin::Network { .. }));
        assert!(source.call_count() > calls);

        let calls = source.call_count();
        tokio::time::advance(Duration::from_secs(301)).await;
        let expired = service.fetch(&request(), &cancel).await.unwrap();
        assert!(matches!(expired.origin, DataOrigin::Network { .. }));
        assert!(source.call_count() > calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_stats_rescues_users() {
        let source = Arc::new(
            ScriptedSource::new()
                .down("/admin/users")
                .down("/dashboard/users")
                .down("/users/list")
                .down("/users/all")
                .respond(
                    "/dashboard/stats",
                    json!({"success": true, "data": {"recentUsers": portal_users()}}),
                )
                .respond("/jobs", json!({"success": true, "data": portal_jobs()})),
        );
        let service = service(&source, Environment::Production);

        let outcome = service
            .fetch(&request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome.origin,
            DataOrigin::Network {
                users: Some("/dashboard/stats"),
                jobs: Some("/jobs"),
            }
        );
        let resumes = outcome
            .events
            .iter()
            .filter(|e| e.event_type == EventType::Resume)
            .count();
        assert_eq!(resumes, 2);
        assert!(outcome.notices.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_retries_with_backoff() {
        // One full probe round: 4 user endpoints, 2 job endpoints, the dashboard
        let source = Arc::new(ScriptedSource::portal().with_outage(7));
        let service = service(&source, Environment::Production);

        let started = Instant::now();
        let outcome = service
            .fetch(&request(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome.origin, DataOrigin::Network { .. }));
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
        assert_eq!(service.failure_state().await, FailureState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_responses_do_not_back_off() {
        let source = Arc::new(
            ScriptedSource::new()
                .respond("/admin/users", json!({"success": true, "data": []}))
                .respond("/jobs", json!([])),
        );
        let service = service(&source, Environment::Production);

        let started = Instant::now();
        let outcome = service
            .fetch(&request(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.events.is_empty());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_serves_stale_cache() {
        let source = Arc::new(ScriptedSource::portal());
        let service = service(&source, Environment::Production);
        let cancel = CancellationToken::new();

        let fresh = service.fetch(&request(), &cancel).await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        source.set_outage(usize::MAX);

        let started = Instant::now();
        let stale = service.fetch(&request(), &cancel).await.unwrap();
        assert_eq!(stale.origin, DataOrigin::StaleCache);
        assert_eq!(stale.events, fresh.events);
        assert_eq!(stale.notices.len(), 1);
        // backoff of 1s + 2s between the three attempts
        assert_eq!(started.elapsed(), Duration::from_secs(3));

        let failures = service.failure_state().await;
        assert_eq!(failures.consecutive_failures, 3);
        assert!(failures.last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_without_cache_is_an_error() {
        let source = Arc::new(ScriptedSource::new().with_outage(usize::MAX));
        let service = service(&source, Environment::Development);

        let result = service.fetch(&request(), &CancellationToken::new()).await;
        match result {
            Err(CalendarError::FetchFailed { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected FetchFailed, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_fallback_only_outside_production() {
        let empty = || {
            Arc::new(
                ScriptedSource::new()
                    .respond("/admin/users", json!([]))
                    .respond("/jobs", json!([])),
            )
        };

        let dev_source = empty();
        let dev = service(&dev_source, Environment::Development);
        let outcome = dev.fetch(&request(), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.origin, DataOrigin::Mock);
        assert!(!outcome.events.is_empty());
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(dev.cache_len().await, 0);

        let prod_source = empty();
        let prod = service(&prod_source, Environment::Production);
        let outcome = prod.fetch(&request(), &CancellationToken::new()).await.unwrap();
        assert!(matches!(outcome.origin, DataOrigin::Network { .. }));
        assert!(outcome.events.is_empty());
        assert!(outcome.notices.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filters_apply_to_events() {
        let source = Arc::new(ScriptedSource::portal());
        let service = service(&source, Environment::Production);

        let mut request = request();
        request.filters.event_type = EventTypeFilter::Deadline;
        let outcome = service.fetch(&request, &CancellationToken::new()).await.unwrap();

        assert!(!outcome.events.is_empty());
        assert!(outcome.events.iter().all(|e| e.event_type == EventType::Deadline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_data_warns() {
        // Jobs are down while their alias and the dashboard answer 404
        let source = Arc::new(
            ScriptedSource::new()
                .respond("/admin/users", json!({"success": true, "data": portal_users()}))
                .down("/jobs"),
        );
        let service = service(&source, Environment::Production);

        let started = Instant::now();
        let outcome = service
            .fetch(&request(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(outcome.notices.len(), 1);
        assert!(outcome.notices[0].message.contains("jobs"));
        assert!(outcome.events.iter().all(|e| e.event_type == EventType::Resume));
        assert_eq!(service.cache_len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_outage_retries_then_serves_stale_cache() {
        // Only the primaries exist; aliases and the dashboard answer 404
        let source = Arc::new(ScriptedSource::portal());
        let service = service(&source, Environment::Production);
        let cancel = CancellationToken::new();

        let fresh = service.fetch(&request(), &cancel).await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        source.set_down("/admin/users");
        source.set_down("/jobs");

        let started = Instant::now();
        let outage = service.fetch(&request(), &cancel).await.unwrap();
        assert_eq!(outage.origin, DataOrigin::StaleCache);
        assert_eq!(outage.events, fresh.events);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert_eq!(service.failure_state().await.consecutive_failures, 3);

        source.set_route("/admin/users", json!({"success": true, "data": portal_users()}));
        source.set_route("/jobs", json!({"success": true, "data": portal_jobs()}));
        let recovered = service.fetch(&request(), &cancel).await.unwrap();
        assert!(matches!(recovered.origin, DataOrigin::Network { .. }));
        assert_eq!(recovered.events.len(), fresh.events.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_outage_is_not_masked_by_sample_data() {
        let source = Arc::new(ScriptedSource::new().down("/admin/users").down("/jobs"));
        let service = service(&source, Environment::Development);

        let result = service.fetch(&request(), &CancellationToken::new()).await;
        assert!(matches!(result, Err(CalendarError::FetchFailed { attempts: 3, .. })));
        assert_eq!(source.calls_to(probe::DASHBOARD), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_fetch_writes_nothing() {
        let source = Arc::new(ScriptedSource::portal().with_outage(7));
        let service = Arc::new(service(&source, Environment::Production));
        let cancel = CancellationToken::new();

        let task = {
            let service = service.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { service.fetch(&request(), &cancel).await })
        };

        // Let the first attempt fail and the backoff start, then cancel
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(CalendarError::Cancelled)));
        assert_eq!(service.cache_len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_updated_after_fetch() {
        let source = Arc::new(
            ScriptedSource::new()
                .respond("/admin/users", json!({"success": true, "data": portal_users(), "total": 250}))
                .respond("/jobs", json!({"success": true, "data": portal_jobs(), "total": 40})),
        );
        let service = service(&source, Environment::Production);

        service
            .fetch(&request(), &CancellationToken::new())
            .await
            .unwrap();
        let pagination = service.pagination().await;
        assert_eq!(pagination.total, 290);
        assert!(pagination.has_more);
        assert_eq!(pagination.page, 1);
    }
}
