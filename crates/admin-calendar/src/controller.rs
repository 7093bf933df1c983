//! Headless view/controller for the admin calendar.
//!
//! Owns the view state (range, filters, pagination, revealed events, loading
//! flag, error banner and pending notices) and every timer that touches it:
//! the debounced range change, the periodic refresh, the loading watchdog and
//! the batch reveal. All of them hang off one shutdown token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared_types::{CalendarEvent, DateRange, Filters, Pagination, ViewMode};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::batch::{BatchConfig, BatchRenderer, Visibility};
use crate::builder;
use crate::config::env_or;
use crate::error::{CalendarError, CalendarResult};
use crate::export::{self, ExportFormat};
use crate::notice::Notice;
use crate::orchestrator::{CalendarService, DataOrigin, FetchOutcome, FetchRequest};
use crate::store::FilterStore;

/// Timing configuration for the controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Quiet period before a date-range change triggers a fetch
    pub debounce: Duration,
    /// Periodic refresh interval (default: 5 minutes)
    pub refresh_interval: Duration,
    /// Periodic refresh is skipped when the last refresh is younger than this
    pub min_refresh_gap: Duration,
    /// Loading longer than this is force-cleared
    pub loading_timeout: Duration,
    pub page_limit: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(400),
            refresh_interval: Duration::from_secs(300),
            min_refresh_gap: Duration::from_secs(60),
            loading_timeout: Duration::from_secs(10),
            page_limit: 100,
        }
    }
}

impl ControllerConfig {
    pub fn from_env() -> Self {
        Self {
            debounce: Duration::from_millis(env_or("CALENDAR_DEBOUNCE_MS", 400)),
            refresh_interval: Duration::from_secs(env_or("CALENDAR_REFRESH_INTERVAL_SECS", 300)),
            min_refresh_gap: Duration::from_secs(env_or("CALENDAR_MIN_REFRESH_GAP_SECS", 60)),
            loading_timeout: Duration::from_secs(env_or("CALENDAR_LOADING_TIMEOUT_SECS", 10)),
            page_limit: env_or("CALENDAR_PAGE_LIMIT", 100u32).max(1),
        }
    }
}

/// Snapshot of everything the calendar view renders
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Range loaded from the API
    pub date_range: DateRange,
    /// Part of `date_range` on screen, such as one week of a loaded month.
    /// Events inside it are revealed first.
    pub shown: DateRange,
    pub view_mode: ViewMode,
    pub filters: Filters,
    pub pagination: Pagination,
    /// Every event of the current view in chronological order; exports read this list
    pub events: Vec<CalendarEvent>,
    /// Events revealed so far by the batch renderer
    pub visible: Vec<CalendarEvent>,
    pub loading: bool,
    /// Error banner; cleared by the next successful load
    pub error: Option<String>,
    pub origin: Option<DataOrigin>,
    pub last_refresh: Option<DateTime<Utc>>,
    /// Notices not yet taken by the host
    pub notices: Vec<Notice>,
}

impl ViewState {
    fn new(date_range: DateRange, filters: Filters, page_limit: u32) -> Self {
        Self {
            date_range,
            shown: date_range,
            view_mode: ViewMode::default(),
            filters,
            pagination: Pagination::first_page(page_limit),
            events: Vec::new(),
            visible: Vec::new(),
            loading: false,
            error: None,
            origin: None,
            last_refresh: None,
            notices: Vec::new(),
        }
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.visible.len() >= self.events.len()
    }
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

struct Inner {
    service: Arc<CalendarService>,
    renderer: BatchRenderer,
    filter_store: FilterStore,
    config: ControllerConfig,
    state: watch::Sender<ViewState>,
    visibility: watch::Sender<Visibility>,
    generation: AtomicU64,
    in_flight: Mutex<Option<InFlight>>,
    debounce: Mutex<Option<CancellationToken>>,
    reveal: Mutex<Option<CancellationToken>>,
    custom_events: Mutex<Vec<CalendarEvent>>,
    last_refresh_at: Mutex<Option<Instant>>,
    shutdown: CancellationToken,
}

/// Cheap to clone; clones share the same state and timers
#[derive(Clone)]
pub struct CalendarController {
    inner: Arc<Inner>,
}

impl CalendarController {
    /// Create a controller showing `date_range` with the persisted filters
    pub fn new(
        service: Arc<CalendarService>,
        filter_store: FilterStore,
        config: ControllerConfig,
        batch: BatchConfig,
        date_range: DateRange,
    ) -> Self {
        let filters = filter_store.load();
        let (state, _) = watch::channel(ViewState::new(date_range, filters, config.page_limit));
        let (visibility, _) = watch::channel(Visibility::Visible);

        Self {
            inner: Arc::new(Inner {
                service,
                renderer: BatchRenderer::new(batch),
                filter_store,
                config,
                state,
                visibility,
                generation: AtomicU64::new(0),
                in_flight: Mutex::new(None),
                debounce: Mutex::new(None),
                reveal: Mutex::new(None),
                custom_events: Mutex::new(Vec::new()),
                last_refresh_at: Mutex::new(None),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn snapshot(&self) -> ViewState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.state.subscribe()
    }

    /// Drain pending notices
    pub fn take_notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        self.inner
            .state
            .send_modify(|state| notices = std::mem::take(&mut state.notices));
        notices
    }

    /// Load the current view, served from cache when fresh
    pub async fn load(&self) -> CalendarResult<()> {
        self.run_fetch(false).await
    }

    /// Reload the current view from the network
    pub async fn refresh(&self) -> CalendarResult<()> {
        self.run_fetch(true).await
    }

    /// Show `range` right away and fetch it once the range stops changing
    pub async fn set_date_range(&self, range: DateRange) {
        self.inner.state.send_modify(|state| {
            state.date_range = range;
            state.shown = range;
        });

        let token = self.inner.shutdown.child_token();
        if let Some(previous) = self.inner.debounce.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let controller = self.clone();
        let delay = self.inner.config.debounce;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if let Err(e) = controller.run_fetch(false).await {
                tracing::debug!("Fetch after range change ended: {}", e);
            }
        });
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.inner.state.send_modify(|state| state.view_mode = mode);
    }

    /// Scroll the view to `shown` without fetching; the next reveal starts there
    pub fn set_shown_range(&self, shown: DateRange) {
        self.inner.state.send_modify(|state| state.shown = shown);
    }

    /// Persist `filters`, go back to page 1 and fetch immediately
    pub async fn set_filters(&self, filters: Filters) -> CalendarResult<()> {
        if let Err(e) = self.inner.filter_store.save(&filters) {
            tracing::warn!("Could not persist calendar filters: {}", e);
            self.push_notice(Notice::warning(
                "Filters could not be saved and will reset on restart",
            ));
        }

        self.inner.state.send_modify(|state| {
            state.filters = filters;
            state.pagination = state.pagination.with_page(1);
        });
        self.cancel_pending_range_fetch().await;
        self.run_fetch(false).await
    }

    pub async fn set_page(&self, page: u32) -> CalendarResult<()> {
        self.inner
            .state
            .send_modify(|state| state.pagination = state.pagination.with_page(page));
        self.run_fetch(false).await
    }

    /// Advance one page; `Ok(false)` when there is nothing more to load
    pub async fn next_page(&self) -> CalendarResult<bool> {
        let pagination = self.inner.state.borrow().pagination;
        if !pagination.has_more {
            return Ok(false);
        }
        self.set_page(pagination.page + 1).await?;
        Ok(true)
    }

    pub fn set_visibility(&self, visibility: Visibility) {
        tracing::debug!("Calendar visibility changed to {:?}", visibility);
        self.inner.visibility.send_replace(visibility);
    }

    pub fn visibility(&self) -> Visibility {
        *self.inner.visibility.borrow()
    }

    /// Add an admin-created entry. It is kept across refreshes for the session.
    pub async fn add_custom_event(
        &self,
        title: impl Into<String>,
        start: DateTime<Utc>,
        note: Option<String>,
    ) -> CalendarEvent {
        let event = builder::custom_event(title, start, note);
        self.inner.custom_events.lock().await.push(event.clone());

        self.inner.state.send_modify(|state| {
            if state.date_range.contains(event.start) && state.filters.matches(&event) {
                let at = state
                    .events
                    .partition_point(|e| (e.start, &e.id) <= (event.start, &event.id));
                state.events.insert(at, event.clone());
                state.visible.push(event.clone());
            }
        });

        tracing::info!("Added custom calendar event {}", event.id);
        event
    }

    /// Serialize the current event list.
    ///
    /// An empty list yields [`CalendarError::NoData`] and an info notice.
    pub fn export(&self, format: ExportFormat) -> CalendarResult<String> {
        let events = self.inner.state.borrow().events.clone();
        match export::export(&events, format) {
            Err(CalendarError::NoData) => {
                self.push_notice(Notice::info("No data to export"));
                Err(CalendarError::NoData)
            }
            other => other,
        }
    }

    /// Spawn the periodic refresh loop. It stops on [`shutdown`](Self::shutdown).
    pub fn start_auto_refresh(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let interval = controller.inner.config.refresh_interval;
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!("Calendar auto-refresh started (interval: {:?})", interval);

            loop {
                tokio::select! {
                    _ = controller.inner.shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                if !controller.should_auto_refresh().await {
                    tracing::debug!("Skipping periodic calendar refresh");
                    continue;
                }

                if let Err(e) = controller.refresh().await {
                    tracing::warn!("Periodic calendar refresh failed: {}", e);
                }
            }

            tracing::debug!("Calendar auto-refresh stopped");
        })
    }

    /// Cancel every timer and in-flight request
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.state.send_modify(|state| state.loading = false);
        tracing::info!("Calendar controller shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    fn push_notice(&self, notice: Notice) {
        self.inner.state.send_modify(|state| state.notices.push(notice));
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    async fn cancel_pending_range_fetch(&self) {
        if let Some(pending) = self.inner.debounce.lock().await.take() {
            pending.cancel();
        }
    }

    async fn should_auto_refresh(&self) -> bool {
        let hidden = *self.inner.visibility.borrow() == Visibility::Hidden;
        let loading = self.inner.state.borrow().loading;
        if hidden || loading {
            return false;
        }

        match *self.inner.last_refresh_at.lock().await {
            Some(at) => at.elapsed() >= self.inner.config.min_refresh_gap,
            None => true,
        }
    }

    async fn run_fetch(&self, force_refresh: bool) -> CalendarResult<()> {
        let inner = &self.inner;
        if inner.shutdown.is_cancelled() {
            return Err(CalendarError::Cancelled);
        }

        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = inner.shutdown.child_token();
        let previous = inner.in_flight.lock().await.replace(InFlight {
            generation,
            cancel: cancel.clone(),
        });
        if let Some(previous) = previous {
            tracing::debug!("Fetch #{} supersedes #{}", generation, previous.generation);
            previous.cancel.cancel();
        }

        let mut request = {
            let state = inner.state.borrow();
            FetchRequest::new(state.date_range, state.filters, state.pagination)
        };
        request.force_refresh = force_refresh;

        inner.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        let watchdog = self.spawn_watchdog(generation, request.clone());

        let result = inner.service.fetch(&request, &cancel).await;
        watchdog.cancel();

        {
            let mut in_flight = inner.in_flight.lock().await;
            if in_flight.as_ref().map(|f| f.generation) == Some(generation) {
                *in_flight = None;
            }
        }

        if !self.is_current(generation) {
            tracing::debug!("Discarding result of superseded fetch #{}", generation);
            return Err(CalendarError::Cancelled);
        }

        match result {
            Ok(outcome) => {
                self.apply(outcome, &request, generation).await;
                Ok(())
            }
            Err(CalendarError::Cancelled) => {
                inner.state.send_modify(|state| state.loading = false);
                Err(CalendarError::Cancelled)
            }
            Err(e) => {
                tracing::error!("Calendar load failed: {}", e);
                let message = e.to_string();
                inner.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message.clone());
                    state.notices.push(Notice::error(message));
                });
                Err(e)
            }
        }
    }

    fn spawn_watchdog(&self, generation: u64, request: FetchRequest) -> CancellationToken {
        let token = self.inner.shutdown.child_token();
        let guard = token.clone();
        let controller = self.clone();
        let timeout = self.inner.config.loading_timeout;

        tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    controller.loading_timed_out(generation, &request).await;
                }
            }
        });

        token
    }

    async fn loading_timed_out(&self, generation: u64, request: &FetchRequest) {
        let loading = self.inner.state.borrow().loading;
        if !loading || !self.is_current(generation) {
            return;
        }

        tracing::warn!(
            "Calendar still loading after {:?}, clearing loading state",
            self.inner.config.loading_timeout
        );

        match self.inner.service.cached(request).await {
            Some(mut outcome) => {
                outcome.notices.push(Notice::warning(
                    "Loading is taking longer than expected; showing cached data",
                ));
                self.apply(outcome, request, generation).await;
            }
            None => {
                let message = "Loading timed out. Please try again.".to_string();
                self.inner.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message.clone());
                    state.notices.push(Notice::error(message));
                });
            }
        }
    }

    async fn apply(&self, outcome: FetchOutcome, request: &FetchRequest, generation: u64) {
        let mut events = outcome.events;
        events.extend(
            self.inner
                .custom_events
                .lock()
                .await
                .iter()
                .filter(|e| request.range.contains(e.start) && request.filters.matches(e))
                .cloned(),
        );
        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

        if outcome.origin != DataOrigin::StaleCache {
            *self.inner.last_refresh_at.lock().await = Some(Instant::now());
        }

        let shown = self.inner.state.borrow().shown;
        let initial = self.start_reveal(events.clone(), &shown, generation).await;

        self.inner.state.send_modify(|state| {
            state.events = events;
            state.visible = initial;
            state.pagination = outcome.pagination;
            state.loading = false;
            state.error = None;
            state.origin = Some(outcome.origin);
            state.last_refresh = Some(outcome.fetched_at);
            state.notices.extend(outcome.notices);
        });
    }

    /// Hand the first batch back and reveal the rest in the background
    async fn start_reveal(
        &self,
        events: Vec<CalendarEvent>,
        range: &DateRange,
        generation: u64,
    ) -> Vec<CalendarEvent> {
        let token = self.inner.shutdown.child_token();
        if let Some(previous) = self.inner.reveal.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let mut render = self.inner.renderer.start(
            events,
            Some(range),
            self.inner.visibility.subscribe(),
            &token,
        );
        let initial = std::mem::take(&mut render.initial);

        if !render.is_complete() {
            let controller = self.clone();
            tokio::spawn(async move {
                while let Some(batch) = render.next_batch().await {
                    if !controller.is_current(generation) {
                        break;
                    }
                    controller
                        .inner
                        .state
                        .send_modify(|state| state.visible.extend(batch));
                }
            });
        }

        initial
    }
}
