//! Progressive disclosure of large event sets.
//!
//! The first batch is handed over immediately; the rest trickles out on a
//! timer from a background task, which stops emitting while the host view is
//! hidden and resumes once it becomes visible again.

use std::time::Duration;

use shared_types::{CalendarEvent, DateRange};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::env_or;

/// Configuration for batched rendering
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Events per batch; lists at or below this size render in one go
    pub batch_size: usize,
    /// Delay between follow-up batches
    pub interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            interval: Duration::from_millis(150),
        }
    }
}

impl BatchConfig {
    pub fn from_env() -> Self {
        Self {
            batch_size: env_or("CALENDAR_BATCH_SIZE", 200usize).max(1),
            interval: Duration::from_millis(env_or("CALENDAR_BATCH_INTERVAL_MS", 150)),
        }
    }
}

/// Whether the host page is currently shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Stable partition: events inside `visible` first, original order kept otherwise
pub fn prioritize(events: Vec<CalendarEvent>, visible: &DateRange) -> Vec<CalendarEvent> {
    let (mut inside, outside): (Vec<_>, Vec<_>) = events
        .into_iter()
        .partition(|event| visible.contains(event.start));
    inside.extend(outside);
    inside
}

/// A render in progress
#[derive(Debug)]
pub struct BatchRender {
    /// Events to show right away: `min(batch_size, total)` of them
    pub initial: Vec<CalendarEvent>,
    /// Events still to be revealed after the initial batch
    pub pending: usize,
    receiver: Option<mpsc::Receiver<Vec<CalendarEvent>>>,
    cancel: CancellationToken,
}

impl BatchRender {
    /// Next follow-up batch, or `None` once everything was revealed or the render was cancelled
    pub async fn next_batch(&mut self) -> Option<Vec<CalendarEvent>> {
        let batch = self.receiver.as_mut()?.recv().await;
        if let Some(batch) = &batch {
            self.pending = self.pending.saturating_sub(batch.len());
        }
        batch
    }

    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for BatchRender {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchRenderer {
    config: BatchConfig,
}

impl BatchRenderer {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Start rendering `events`.
    ///
    /// With `visible_range` set, events inside it are promoted ahead of the
    /// others before batching. Cancelling `cancel` (or dropping the returned
    /// render) stops the background task.
    pub fn start(
        &self,
        events: Vec<CalendarEvent>,
        visible_range: Option<&DateRange>,
        visibility: watch::Receiver<Visibility>,
        cancel: &CancellationToken,
    ) -> BatchRender {
        let mut events = match visible_range {
            Some(range) => prioritize(events, range),
            None => events,
        };

        let size = self.config.batch_size.max(1);
        let cancel = cancel.child_token();

        if events.len() <= size {
            return BatchRender {
                initial: events,
                pending: 0,
                receiver: None,
                cancel,
            };
        }

        let rest = events.split_off(size);
        let pending = rest.len();
        tracing::debug!(
            "Rendering {} events now, {} in batches of {}",
            events.len(),
            pending,
            size
        );

        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(reveal(
            rest,
            size,
            self.config.interval,
            visibility,
            tx,
            cancel.clone(),
        ));

        BatchRender {
            initial: events,
            pending,
            receiver: Some(rx),
            cancel,
        }
    }
}

async fn reveal(
    rest: Vec<CalendarEvent>,
    size: usize,
    interval: Duration,
    mut visibility: watch::Receiver<Visibility>,
    tx: mpsc::Sender<Vec<CalendarEvent>>,
    cancel: CancellationToken,
) {
    let mut rest = rest.into_iter();

    loop {
        while *visibility.borrow_and_update() == Visibility::Hidden {
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = visibility.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        if *visibility.borrow() == Visibility::Hidden {
            tracing::debug!("View hidden, pausing batch rendering");
            continue;
        }

        let batch: Vec<CalendarEvent> = rest.by_ref().take(size).collect();
        if batch.is_empty() {
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            sent = tx.send(batch) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}
