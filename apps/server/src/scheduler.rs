//! Background scheduler for periodic synchronization.
//!
//! Every interval it collects the keys of records written since the previous
//! tick and submits them as `index-records` batches.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use recsync_core::records::RecordRepositoryTrait;
use recsync_core::sync::SyncOptions;
use recsync_core::tasks::{Task, TaskSink};

/// Keys pulled from the store per query. A tick keeps paging until a short page.
const KEYS_PER_PAGE: usize = 10_000;

/// How far behind the tick start the watermark is left. Writes stamped before
/// a tick but committed after its scan are picked up by the next one.
const WATERMARK_OVERLAP_SECS: i64 = 5;

pub struct SyncScheduler {
    records: Arc<dyn RecordRepositoryTrait>,
    tasks: Arc<dyn TaskSink>,
    batch_size: usize,
    page_size: usize,
    overlap: chrono::Duration,
    last_tick: DateTime<Utc>,
}

impl SyncScheduler {
    pub fn new(
        records: Arc<dyn RecordRepositoryTrait>,
        tasks: Arc<dyn TaskSink>,
        batch_size: usize,
        lookback: Duration,
    ) -> Self {
        let lookback = chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::zero());
        Self {
            records,
            tasks,
            batch_size: batch_size.max(1),
            page_size: KEYS_PER_PAGE,
            overlap: chrono::Duration::seconds(WATERMARK_OVERLAP_SECS),
            last_tick: Utc::now() - lookback,
        }
    }

    /// Runs a single tick. Returns the number of tasks submitted.
    ///
    /// Changed keys are read in `updated` order, one page at a time, and the
    /// watermark follows the last page that was fully submitted. A failed
    /// listing or submission leaves the rest for the next tick.
    pub fn tick(&mut self) -> usize {
        let started = Utc::now();
        let mut submitted = 0;
        let mut scheduled = 0;
        let mut limit = self.page_size;

        loop {
            let page = match self.records.keys_updated_since(self.last_tick, limit) {
                Ok(page) => page,
                Err(e) => {
                    warn!("Scheduled sync could not list changed records: {}", e);
                    return submitted;
                }
            };
            let full = page.len() >= limit;
            let cursor = page_cursor(&page);
            if full && cursor.is_none() {
                // Every key shares one instant; widen until the page spans more.
                limit = limit.saturating_mul(2);
                continue;
            }

            let keys: Vec<String> = page.iter().map(|(key, _)| key.clone()).collect();
            for batch in keys.chunks(self.batch_size) {
                let task = Task::IndexRecords {
                    bibcodes: batch.to_vec(),
                    options: SyncOptions::default(),
                };
                if let Err(e) = self.tasks.submit(task) {
                    warn!("Scheduled sync could not submit a batch: {}", e);
                    return submitted;
                }
                submitted += 1;
            }
            scheduled += keys.len();

            match cursor {
                Some(cursor) if full => {
                    self.last_tick = cursor;
                    limit = self.page_size;
                }
                _ => break,
            }
        }

        let watermark = started - self.overlap;
        if watermark > self.last_tick {
            self.last_tick = watermark;
        }

        if scheduled == 0 {
            debug!("Scheduled sync: no records changed since {}", self.last_tick);
        } else {
            info!(
                "Scheduled sync: {} changed records in {} batches",
                scheduled, submitted
            );
        }
        submitted
    }
}

/// Watermark to resume from after a full page: just below its last `updated`,
/// so keys sharing that instant but cut off by the limit are read again.
/// `None` when that would not move past the first key of the page.
fn page_cursor(page: &[(String, DateTime<Utc>)]) -> Option<DateTime<Utc>> {
    let (_, first) = page.first()?;
    let (_, last) = page.last()?;
    let cursor = *last - chrono::Duration::microseconds(1);
    (*first <= cursor).then_some(cursor)
}

/// Starts the background scheduler. A zero period disables it.
pub fn start_sync_scheduler(mut scheduler: SyncScheduler, period: Duration) {
    if period.is_zero() {
        info!("Sync scheduler disabled");
        return;
    }

    tokio::spawn(async move {
        info!("Sync scheduler started ({:?} interval)", period);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of `interval` is immediate; skip it so the server
        // finishes starting before the first scan.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            scheduler.tick();
        }
    });
}
