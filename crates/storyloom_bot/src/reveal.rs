//! Paced, cancellable reveal of newly accepted phrases.
//!
//! Each merged batch is revealed after the reader has had time to go through
//! the existing story (`existing_words * per_word + base`), then one phrase
//! every `stagger`. Deadlines never go backwards: a phrase from a later batch
//! is always revealed after every phrase already scheduled.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use storyloom_core::Phrase;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Reveal pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Reading time per existing story word (ms)
    #[serde(default = "default_per_word_ms")]
    pub per_word_ms: u64,

    /// Fixed delay added before each batch (ms)
    #[serde(default = "default_base_ms")]
    pub base_ms: u64,

    /// Gap between phrases of a batch (ms)
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
}

fn default_per_word_ms() -> u64 {
    1000
}

fn default_base_ms() -> u64 {
    1000
}

fn default_stagger_ms() -> u64 {
    2000
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            per_word_ms: default_per_word_ms(),
            base_ms: default_base_ms(),
            stagger_ms: default_stagger_ms(),
        }
    }
}

/// Delay of each phrase of a batch, measured from the start of its cycle.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use storyloom_bot::{RevealConfig, reveal_delays};
///
/// let delays = reveal_delays(&RevealConfig::default(), 3, 5);
/// assert_eq!(
///     delays,
///     vec![
///         Duration::from_millis(6000),
///         Duration::from_millis(8000),
///         Duration::from_millis(10000),
///     ]
/// );
/// ```
pub fn reveal_delays(config: &RevealConfig, count: usize, existing_words: usize) -> Vec<Duration> {
    let base = (existing_words as u64)
        .saturating_mul(config.per_word_ms)
        .saturating_add(config.base_ms);
    (0..count as u64)
        .map(|i| Duration::from_millis(base.saturating_add(i.saturating_mul(config.stagger_ms))))
        .collect()
}

/// A phrase becoming visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealEvent {
    /// Batch the phrase belongs to
    pub batch: u64,
    /// Position within the batch
    pub index: usize,
    /// The revealed phrase
    pub phrase: Phrase,
    /// Rendered line: capitalised, trailing comma
    pub line: String,
}

#[derive(Debug, Default)]
struct PendingReveals {
    batches: BTreeMap<u64, Vec<JoinHandle<()>>>,
    last_deadline: Option<Instant>,
}

impl PendingReveals {
    fn prune(&mut self) {
        self.batches.retain(|_, handles| {
            handles.retain(|handle| !handle.is_finished());
            !handles.is_empty()
        });
    }
}

/// Schedules reveal timers and publishes [`RevealEvent`]s.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug)]
pub struct RevealScheduler {
    config: RevealConfig,
    events: broadcast::Sender<RevealEvent>,
    next_batch: AtomicU64,
    pending: Mutex<PendingReveals>,
}

impl RevealScheduler {
    /// Create a scheduler whose event channel buffers `capacity` reveals per
    /// lagging subscriber.
    pub fn new(config: RevealConfig, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            config,
            events,
            next_batch: AtomicU64::new(1),
            pending: Mutex::new(PendingReveals::default()),
        }
    }

    /// Active pacing.
    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Receive every reveal from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RevealEvent> {
        self.events.subscribe()
    }

    /// Schedule a batch whose cycle starts now.
    pub fn schedule(&self, phrases: Vec<Phrase>, existing_words: usize) -> Option<u64> {
        self.schedule_from(Instant::now(), phrases, existing_words)
    }

    /// Schedule a batch whose cycle started at `origin`.
    ///
    /// Returns the batch id, or `None` for an empty batch.
    pub fn schedule_from(
        &self,
        origin: Instant,
        phrases: Vec<Phrase>,
        existing_words: usize,
    ) -> Option<u64> {
        if phrases.is_empty() {
            return None;
        }

        let batch = self.next_batch.fetch_add(1, Ordering::Relaxed);
        let delays = reveal_delays(&self.config, phrases.len(), existing_words);
        let min_gap = Duration::from_millis(self.config.stagger_ms.max(1));

        let mut pending = self.pending.lock();
        pending.prune();

        let mut handles = Vec::with_capacity(phrases.len());
        for (index, (phrase, delay)) in phrases.into_iter().zip(delays).enumerate() {
            let mut deadline = origin + delay;
            if let Some(last) = pending.last_deadline
                && deadline <= last
            {
                deadline = last + min_gap;
            }
            pending.last_deadline = Some(deadline);

            let events = self.events.clone();
            let event = RevealEvent {
                batch,
                index,
                line: phrase.display_line(),
                phrase,
            };
            handles.push(tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                debug!(batch = event.batch, index = event.index, "Revealing phrase");
                // No subscribers is fine
                let _ = events.send(event);
            }));
        }

        debug!(batch, phrases = handles.len(), existing_words, "Scheduled reveals");
        pending.batches.insert(batch, handles);
        Some(batch)
    }

    /// Cancel the remaining reveals of one batch.
    pub fn cancel(&self, batch: u64) -> bool {
        let handles = self.pending.lock().batches.remove(&batch);
        match handles {
            Some(handles) => {
                handles.iter().for_each(JoinHandle::abort);
                true
            }
            None => false,
        }
    }

    /// Cancel every pending reveal; returns the number of batches cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut pending = self.pending.lock();
        pending.prune();
        let batches = std::mem::take(&mut pending.batches);
        pending.last_deadline = None;
        drop(pending);

        let count = batches.len();
        batches
            .values()
            .flatten()
            .for_each(JoinHandle::abort);
        if count > 0 {
            info!(batches = count, "Cancelled pending reveals");
        }
        count
    }

    /// Batches with at least one reveal still waiting.
    pub fn pending_batches(&self) -> usize {
        let mut pending = self.pending.lock();
        pending.prune();
        pending.batches.len()
    }
}

impl Drop for RevealScheduler {
    fn drop(&mut self) {
        let pending = self.pending.get_mut();
        pending
            .batches
            .values()
            .flatten()
            .for_each(JoinHandle::abort);
    }
}
