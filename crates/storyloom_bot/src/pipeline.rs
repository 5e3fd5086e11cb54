//! Poll, synthesize, persist, reveal.

use crate::RevealScheduler;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use storyloom_core::{Cursor, Phrase};
use storyloom_error::StoryloomResult;
use storyloom_interface::{ChangeFeed, GenerationDriver, KeyValueStore};
use storyloom_narrative::{FeedPoller, PhraseSynthesizer, StoryStore, advance};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Eligible edits returned by the feed
    pub fetched: usize,
    /// Edits that produced a candidate phrase
    pub synthesized: usize,
    /// Edits whose synthesis failed
    pub failed: usize,
    /// Edits with no usable vocabulary or an out-of-band response
    pub skipped: usize,
    /// Phrases merged into the story, in story order
    pub accepted: Vec<Phrase>,
    /// Candidates turned away by the validation gate
    pub rejected: usize,
    /// Cursor after the cycle
    pub cursor: Option<Cursor>,
    /// Reveal batch scheduled for the accepted phrases
    pub reveal_batch: Option<u64>,
    /// True when a reset during the cycle discarded its batch
    pub discarded: bool,
}

/// Result of asking for a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was in flight; nothing was done
    Busy,
    /// The cycle ran to completion
    Completed(CycleReport),
}

/// Persisted story as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySnapshot {
    /// Accepted phrases in story order
    pub phrases: Vec<Phrase>,
    /// Total words across all phrases
    pub word_count: usize,
    /// Feed position
    pub cursor: Option<Cursor>,
}

impl StorySnapshot {
    /// One display line per phrase.
    pub fn lines(&self) -> Vec<String> {
        self.phrases.iter().map(Phrase::display_line).collect()
    }
}

/// Holds the in-flight flag for the lifetime of a cycle.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One independent story pipeline.
///
/// All mutable state lives here; several pipelines can run side by side.
pub struct StoryPipeline<F, D, S> {
    poller: FeedPoller<F>,
    synthesizer: Arc<PhraseSynthesizer<D>>,
    story: Mutex<StoryStore<S>>,
    reveals: RevealScheduler,
    busy: AtomicBool,
    epoch: AtomicU64,
}

impl<F, D, S> std::fmt::Debug for StoryPipeline<F, D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryPipeline")
            .field("busy", &self.busy)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl<F, D, S> StoryPipeline<F, D, S>
where
    F: ChangeFeed,
    D: GenerationDriver,
    S: KeyValueStore,
{
    /// Assemble a pipeline around an already opened story.
    pub fn new(
        feed: F,
        synthesizer: Arc<PhraseSynthesizer<D>>,
        story: StoryStore<S>,
        reveals: RevealScheduler,
    ) -> Self {
        Self {
            poller: FeedPoller::new(feed),
            synthesizer,
            story: Mutex::new(story),
            reveals,
            busy: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// The synthesizer, shared with the phrase endpoint.
    pub fn synthesizer(&self) -> &Arc<PhraseSynthesizer<D>> {
        &self.synthesizer
    }

    /// Reveal timers for merged phrases.
    pub fn reveals(&self) -> &RevealScheduler {
        &self.reveals
    }

    /// True while a cycle is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one poll cycle.
    ///
    /// Returns [`CycleOutcome::Busy`] without doing anything if a cycle is
    /// already running. Edits are synthesized one at a time, oldest first;
    /// a failed synthesis drops that edit only. The story merge and the
    /// cursor advance are persisted together once the whole batch is done.
    ///
    /// # Errors
    ///
    /// - Feed errors: nothing changes, the same edits are retried next cycle.
    /// - Persistence errors: the cursor does not move and the batch is retried
    ///   next cycle.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> StoryloomResult<CycleOutcome> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            debug!("Cycle already in flight, skipping trigger");
            return Ok(CycleOutcome::Busy);
        };

        let started = Instant::now();
        let epoch = self.epoch.load(Ordering::Acquire);
        let tail_words = self.synthesizer.config().story_tail_words;
        let (cursor, mut context) = {
            let story = self.story.lock().await;
            (story.cursor().cloned(), story.tail(tail_words))
        };

        let edits = self.poller.fetch_since(cursor.as_ref()).await?;
        let mut report = CycleReport {
            fetched: edits.len(),
            cursor: cursor.clone(),
            ..CycleReport::default()
        };
        if edits.is_empty() {
            debug!("No new edits");
            return Ok(CycleOutcome::Completed(report));
        }

        let mut candidates = Vec::with_capacity(edits.len());
        for edit in edits.iter().rev() {
            match self.synthesizer.synthesize(&context, edit).await {
                Ok(Some(phrase)) => {
                    if !context.is_empty() {
                        context.push(' ');
                    }
                    context.push_str(&phrase.text);
                    candidates.push(phrase);
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(edit_id = %edit.id(), error = %e, "Synthesis failed, dropping edit");
                    report.failed += 1;
                }
            }
        }
        report.synthesized = candidates.len();

        let next_cursor = advance(cursor.as_ref(), &edits);

        let mut story = self.story.lock().await;
        if self.epoch.load(Ordering::Acquire) != epoch {
            info!(candidates = candidates.len(), "Story was reset during cycle, discarding batch");
            report.discarded = true;
            report.cursor = story.cursor().cloned();
            return Ok(CycleOutcome::Completed(report));
        }

        let existing_words = story.word_count();
        let merged = story.commit(candidates, next_cursor).await?;
        report.cursor = story.cursor().cloned();
        report.rejected = merged.rejected.len();
        report.reveal_batch = self
            .reveals
            .schedule_from(started, merged.accepted.clone(), existing_words);
        report.accepted = merged.accepted;
        drop(story);

        Ok(CycleOutcome::Completed(report))
    }

    /// Run one cycle; failures are logged, never returned.
    pub async fn run_cycle_logged(&self) -> Option<CycleReport> {
        match self.run_cycle().await {
            Ok(CycleOutcome::Completed(report)) => {
                info!(
                    fetched = report.fetched,
                    accepted = report.accepted.len(),
                    rejected = report.rejected,
                    failed = report.failed,
                    batch_id = ?report.reveal_batch,
                    cursor = ?report.cursor,
                    "Cycle complete"
                );
                Some(report)
            }
            Ok(CycleOutcome::Busy) => None,
            Err(e) if e.is_feed_unavailable() => {
                warn!(error = %e, "Feed unavailable, skipping this poll");
                None
            }
            Err(e) if e.is_persistence_failed() => {
                error!(error = %e, "Failed to persist cycle, batch will be retried");
                None
            }
            Err(e) => {
                error!(error = %e, "Cycle failed");
                None
            }
        }
    }

    /// Clear the story, cursor and used-set, and cancel pending reveals.
    ///
    /// A cycle already in flight discards its batch.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the state could not be cleared; the
    /// story is then unchanged.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> StoryloomResult<()> {
        let mut story = self.story.lock().await;
        story.reset().await?;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.reveals.cancel_all();
        Ok(())
    }

    /// Current persisted story.
    pub async fn snapshot(&self) -> StorySnapshot {
        let story = self.story.lock().await;
        StorySnapshot {
            phrases: story.phrases().to_vec(),
            word_count: story.word_count(),
            cursor: story.cursor().cloned(),
        }
    }
}
