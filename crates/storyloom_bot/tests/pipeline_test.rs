//! End-to-end cycles against a stub feed, a scripted generator and
//! in-memory state.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storyloom_bot::{CycleOutcome, CycleReport, RevealConfig, RevealScheduler, StoryPipeline};
use storyloom_core::{Cursor, EditEvent, GenerateRequest, GenerateResponse};
use storyloom_error::{
    FeedError, FeedErrorKind, StorageError, StorageErrorKind, StoryloomResult, SynthesisError,
    SynthesisErrorKind,
};
use storyloom_interface::{ChangeFeed, GenerationDriver, KeyValueStore, StateKey, WriteBatch};
use storyloom_narrative::{PhraseGate, PhraseSynthesizer, SanitizerConfig, StoryStore, SynthesisConfig};
use storyloom_storage::InMemoryStore;
use tokio::sync::Semaphore;

#[derive(Default)]
struct StubFeed {
    edits: Mutex<Vec<EditEvent>>,
    down: AtomicBool,
}

impl StubFeed {
    fn with(edits: Vec<EditEvent>) -> Arc<Self> {
        Arc::new(Self {
            edits: Mutex::new(edits),
            down: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl ChangeFeed for StubFeed {
    async fn recent_changes(&self) -> StoryloomResult<Vec<EditEvent>> {
        if self.down.load(Ordering::SeqCst) {
            Err(FeedError::new(FeedErrorKind::Status(503)))?
        }
        Ok(self.edits.lock().unwrap().clone())
    }

    fn feed_name(&self) -> &str {
        "stub"
    }
}

/// Answers from a script, falling back to a fixed reply; optionally waits
/// for a permit before answering. Every prompt it sees is kept.
struct ScriptedDriver {
    script: Mutex<VecDeque<Option<&'static str>>>,
    fallback: &'static str,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedDriver {
    fn replying(fallback: &'static str) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            gate: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn scripted(script: Vec<Option<&'static str>>, fallback: &'static str) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            gate: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn gated(fallback: &'static str, gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            gate: Some(gate),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationDriver for ScriptedDriver {
    async fn generate(&self, req: &GenerateRequest) -> StoryloomResult<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(req.prompt.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let next = self.script.lock().unwrap().pop_front();
        match next.unwrap_or(Some(self.fallback)) {
            Some(text) => Ok(GenerateResponse::new(text)),
            None => Err(SynthesisError::new(SynthesisErrorKind::Status {
                status: 500,
                body: "overloaded".into(),
            })
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

/// In-memory store whose writes can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStore,
    failing: AtomicBool,
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: StateKey) -> StoryloomResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn apply(&self, batch: WriteBatch) -> StoryloomResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::new(StorageErrorKind::Unavailable("disk full".into())))?
        }
        self.inner.apply(batch).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

type Pipeline = StoryPipeline<Arc<StubFeed>, Arc<ScriptedDriver>, Arc<FlakyStore>>;

async fn pipeline(feed: Arc<StubFeed>, driver: Arc<ScriptedDriver>, store: Arc<FlakyStore>) -> Pipeline {
    let synthesizer = Arc::new(PhraseSynthesizer::new(
        driver,
        &SanitizerConfig::default(),
        SynthesisConfig::default(),
    ));
    let story = StoryStore::open(store, PhraseGate::default()).await.unwrap();
    StoryPipeline::new(
        feed,
        synthesizer,
        story,
        RevealScheduler::new(RevealConfig::default(), 64),
    )
}

fn temple_edit() -> EditEvent {
    EditEvent::new(
        "42",
        "2024-01-01T00:00:00Z".parse().unwrap(),
        "Test",
        "Added [[Category:Test]] information about ancient temples 123",
        "Bob",
    )
}

fn edit(id: &str, timestamp: &str, comment: &str) -> EditEvent {
    EditEvent::new(id, timestamp.parse().unwrap(), "Page", comment, "Ann")
}

fn completed(outcome: CycleOutcome) -> CycleReport {
    match outcome {
        CycleOutcome::Completed(report) => report,
        CycleOutcome::Busy => panic!("cycle unexpectedly busy"),
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition never held");
}

#[tokio::test]
async fn test_edit_becomes_story_and_cursor_advances() {
    let store = Arc::new(FlakyStore::default());
    let driver = ScriptedDriver::replying("because temples held many secrets");
    let pipeline = pipeline(StubFeed::with(vec![temple_edit()]), driver.clone(), store.clone()).await;

    let report = completed(pipeline.run_cycle().await.unwrap());

    assert_eq!(report.fetched, 1);
    assert_eq!(report.accepted.len(), 1);
    let phrase = &report.accepted[0];
    assert_eq!(phrase.text, "because temples held many secrets");
    assert_eq!(phrase.source.author, "Bob");
    assert_eq!(
        phrase.source.comment,
        "Added [[Category:Test]] information about ancient temples 123"
    );

    let expected = Cursor::new("2024-01-01T00:00:00Z".parse().unwrap(), "42");
    assert_eq!(report.cursor.as_ref(), Some(&expected));
    assert!(report.reveal_batch.is_some());

    let snapshot = pipeline.snapshot().await;
    assert_eq!(snapshot.word_count, 5);
    assert_eq!(snapshot.cursor, Some(expected));
    assert_eq!(snapshot.lines(), vec!["Because temples held many secrets,"]);

    let persisted = store.inner.snapshot().await;
    assert!(persisted.contains_key(&StateKey::Story));
    assert!(persisted.contains_key(&StateKey::Cursor));
    assert_eq!(driver.calls(), 1);
}

#[tokio::test]
async fn test_seen_edits_are_not_synthesized_again() {
    let driver = ScriptedDriver::replying("because temples held many secrets");
    let pipeline = pipeline(
        StubFeed::with(vec![temple_edit()]),
        driver.clone(),
        Arc::new(FlakyStore::default()),
    )
    .await;

    completed(pipeline.run_cycle().await.unwrap());
    let second = completed(pipeline.run_cycle().await.unwrap());

    assert_eq!(second.fetched, 0);
    assert!(second.accepted.is_empty());
    assert_eq!(driver.calls(), 1);
}

#[tokio::test]
async fn test_feed_outage_leaves_state_untouched() {
    let feed = StubFeed::with(vec![temple_edit()]);
    feed.down.store(true, Ordering::SeqCst);
    let driver = ScriptedDriver::replying("because temples held many secrets");
    let pipeline = pipeline(feed.clone(), driver.clone(), Arc::new(FlakyStore::default())).await;

    let err = pipeline.run_cycle().await.unwrap_err();
    assert!(err.is_feed_unavailable());
    assert!(pipeline.run_cycle_logged().await.is_none());
    assert!(!pipeline.is_busy());
    assert_eq!(pipeline.snapshot().await.cursor, None);
    assert_eq!(driver.calls(), 0);

    feed.down.store(false, Ordering::SeqCst);
    let report = pipeline.run_cycle_logged().await.unwrap();
    assert_eq!(report.accepted.len(), 1);
}

#[tokio::test]
async fn test_failed_synthesis_drops_only_that_edit() {
    let feed = StubFeed::with(vec![
        edit("2", "2024-01-01T00:01:00Z", "Museum restored ancient swords"),
        edit("1", "2024-01-01T00:00:00Z", "Harbour lanterns repainted"),
    ]);
    // Oldest edit is synthesized first and fails
    let driver = ScriptedDriver::scripted(vec![None], "ancient swords hung quietly");
    let pipeline = pipeline(feed, driver.clone(), Arc::new(FlakyStore::default())).await;

    let report = completed(pipeline.run_cycle().await.unwrap());

    assert_eq!(report.fetched, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.accepted[0].source.comment, "Museum restored ancient swords");
    assert_eq!(report.cursor.map(|c| c.last_id), Some("2".to_string()));
    assert_eq!(driver.calls(), 2);
}

#[tokio::test]
async fn test_later_edits_see_earlier_phrases_of_the_batch() {
    let feed = StubFeed::with(vec![
        edit("43", "2024-01-01T00:01:00Z", "Museum restored ancient swords"),
        temple_edit(),
    ]);
    let driver = ScriptedDriver::scripted(
        vec![Some("because temples held many secrets")],
        "then rivers carried quiet songs",
    );
    let pipeline = pipeline(feed, driver.clone(), Arc::new(FlakyStore::default())).await;

    let report = completed(pipeline.run_cycle().await.unwrap());

    let prompts = driver.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("the story has not started yet"));
    assert!(!prompts[0].contains("because temples held many secrets"));
    assert!(
        prompts[1].contains("Story so far: \"because temples held many secrets\""),
        "second prompt missed the first phrase:\n{}",
        prompts[1]
    );

    let texts: Vec<_> = report.accepted.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["because temples held many secrets", "then rivers carried quiet songs"]
    );
    assert_eq!(
        report.cursor,
        Some(Cursor::new("2024-01-01T00:01:00Z".parse().unwrap(), "43"))
    );
}

#[tokio::test]
async fn test_rejected_candidates_still_advance_cursor() {
    let driver = ScriptedDriver::replying("edit the page now");
    let pipeline = pipeline(
        StubFeed::with(vec![temple_edit()]),
        driver,
        Arc::new(FlakyStore::default()),
    )
    .await;

    let report = completed(pipeline.run_cycle().await.unwrap());

    assert_eq!(report.rejected, 1);
    assert!(report.accepted.is_empty());
    assert_eq!(report.reveal_batch, None);
    assert_eq!(report.cursor.map(|c| c.last_id), Some("42".to_string()));
    assert!(pipeline.snapshot().await.phrases.is_empty());
}

#[tokio::test]
async fn test_persistence_failure_keeps_cursor_and_retries() {
    let store = Arc::new(FlakyStore::default());
    store.failing.store(true, Ordering::SeqCst);
    let driver = ScriptedDriver::replying("because temples held many secrets");
    let pipeline = pipeline(StubFeed::with(vec![temple_edit()]), driver.clone(), store.clone()).await;

    let err = pipeline.run_cycle().await.unwrap_err();
    assert!(err.is_persistence_failed());
    let snapshot = pipeline.snapshot().await;
    assert_eq!(snapshot.cursor, None);
    assert!(snapshot.phrases.is_empty());
    assert_eq!(pipeline.reveals().pending_batches(), 0);

    store.failing.store(false, Ordering::SeqCst);
    let report = completed(pipeline.run_cycle().await.unwrap());
    assert_eq!(report.fetched, 1);
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(driver.calls(), 2);
}

#[tokio::test]
async fn test_overlapping_trigger_is_a_no_op() {
    let gate = Arc::new(Semaphore::new(0));
    let driver = ScriptedDriver::gated("because temples held many secrets", gate.clone());
    let pipeline = Arc::new(
        pipeline(
            StubFeed::with(vec![temple_edit()]),
            driver.clone(),
            Arc::new(FlakyStore::default()),
        )
        .await,
    );

    let running = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run_cycle().await }
    });
    wait_for(|| driver.calls() == 1).await;

    assert!(pipeline.is_busy());
    assert_eq!(pipeline.run_cycle().await.unwrap(), CycleOutcome::Busy);

    gate.add_permits(1);
    let report = completed(running.await.unwrap().unwrap());
    assert_eq!(report.accepted.len(), 1);
    assert!(!pipeline.is_busy());
    assert_eq!(driver.calls(), 1);
}

#[tokio::test]
async fn test_reset_clears_story_and_replays_feed() {
    let store = Arc::new(FlakyStore::default());
    let driver = ScriptedDriver::replying("because temples held many secrets");
    let pipeline = pipeline(StubFeed::with(vec![temple_edit()]), driver, store.clone()).await;

    completed(pipeline.run_cycle().await.unwrap());
    assert_eq!(pipeline.reveals().pending_batches(), 1);

    pipeline.reset().await.unwrap();

    let snapshot = pipeline.snapshot().await;
    assert!(snapshot.phrases.is_empty());
    assert_eq!(snapshot.cursor, None);
    assert_eq!(snapshot.word_count, 0);
    assert_eq!(pipeline.reveals().pending_batches(), 0);
    assert!(store.inner.is_empty().await);

    let report = completed(pipeline.run_cycle().await.unwrap());
    assert_eq!(report.fetched, 1);
    assert_eq!(report.accepted.len(), 1);
}

#[tokio::test]
async fn test_reset_during_cycle_discards_batch() {
    let gate = Arc::new(Semaphore::new(0));
    let driver = ScriptedDriver::gated("because temples held many secrets", gate.clone());
    let pipeline = Arc::new(
        pipeline(
            StubFeed::with(vec![temple_edit()]),
            driver.clone(),
            Arc::new(FlakyStore::default()),
        )
        .await,
    );

    let running = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run_cycle().await }
    });
    wait_for(|| driver.calls() == 1).await;

    pipeline.reset().await.unwrap();
    gate.add_permits(1);

    let report = completed(running.await.unwrap().unwrap());
    assert!(report.discarded);
    assert!(report.accepted.is_empty());

    let snapshot = pipeline.snapshot().await;
    assert!(snapshot.phrases.is_empty());
    assert_eq!(snapshot.cursor, None);
    assert_eq!(pipeline.reveals().pending_batches(), 0);
}
