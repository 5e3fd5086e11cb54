//! Command-line interface module.

mod commands;
mod serve;
mod story;

pub use commands::{Cli, Commands};
pub use serve::serve;
pub use story::{print_story, reset_story, run_once};

use std::sync::Arc;
use storyloom_bot::{RevealScheduler, StoryPipeline, StoryloomConfig};
use storyloom_feed::RecentChangesClient;
use storyloom_narrative::{PhraseGate, PhraseSynthesizer, Sanitizer, StoryStore};
use storyloom_server::GenerationClient;
use storyloom_storage::FileSystemStore;
use tracing::{info, warn};

/// Pipeline over the live feed, the configured generator and on-disk state.
pub type LivePipeline = StoryPipeline<RecentChangesClient, GenerationClient, FileSystemStore>;

/// Reveal events buffered per slow subscriber
const REVEAL_CAPACITY: usize = 256;

/// Open the story kept under the configured storage directory.
pub async fn open_story(config: &StoryloomConfig) -> anyhow::Result<StoryStore<FileSystemStore>> {
    let path = config.storage.resolved_path();
    info!(path = %path.display(), "Opening story state");
    let store = FileSystemStore::new(path)?;
    let gate = PhraseGate::new(Sanitizer::new(config.sanitizer.clone()));
    Ok(StoryStore::open(store, gate).await?)
}

/// Wire feed, generator, story and reveals into one pipeline.
pub async fn build_pipeline(config: &StoryloomConfig) -> anyhow::Result<Arc<LivePipeline>> {
    let feed = RecentChangesClient::new(config.feed.clone())?;

    let generation = config.generation.client_config();
    if generation.api_key.is_none() {
        warn!("No generation API key found in STORYLOOM_API_KEY or OPENAI_API_KEY");
    }
    let synthesizer = Arc::new(PhraseSynthesizer::new(
        GenerationClient::new(generation)?,
        &config.sanitizer,
        config.synthesis(),
    ));

    let story = open_story(config).await?;
    let reveals = RevealScheduler::new(config.reveal.clone(), REVEAL_CAPACITY);

    Ok(Arc::new(StoryPipeline::new(feed, synthesizer, story, reveals)))
}
