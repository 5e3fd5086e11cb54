use crate::{PipelineMessage, StoryBot, StoryPipeline};
use std::sync::Arc;
use std::time::Duration;
use storyloom_interface::{ChangeFeed, GenerationDriver, KeyValueStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument, warn};

/// Runs a pipeline on a fixed interval.
pub struct StoryServer<F, D, S> {
    pipeline: Arc<StoryPipeline<F, D, S>>,
    poll_interval: Duration,
}

impl<F, D, S> StoryServer<F, D, S>
where
    F: ChangeFeed + 'static,
    D: GenerationDriver + 'static,
    S: KeyValueStore + 'static,
{
    /// Creates a new story server.
    pub fn new(pipeline: Arc<StoryPipeline<F, D, S>>, poll_interval: Duration) -> Self {
        Self {
            pipeline,
            poll_interval,
        }
    }

    /// Spawns the bot and its scheduler. The first cycle runs immediately.
    #[instrument(skip(self), fields(poll_interval_secs = self.poll_interval.as_secs()))]
    pub fn start(self) -> StoryServerHandle {
        info!("Starting story server");

        let (tx, rx) = mpsc::channel(32);
        let bot = StoryBot::new(Arc::clone(&self.pipeline), rx);
        let bot = tokio::spawn(async move {
            bot.run().await;
        });
        let scheduler = Self::spawn_scheduler(self.poll_interval, tx.clone());

        StoryServerHandle { tx, bot, scheduler }
    }

    fn spawn_scheduler(
        poll_interval: Duration,
        tx: mpsc::Sender<PipelineMessage>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(PipelineMessage::RunCycle).await.is_err() {
                    error!("Story bot channel closed");
                    break;
                }
            }
        })
    }
}

/// Control over a running [`StoryServer`].
#[derive(Debug)]
pub struct StoryServerHandle {
    tx: mpsc::Sender<PipelineMessage>,
    bot: JoinHandle<()>,
    scheduler: JoinHandle<()>,
}

impl StoryServerHandle {
    /// Channel into the bot, for other control surfaces.
    pub fn sender(&self) -> mpsc::Sender<PipelineMessage> {
        self.tx.clone()
    }

    /// Ask for a cycle now.
    pub async fn run_cycle(&self) -> bool {
        self.tx.send(PipelineMessage::RunCycle).await.is_ok()
    }

    /// Reset the story, then run a cycle.
    pub async fn reset(&self) -> bool {
        self.tx.send(PipelineMessage::Reset).await.is_ok()
            && self.tx.send(PipelineMessage::RunCycle).await.is_ok()
    }

    /// Stop the scheduler and the bot and wait for the bot to finish.
    #[instrument(skip(self))]
    pub async fn shutdown(self) {
        self.scheduler.abort();
        if self.tx.send(PipelineMessage::Shutdown).await.is_err() {
            warn!("Story bot already stopped");
        }
        if let Err(e) = self.bot.await {
            error!(error = %e, "Story bot task failed");
        }
        info!("Story server stopped");
    }
}
