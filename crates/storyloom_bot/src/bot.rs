use crate::StoryPipeline;
use std::sync::Arc;
use storyloom_interface::{ChangeFeed, GenerationDriver, KeyValueStore};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

/// Message types for the story bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMessage {
    /// Run a poll cycle unless one is in flight
    RunCycle,
    /// Clear the story and pending reveals
    Reset,
    /// Stop the bot, abandoning in-flight cycles
    Shutdown,
}

/// Drives a [`StoryPipeline`] from a message channel.
///
/// Cycles run as tasks so `Reset` and `Shutdown` are handled while a cycle
/// is waiting on the network. Overlapping `RunCycle`s are no-ops.
pub struct StoryBot<F, D, S> {
    pipeline: Arc<StoryPipeline<F, D, S>>,
    rx: mpsc::Receiver<PipelineMessage>,
    cycles: JoinSet<()>,
}

impl<F, D, S> StoryBot<F, D, S>
where
    F: ChangeFeed + 'static,
    D: GenerationDriver + 'static,
    S: KeyValueStore + 'static,
{
    /// Creates a new story bot.
    pub fn new(pipeline: Arc<StoryPipeline<F, D, S>>, rx: mpsc::Receiver<PipelineMessage>) -> Self {
        Self {
            pipeline,
            rx,
            cycles: JoinSet::new(),
        }
    }

    /// Runs the bot loop until `Shutdown` or until every sender is gone.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Story bot started");

        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(PipelineMessage::RunCycle) => {
                        if self.pipeline.is_busy() {
                            debug!("Cycle already in flight, ignoring trigger");
                            continue;
                        }
                        let pipeline = Arc::clone(&self.pipeline);
                        self.cycles.spawn(async move {
                            pipeline.run_cycle_logged().await;
                        });
                    }
                    Some(PipelineMessage::Reset) => {
                        if let Err(e) = self.pipeline.reset().await {
                            error!(error = %e, "Reset failed");
                        }
                    }
                    Some(PipelineMessage::Shutdown) | None => {
                        info!("Story bot shutting down");
                        break;
                    }
                },
                Some(joined) = self.cycles.join_next() => {
                    if let Err(e) = joined
                        && e.is_panic()
                    {
                        error!(error = %e, "Cycle task panicked");
                    }
                }
            }
        }

        // Only fully merged batches were persisted; in-flight work is dropped
        self.cycles.shutdown().await;
        self.pipeline.reveals().cancel_all();
        info!("Story bot stopped");
    }
}
