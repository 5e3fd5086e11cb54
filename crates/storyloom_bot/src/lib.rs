//! Pipeline orchestration for storyloom.
//!
//! - [`StoryPipeline`]: one poll, synthesize, persist, reveal cycle at a time,
//!   guarded by an in-flight flag
//! - [`RevealScheduler`]: paced, cancellable reveal of merged phrases
//! - [`StoryBot`] / [`StoryServer`]: message loop and fixed-interval trigger
//! - [`create_router`]: `/health`, `/story` and `/reset`
//! - [`StoryloomConfig`]: layered configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod bot;
mod config;
mod pipeline;
mod reveal;
mod server;

pub use api::{ApiState, StoryView, create_router};
pub use bot::{PipelineMessage, StoryBot};
pub use config::{
    GenerationSettings, PipelineConfig, ServerConfig, StorageConfig, StoryloomConfig,
};
pub use pipeline::{CycleOutcome, CycleReport, StoryPipeline, StorySnapshot};
pub use reveal::{RevealConfig, RevealEvent, RevealScheduler, reveal_delays};
pub use server::{StoryServer, StoryServerHandle};
