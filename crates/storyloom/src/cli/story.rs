//! One-shot commands.

use super::{build_pipeline, open_story};
use storyloom_bot::{CycleOutcome, StoryloomConfig};

/// Run one cycle and print each accepted phrase.
pub async fn run_once(config: StoryloomConfig) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&config).await?;

    match pipeline.run_cycle().await? {
        CycleOutcome::Completed(report) => {
            for phrase in &report.accepted {
                println!("{}", phrase.display_line());
            }
            eprintln!(
                "{} new edits, {} accepted, {} rejected, {} failed",
                report.fetched,
                report.accepted.len(),
                report.rejected,
                report.failed
            );
        }
        CycleOutcome::Busy => eprintln!("A cycle is already running"),
    }

    pipeline.reveals().cancel_all();
    Ok(())
}

/// Print the stored story as a poem, or as JSON records.
pub async fn print_story(config: StoryloomConfig, json: bool) -> anyhow::Result<()> {
    let story = open_story(&config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(story.phrases())?);
        return Ok(());
    }

    if story.is_empty() {
        eprintln!("The story has not started yet");
    }
    for phrase in story.phrases() {
        println!("{}", phrase.display_line());
    }
    Ok(())
}

/// Clear all persisted story state.
pub async fn reset_story(config: StoryloomConfig) -> anyhow::Result<()> {
    let mut story = open_story(&config).await?;
    let phrases = story.len();
    story.reset().await?;
    eprintln!("Cleared {} phrases", phrases);
    Ok(())
}
