//! Long-running mode: timer-driven cycles, console reveals, HTTP API.

use super::build_pipeline;
use std::sync::Arc;
use storyloom_bot::{ApiState, StoryServer, StoryloomConfig, create_router};
use storyloom_server::phrase_router;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, instrument, warn};

/// Run until Ctrl-C.
#[instrument(skip_all)]
pub async fn serve(config: StoryloomConfig, bind: Option<String>) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&config).await?;

    let mut reveals = pipeline.reveals().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match reveals.recv().await {
                Ok(event) => println!("{}", event.line),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Console fell behind, reveals skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let handle = StoryServer::new(Arc::clone(&pipeline), config.pipeline.poll_interval()).start();

    let app = create_router(ApiState::new(pipeline.clone(), handle.sender()))
        .merge(phrase_router(Arc::clone(pipeline.synthesizer())));

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = TcpListener::bind(&bind).await?;
    info!(bind = %bind, "Storyloom listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Shutdown requested");
        })
        .await?;

    handle.shutdown().await;
    printer.abort();
    Ok(())
}
