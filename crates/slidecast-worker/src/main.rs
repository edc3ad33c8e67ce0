//! Slide video pipeline binary.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use slidecast_media::FfmpegEncoder;
use slidecast_queue::ContentQueue;
use slidecast_worker::{
    GeminiClient, ImagenClient, ItemOutcome, Orchestrator, PipelineConfig, TtsClient,
    WorkerResult,
};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting slidecast");

    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }

    info!("slidecast finished");
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["slidecast=info", "slidecast_worker=info", "slidecast_media=info"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

async fn run() -> WorkerResult<()> {
    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let mut queue = ContentQueue::load(&config.store_path).await?;
    if !queue.has_pending() {
        info!(items = queue.len(), "Nothing to render");
        return Ok(());
    }

    let text = Arc::new(GeminiClient::from_env()?);
    let images = Arc::new(ImagenClient::from_env()?);
    let speech = Arc::new(TtsClient::from_env()?);
    let encoder = Arc::new(
        FfmpegEncoder::new(config.encoding.clone()).with_timeout(config.ffmpeg_timeout.as_secs()),
    );

    let orchestrator = Orchestrator::new(config, text, images, speech, encoder);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, finishing current item");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = orchestrator.run_until(&mut queue, shutdown_rx).await?;

    for outcome in &summary.outcomes {
        match outcome {
            ItemOutcome::Succeeded { index, video_name } => {
                info!(item_index = index, video_name = %video_name, "Item rendered");
            }
            ItemOutcome::Failed {
                index,
                state,
                error,
            } => {
                warn!(item_index = index, state = %state, error = %error, "Item failed");
            }
            ItemOutcome::Skipped { .. } => {}
        }
    }

    info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        skipped = summary.skipped(),
        interrupted = summary.interrupted,
        "Run summary"
    );
    Ok(())
}
