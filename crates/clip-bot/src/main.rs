//! Clip bot binary.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{info, warn};

use clip_bot::logging::init_tracing;
use clip_bot::{
    BotConfig, BotContext, Dispatcher, RecentResultCache, RenderWorker, TelegramClient,
    ThumbnailFetcher,
};
use clip_media::{check_ffmpeg, check_ytdlp, ClipOrchestrator, FfmpegTranscoder, YtDlpResolver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();

    let config = BotConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.json_logs)?;

    info!("Starting clip-bot");
    info!(
        api_url = %config.api_url,
        max_concurrent_renders = config.max_concurrent_renders,
        work_dir = %config.work_dir.display(),
        "Bot config loaded"
    );

    if let Err(e) = check_ffmpeg() {
        warn!("{}; renders will fail until it is installed", e);
    }
    if let Err(e) = check_ytdlp() {
        warn!("{}; renders will fail until it is installed", e);
    }

    let formats = config.format_table().context("Failed to load format table")?;
    let orchestrator = ClipOrchestrator::new(
        Arc::new(YtDlpResolver::new(config.render_timeout)),
        Arc::new(FfmpegTranscoder::new(config.render_timeout.as_secs())),
        formats,
        config.work_dir.clone(),
    );

    let client = Arc::new(TelegramClient::new(&config.api_url, &config.bot_token)?);
    let ctx = Arc::new(BotContext {
        transport: client.clone(),
        worker: RenderWorker::new(orchestrator, config.max_concurrent_renders),
        results: RecentResultCache::new(config.result_cache_capacity, config.result_cache_ttl),
        thumbnails: ThumbnailFetcher::new(
            config.thumbnail_url_template.clone(),
            config.thumbnail_timeout,
        )?,
        channel_id: config.channel_id,
        default_duration_secs: config.default_duration_secs,
    });

    let dispatcher = Arc::new(Dispatcher::new(client, ctx, config.poll_timeout));

    let signal_dispatcher = Arc::clone(&dispatcher);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_dispatcher.shutdown();
    });

    dispatcher.run().await?;

    info!("Bot shutdown complete");
    Ok(())
}
