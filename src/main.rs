//! voice-relay server entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voice_relay::backend::{CloudTtsClient, EspeakEngine, LocalEngine, RemoteSpeechClient};
use voice_relay::cli::{Args, ServerConfig};
use voice_relay::engine::Dispatcher;
use voice_relay::server;
use voice_relay::storage::AudioStore;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = args.server_config();
    let dispatcher = build_dispatcher(&config)?;

    info!(storage_dir = %config.storage_dir.display(), "starting voice-relay");
    info!(url = %config.remote_url, "remote speech voices enabled");
    info!(url = %config.cloud_url, lang = %config.cloud_lang, "cloud accents enabled");
    if dispatcher.has_local_engine() {
        info!("local engine voices enabled");
    }
    warn!(
        storage_dir = %config.storage_dir.display(),
        "generated audio is never deleted by the server; \
         rely on OS temp cleanup or prune the directory"
    );

    let router = server::router(Arc::new(dispatcher));
    server::serve(config.addr, router)
        .await
        .with_context(|| format!("Failed to serve on {}", config.addr))?;

    Ok(())
}

fn build_dispatcher(config: &ServerConfig) -> Result<Dispatcher> {
    let store = AudioStore::open(config.storage_dir.clone()).with_context(|| {
        format!(
            "Failed to prepare storage directory: {}",
            config.storage_dir.display()
        )
    })?;

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let remote = RemoteSpeechClient::with_client(config.remote_url.clone(), http.clone());
    let cloud =
        CloudTtsClient::with_client(config.cloud_url.clone(), config.cloud_lang.clone(), http);

    let local = config.espeak_bin.as_deref().and_then(|bin| {
        let engine = EspeakEngine::detect(bin, &config.ffmpeg_bin, config.engine_timeout)?;
        info!(bin = %engine.binary().display(), "local engine found");
        Some(Arc::new(engine) as Arc<dyn LocalEngine>)
    });

    Ok(
        Dispatcher::new(store, Arc::new(remote), Arc::new(cloud), local)
            .with_max_text_chars(config.max_text_chars),
    )
}
