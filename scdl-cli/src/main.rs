use std::time::Duration;

use clap::Parser;
use config::CredentialsConfig;
use error::AppError;
use scdl_engine::{
    DownloadPipeline, DownloadRequest, DownloaderConfig, EncoderConfig, HlsConfig, PipelineConfig,
    ProgressReporter,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;

mod cli;
mod config;
mod error;
mod utils;

use cli::CliArgs;
use utils::progress::ProgressManager;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("scdl.log")?;

    let multi_writer = MakeWriterExt::and(std::io::stdout, log_file);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(multi_writer)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let auth = CredentialsConfig::load_or_create(&args.config)?.into_auth(
        args.client_id.clone(),
        args.oauth.clone(),
        &args.config,
    )?;

    if args.concurrency == 0 {
        return Err(AppError::InvalidInput(
            "--concurrency must be at least 1".to_string(),
        ));
    }

    info!(
        "HTTP timeout configuration: overall={}s, connect={}s",
        args.timeout, args.connect_timeout
    );
    let downloader = DownloaderConfig::builder()
        .with_timeout(Duration::from_secs(args.timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .with_headers(utils::parse_headers(&args.headers))
        .build();

    let mut hls = HlsConfig::default();
    hls.scheduler_config.download_concurrency = args.concurrency;
    hls.scheduler_config.prefetch_window =
        hls.scheduler_config.prefetch_window.max(args.concurrency);

    let pipeline = DownloadPipeline::new(PipelineConfig {
        downloader,
        hls,
        encoder: EncoderConfig {
            program: args.encoder.clone(),
            ..Default::default()
        },
        codec: args.codec,
        quality: args.quality,
        embed_artwork: !args.no_artwork,
        api_base: None,
    });

    let mut request = DownloadRequest::new(args.url.clone(), auth, args.output_dir.clone());
    if let Some(name) = &args.output {
        request = request.with_file_name(name.clone());
    }

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling download");
            ctrl_c_token.cancel();
        }
    });

    let (tx, rx) = mpsc::channel(64);
    let progress_task = ProgressManager::new(args.no_progress).spawn(rx);

    info!(url = %args.url, codec = %args.codec, "Starting download");
    let result = pipeline
        .run(request, token, ProgressReporter::new(tx))
        .await;
    if let Err(e) = progress_task.await {
        warn!(error = %e, "Progress task failed");
    }

    let path = result?;
    info!(path = %path.display(), "Saved");
    Ok(())
}
