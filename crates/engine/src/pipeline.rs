// Download pipeline: resolve, select, fetch manifest, acquire segments and transcode.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use scdl_platforms::extractor::factory::ExtractorFactory;
use scdl_platforms::{AuthContext, Track, select_stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::DownloaderConfig;
use crate::downloader::create_client;
use crate::error::PipelineError;
use crate::hls::{HlsConfig, ManifestFetcher, SegmentAcquirer};
use crate::progress::{PipelineEvent, ProgressReporter, Stage};
use crate::transcode::{
    AudioCodec, EncoderConfig, Quality, TrackTags, TranscodeBridge, TranscodeJob,
};
use crate::utils::sanitize_file_name;

/// Everything a pipeline run needs besides the request itself.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub downloader: DownloaderConfig,
    pub hls: HlsConfig,
    pub encoder: EncoderConfig,
    pub codec: AudioCodec,
    /// Overrides the codec's default quality
    pub quality: Option<Quality>,
    /// Attach cover art when the container supports it
    pub embed_artwork: bool,
    /// Metadata API host, mainly for tests
    pub api_base: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            downloader: DownloaderConfig::default(),
            hls: HlsConfig::default(),
            encoder: EncoderConfig::default(),
            codec: AudioCodec::Mp3,
            quality: None,
            embed_artwork: true,
            api_base: None,
        }
    }
}

/// One track to download.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub auth: AuthContext,
    pub output_dir: PathBuf,
    /// File name without extension; derived from the track when absent
    pub file_name: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, auth: AuthContext, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            auth,
            output_dir: output_dir.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

pub struct DownloadPipeline {
    config: PipelineConfig,
    bridge: TranscodeBridge,
}

impl DownloadPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let bridge = TranscodeBridge::new(config.encoder.clone());
        Self { config, bridge }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs one download to completion and returns the written file.
    ///
    /// The encoder is located before any network request. Cancelling `token`
    /// stops every stage; no partial output remains afterwards.
    pub async fn run(
        &self,
        request: DownloadRequest,
        token: CancellationToken,
        progress: ProgressReporter,
    ) -> Result<PathBuf, PipelineError> {
        if token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        progress.report(PipelineEvent::Stage(Stage::LocatingEncoder));
        let encoder = self.bridge.locate()?;
        let quality = self
            .config
            .quality
            .map(|q| self.config.codec.validate_quality(q))
            .transpose()?;

        let client = create_client(&self.config.downloader)?;

        progress.report(PipelineEvent::Stage(Stage::Resolving));
        let mut factory = ExtractorFactory::new(client.clone());
        if let Some(api_base) = &self.config.api_base {
            factory = factory.with_api_base(api_base.as_str());
        }
        let extractor = factory.create_extractor(&request.url, request.auth.clone())?;
        let track = until_cancelled(&token, extractor.extract()).await??;
        info!(id = track.id, title = %track.title, artist = %track.artist, "Track resolved");

        progress.report(PipelineEvent::Stage(Stage::SelectingStream));
        let variant = select_stream(&track, &request.auth, source_family(self.config.codec))?;
        info!(variant = %variant, "Stream selected");

        progress.report(PipelineEvent::Stage(Stage::FetchingManifest));
        let hls_config = Arc::new(self.config.hls.clone());
        let fetcher = ManifestFetcher::new(
            client.clone(),
            Arc::clone(&hls_config),
            request.auth.clone(),
        );
        let manifest = until_cancelled(&token, fetcher.fetch(&variant.manifest_url)).await??;
        info!(
            segments = manifest.len(),
            duration = ?manifest.total_duration(),
            "Manifest fetched"
        );

        tokio::fs::create_dir_all(&request.output_dir).await?;
        let job = self.build_job(&request, &track, quality)?;
        debug!(output = %job.output_path.display(), "Output path chosen");

        progress.report(PipelineEvent::Stage(Stage::Downloading));
        let acquirer = SegmentAcquirer::new(client, hls_config);
        let segments = acquirer.acquire(&manifest, &token);
        let total = segments.total();
        let segment_progress = progress.clone();
        let bytes = segments.map(move |item| {
            item.map(|segment| {
                segment_progress.report(PipelineEvent::SegmentAcquired {
                    index: segment.index,
                    total,
                });
                segment.data
            })
        });

        let path = self
            .bridge
            .run(&encoder, &job, bytes, &token, &progress, Some(track.duration))
            .await?;

        progress.report(PipelineEvent::Stage(Stage::Finalizing));
        progress.report(PipelineEvent::Finished { path: path.clone() });
        info!(path = %path.display(), "Download finished");
        Ok(path)
    }

    fn build_job(
        &self,
        request: &DownloadRequest,
        track: &Track,
        quality: Option<Quality>,
    ) -> Result<TranscodeJob, PipelineError> {
        let codec = self.config.codec;
        let stem = match &request.file_name {
            Some(name) => sanitize_file_name(name),
            None => sanitize_file_name(&default_stem(track)),
        };
        let output_path = output_path(&request.output_dir, &stem, codec);

        let mut job = TranscodeJob::new(codec, output_path).with_tags(TrackTags {
            title: Some(track.title.clone()),
            artist: Some(track.artist.clone()).filter(|a| !a.is_empty()),
        });
        if let Some(quality) = quality {
            job = job.with_quality(quality)?;
        }
        if self.config.embed_artwork {
            job = job.with_artwork(track.artwork_url.clone());
        }
        Ok(job)
    }
}

async fn until_cancelled<F: Future>(
    token: &CancellationToken,
    fut: F,
) -> Result<F::Output, PipelineError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(PipelineError::Cancelled),
        output = fut => Ok(output),
    }
}

/// Source preset family that avoids a lossy-to-lossy generation change for `codec`.
fn source_family(codec: AudioCodec) -> Option<&'static str> {
    match codec {
        AudioCodec::Mp3 => Some("mp3"),
        AudioCodec::Opus | AudioCodec::Vorbis => Some("opus"),
        AudioCodec::Aac => Some("aac"),
        AudioCodec::Flac | AudioCodec::Wav => None,
    }
}

fn default_stem(track: &Track) -> String {
    if track.artist.is_empty() {
        track.title.clone()
    } else {
        format!("{} - {}", track.artist, track.title)
    }
}

fn output_path(dir: &Path, stem: &str, codec: AudioCodec) -> PathBuf {
    dir.join(format!("{stem}.{}", codec.extension()))
}
