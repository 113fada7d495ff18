use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

/// Pipeline stage being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LocatingEncoder,
    Resolving,
    SelectingStream,
    FetchingManifest,
    Downloading,
    Finalizing,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::LocatingEncoder => "locating encoder",
            Stage::Resolving => "resolving track",
            Stage::SelectingStream => "selecting stream",
            Stage::FetchingManifest => "fetching manifest",
            Stage::Downloading => "downloading and transcoding",
            Stage::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Stage(Stage),
    /// A segment was handed to the encoder, `index` of `total`
    SegmentAcquired { index: u64, total: u64 },
    EncoderProgress {
        out_time: Duration,
        total: Option<Duration>,
    },
    Finished { path: PathBuf },
}

/// Non-blocking event sink. Events are dropped when the receiver lags or is gone.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn report(&self, event: PipelineEvent) {
        if let Some(tx) = &self.tx
            && let Err(e) = tx.try_send(event)
        {
            trace!(error = %e, "Progress event dropped");
        }
    }
}
