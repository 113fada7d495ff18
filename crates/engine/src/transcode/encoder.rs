use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::hls::AcquisitionError;
use crate::progress::{PipelineEvent, ProgressReporter};

use super::error::TranscodeError;
use super::job::TranscodeJob;
use super::locate::locate_encoder;

/// External encoder settings.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Program name searched on `PATH`, or a path to the executable
    pub program: PathBuf,
    /// Arguments inserted before the output options
    pub extra_args: Vec<String>,
    /// Maximum number of stderr bytes kept for error reports
    pub stderr_limit: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            extra_args: Vec::new(),
            stderr_limit: 64 * 1024,
        }
    }
}

/// Removes the temporary output on drop unless the run committed it.
struct PartFileGuard {
    path: PathBuf,
    armed: bool,
}

impl PartFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed partial output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove partial output")
            }
        }
    }
}

enum FeedOutcome {
    /// Source drained and stdin closed
    Drained,
    /// Encoder closed its input before the source ended
    InputClosed,
}

const INPUT_CLOSED: &str = "encoder stopped reading input";

/// Pipes an ordered byte stream into one encoder process per job.
///
/// The child is killed when the run fails, is cancelled, or the future is
/// dropped; the `.part` output is removed on every path except success.
pub struct TranscodeBridge {
    config: EncoderConfig,
}

impl TranscodeBridge {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Resolves the configured encoder executable.
    pub fn locate(&self) -> Result<PathBuf, TranscodeError> {
        locate_encoder(&self.config.program)
    }

    /// Runs `job` with the encoder at `encoder`, feeding it every chunk of
    /// `source` in order. Returns the final output path.
    pub async fn run<S>(
        &self,
        encoder: &Path,
        job: &TranscodeJob,
        mut source: S,
        token: &CancellationToken,
        progress: &ProgressReporter,
        total_duration: Option<Duration>,
    ) -> Result<PathBuf, TranscodeError>
    where
        S: Stream<Item = Result<Bytes, AcquisitionError>> + Unpin,
    {
        let part_path = job.part_path();
        let mut part_guard = PartFileGuard::new(part_path.clone());

        let mut child = self.spawn(encoder, job, &part_path)?;
        info!(
            encoder = %encoder.display(),
            codec = %job.codec,
            quality = %job.quality,
            output = %job.output_path.display(),
            "Encoder started"
        );

        let stdin = child.stdin.take().ok_or_else(|| {
            TranscodeError::Io(std::io::Error::other("encoder stdin was not captured"))
        })?;
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(capture_stderr(stderr, self.config.stderr_limit)));
        let progress_task = child.stdout.take().map(|stdout| {
            tokio::spawn(report_progress(stdout, progress.clone(), total_duration))
        });

        let fed = tokio::select! {
            biased;
            _ = token.cancelled() => {
                terminate(&mut child).await;
                return Err(TranscodeError::Cancelled);
            }
            fed = feed(stdin, &mut source) => fed,
        };

        let input_closed = match fed {
            Ok(FeedOutcome::Drained) => {
                debug!("Encoder input drained");
                false
            }
            Ok(FeedOutcome::InputClosed) => {
                warn!("Encoder closed its input before the source ended");
                drop(source);
                true
            }
            Err(TranscodeError::UpstreamStarved(e)) => {
                warn!(error = %e, "Byte source failed, terminating encoder");
                terminate(&mut child).await;
                return Err(TranscodeError::UpstreamStarved(e));
            }
            Err(e) => {
                terminate(&mut child).await;
                return Err(e);
            }
        };

        let status = tokio::select! {
            biased;
            _ = token.cancelled() => {
                terminate(&mut child).await;
                return Err(TranscodeError::Cancelled);
            }
            status = child.wait() => status?,
        };

        if let Some(task) = progress_task {
            let _ = task.await;
        }
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if input_closed {
            return Err(input_closed_error(status, &stderr));
        }
        check_status(status, stderr)?;

        tokio::fs::rename(&part_path, &job.output_path).await?;
        part_guard.disarm();
        info!(output = %job.output_path.display(), "Encoder finished");
        Ok(job.output_path.clone())
    }

    fn spawn(
        &self,
        encoder: &Path,
        job: &TranscodeJob,
        part_path: &Path,
    ) -> Result<Child, TranscodeError> {
        let args = job.encoder_args(part_path, &self.config.extra_args);
        debug!(encoder = %encoder.display(), ?args, "Spawning encoder");

        Command::new(encoder)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => TranscodeError::EncoderNotFound {
                    program: encoder.to_path_buf(),
                },
                _ => TranscodeError::Io(e),
            })
    }
}

async fn feed<S>(mut stdin: ChildStdin, source: &mut S) -> Result<FeedOutcome, TranscodeError>
where
    S: Stream<Item = Result<Bytes, AcquisitionError>> + Unpin,
{
    while let Some(chunk) = source.next().await {
        let chunk = chunk.map_err(TranscodeError::UpstreamStarved)?;
        if let Err(e) = stdin.write_all(&chunk).await {
            return match e.kind() {
                ErrorKind::BrokenPipe => Ok(FeedOutcome::InputClosed),
                _ => Err(TranscodeError::Io(e)),
            };
        }
    }

    match stdin.shutdown().await {
        Ok(()) => Ok(FeedOutcome::Drained),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(FeedOutcome::InputClosed),
        Err(e) => Err(TranscodeError::Io(e)),
    }
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to terminate encoder");
    }
}

fn check_status(status: ExitStatus, stderr: String) -> Result<(), TranscodeError> {
    if status.success() {
        return Ok(());
    }
    Err(TranscodeError::EncoderProcess {
        exit_code: status.code(),
        stderr: stderr.trim().to_string(),
    })
}

/// The output of an encoder that did not consume the whole source is truncated,
/// whatever its exit status says.
fn input_closed_error(status: ExitStatus, stderr: &str) -> TranscodeError {
    let stderr = stderr.trim();
    TranscodeError::EncoderProcess {
        exit_code: status.code(),
        stderr: if stderr.is_empty() {
            INPUT_CLOSED.to_string()
        } else {
            format!("{INPUT_CLOSED}: {stderr}")
        },
    }
}

/// Keeps the first `limit` bytes and drains the rest so the child never blocks on a full pipe.
async fn capture_stderr<R>(mut stderr: R, limit: usize) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Err(e) = (&mut stderr).take(limit as u64).read_to_end(&mut buf).await {
        debug!(error = %e, "Encoder stderr read failed");
    }
    let _ = tokio::io::copy(&mut stderr, &mut tokio::io::sink()).await;
    String::from_utf8_lossy(&buf).into_owned()
}

async fn report_progress<R>(stdout: R, progress: ProgressReporter, total: Option<Duration>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(out_time) = parse_out_time(&line) {
            progress.report(PipelineEvent::EncoderProgress { out_time, total });
        }
    }
}

/// `out_time_ms` carries microseconds despite its name.
fn parse_out_time(line: &str) -> Option<Duration> {
    let value = line
        .strip_prefix("out_time_us=")
        .or_else(|| line.strip_prefix("out_time_ms="))?;
    value.trim().parse::<u64>().ok().map(Duration::from_micros)
}
