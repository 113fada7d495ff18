use indicatif::{ProgressBar, ProgressStyle};
use scdl_engine::PipelineEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn segment_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {msg}\n[{elapsed_precise}] [{bar:40.green/white}] {pos}/{len} segments")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Renders pipeline events on a single progress bar.
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    pub fn new(disabled: bool) -> Self {
        let bar = if disabled {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            bar.set_style(segment_style());
            bar.enable_steady_tick(Duration::from_millis(250));
            bar
        };
        Self { bar }
    }

    pub fn handle_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::Stage(stage) => self.bar.set_message(stage.to_string()),
            PipelineEvent::SegmentAcquired { index, total } => {
                self.bar.set_length(total);
                self.bar.set_position(index + 1);
            }
            PipelineEvent::EncoderProgress { out_time, total } => {
                let message = match total {
                    Some(total) => format!(
                        "encoded {} / {}",
                        format_clock(out_time),
                        format_clock(total)
                    ),
                    None => format!("encoded {}", format_clock(out_time)),
                };
                self.bar.set_message(message);
            }
            PipelineEvent::Finished { path } => {
                self.bar
                    .finish_with_message(format!("Saved {}", path.display()));
            }
        }
    }

    /// Drains `rx` until every sender is gone, then clears an unfinished bar.
    pub fn spawn(self, mut rx: mpsc::Receiver<PipelineEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                self.handle_event(event);
            }
            if !self.bar.is_finished() {
                self.bar.abandon();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::from_secs(75)), "00:01:15");
        assert_eq!(format_clock(Duration::from_secs(3 * 3600 + 5)), "03:00:05");
    }

    #[test]
    fn test_segment_progress() {
        let manager = ProgressManager::new(true);
        manager.handle_event(PipelineEvent::SegmentAcquired { index: 2, total: 5 });
        assert_eq!(manager.bar.position(), 3);
        assert_eq!(manager.bar.length(), Some(5));
    }
}
