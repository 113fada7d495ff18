// HLS Segment Fetcher: Handles the raw download of individual media segments with retry logic.

use crate::hls::config::HlsConfig;
use crate::hls::error::AcquisitionError;
use crate::hls::manifest::SegmentRef;
use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Server errors plus the 4xx answers that signal throttling rather than refusal.
pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

#[async_trait]
pub trait SegmentDownloader: Send + Sync {
    async fn download_segment(&self, segment: &SegmentRef) -> Result<Bytes, AcquisitionError>;
}

/// Retries shared by all segments of one acquisition.
#[derive(Debug)]
pub struct RetryBudget {
    total: u32,
    remaining: AtomicU32,
}

impl RetryBudget {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            remaining: AtomicU32::new(total),
        }
    }

    /// Takes one retry from the budget. Returns false once it is spent.
    pub fn try_consume(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    pub fn total(&self) -> u32 {
        self.total
    }
}

pub struct SegmentFetcher {
    http_client: Client,
    config: Arc<HlsConfig>,
    retry_budget: RetryBudget,
}

impl SegmentFetcher {
    pub fn new(http_client: Client, config: Arc<HlsConfig>) -> Self {
        let retry_budget = RetryBudget::new(config.fetcher_config.total_retry_budget);
        Self {
            http_client,
            config,
            retry_budget,
        }
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let fetcher_config = &self.config.fetcher_config;
        let base = HlsConfig::backoff(fetcher_config.segment_retry_delay_base, attempt);
        let jitter_ms = fetcher_config.max_retry_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }

    /// Fetches a segment with retry logic.
    /// Retries on network errors, server errors (5xx), 408 and 429.
    async fn fetch_with_retries(&self, segment: &SegmentRef) -> Result<Bytes, AcquisitionError> {
        let max_retries = self.config.fetcher_config.max_segment_retries;
        let mut attempts = 0;
        let mut last_status: Option<StatusCode> = None;
        let mut last_reason = String::new();

        loop {
            attempts += 1;
            let mut request_builder = self.http_client.get(segment.url.clone());
            if let Some(range) = &segment.byte_range {
                request_builder =
                    request_builder.header(reqwest::header::RANGE, range.header_value());
            }

            match request_builder
                .timeout(self.config.fetcher_config.segment_download_timeout)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.bytes().await {
                            Ok(bytes) => return Ok(bytes),
                            Err(e) => {
                                last_status = None;
                                last_reason = format!("body read failed: {e}");
                            }
                        }
                    } else if is_retryable_status(status) {
                        last_status = Some(status);
                        last_reason = match status.canonical_reason() {
                            Some(reason) => reason.to_lowercase(),
                            None => "server error".to_string(),
                        };
                    } else {
                        return Err(AcquisitionError::SegmentUnavailable {
                            index: segment.index,
                            status: Some(status),
                            reason: "rejected by server".to_string(),
                        });
                    }
                }
                Err(e) => {
                    if !e.is_connect() && !e.is_timeout() && !e.is_request() {
                        // Non-retryable network errors
                        return Err(AcquisitionError::SegmentUnavailable {
                            index: segment.index,
                            status: e.status(),
                            reason: e.to_string(),
                        });
                    }
                    last_status = None;
                    last_reason = e.to_string();
                }
            }

            if attempts > max_retries {
                return Err(AcquisitionError::SegmentUnavailable {
                    index: segment.index,
                    status: last_status,
                    reason: format!("max retries ({max_retries}) exceeded: {last_reason}"),
                });
            }
            if !self.retry_budget.try_consume() {
                return Err(AcquisitionError::Exhausted {
                    retries: self.retry_budget.total(),
                });
            }

            warn!(
                index = segment.index,
                attempt = attempts,
                status = ?last_status,
                reason = %last_reason,
                "Segment fetch failed, retrying"
            );
            tokio::time::sleep(self.retry_delay(attempts)).await;
        }
    }
}

#[async_trait]
impl SegmentDownloader for SegmentFetcher {
    async fn download_segment(&self, segment: &SegmentRef) -> Result<Bytes, AcquisitionError> {
        let bytes = self.fetch_with_retries(segment).await?;
        debug!(
            index = segment.index,
            size = bytes.len(),
            url = %segment.url,
            "Downloaded segment"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_budget() {
        let budget = RetryBudget::new(2);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.total(), 2);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_retry_delay_within_jitter() {
        let mut config = HlsConfig::default();
        config.fetcher_config.segment_retry_delay_base = Duration::from_millis(100);
        config.fetcher_config.max_retry_jitter = Duration::from_millis(50);
        let fetcher = SegmentFetcher::new(Client::new(), Arc::new(config));

        let delay = fetcher.retry_delay(2);
        assert!(delay >= Duration::from_millis(200));
        assert!(delay <= Duration::from_millis(250));
    }
}
