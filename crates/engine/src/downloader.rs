use reqwest::Client;
use rustls::{ClientConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::DownloaderConfig;
use crate::error::PipelineError;

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &DownloaderConfig) -> Result<Client, PipelineError> {
    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(8)
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    // Build platform default TLS configuration
    let provider = Arc::new(ring::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .and_then(|builder| builder.with_platform_verifier());
    match tls_config {
        Ok(tls_config) => {
            client_builder = client_builder.use_preconfigured_tls(tls_config.with_no_client_auth());
        }
        Err(e) => {
            warn!(error = %e, "Platform certificate verifier unavailable, using bundled roots");
        }
    }

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if !config.read_timeout.is_zero() {
        client_builder = client_builder.read_timeout(config.read_timeout);
    }

    debug!(
        timeout = ?config.timeout,
        connect_timeout = ?config.connect_timeout,
        "Building HTTP client"
    );
    client_builder.build().map_err(PipelineError::from)
}
