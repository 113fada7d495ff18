use std::path::Path;

use scdl_engine::AuthContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppError;

/// Credentials file, `{"client_id": "...", "oauth": "..."}`.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub oauth: String,
}

impl CredentialsConfig {
    /// Reads the file at `path`, writing an empty template first when it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            let config = Self::default();
            let body = serde_json::to_string_pretty(&config).map_err(|source| AppError::Config {
                path: path.to_path_buf(),
                source,
            })?;
            std::fs::write(path, body)?;
            info!(path = %path.display(), "Created empty config file");
            return Ok(config);
        }

        let body = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&body).map_err(|source| AppError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Merges command-line overrides and builds the request credentials.
    pub fn into_auth(
        self,
        client_id: Option<String>,
        oauth: Option<String>,
        path: &Path,
    ) -> Result<AuthContext, AppError> {
        let client_id = client_id.unwrap_or(self.client_id);
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(AppError::MissingClientId(path.to_path_buf()));
        }

        let auth = AuthContext::new(client_id);
        Ok(match oauth.unwrap_or(self.oauth) {
            token if token.trim().is_empty() => auth,
            token => auth.with_access_token(token),
        })
    }
}
