use reqwest::RequestBuilder;
use reqwest::header::AUTHORIZATION;

/// Credentials threaded explicitly through every authenticated request.
///
/// The client identifier is always sent; the platform rejects unauthenticated
/// metadata requests even for public tracks. The access token unlocks
/// subscription-tier variants.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    client_id: String,
    access_token: Option<String>,
}

impl AuthContext {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            access_token: None,
        }
    }

    /// Attaches an elevated access token. Blank tokens are ignored.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        if !token.is_empty() {
            self.access_token = Some(token.to_string());
        }
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn has_elevated_access(&self) -> bool {
        self.access_token.is_some()
    }

    /// Value for the `Authorization` header, normalised to the `OAuth <token>` form.
    pub fn authorization_header(&self) -> Option<String> {
        self.access_token.as_deref().map(|token| {
            if token.starts_with("OAuth ") {
                token.to_string()
            } else {
                format!("OAuth {token}")
            }
        })
    }

    /// Adds the client id query parameter and, when present, the token header.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.query(&[("client_id", self.client_id.as_str())]);
        match self.authorization_header() {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        }
    }
}

// Keep credentials out of logs.
impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("client_id", &"<redacted>")
            .field("elevated", &self.has_elevated_access())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header_normalisation() {
        let auth = AuthContext::new("cid").with_access_token("2-123-abc");
        assert_eq!(
            auth.authorization_header().as_deref(),
            Some("OAuth 2-123-abc")
        );

        let auth = AuthContext::new("cid").with_access_token("OAuth 2-123-abc");
        assert_eq!(
            auth.authorization_header().as_deref(),
            Some("OAuth 2-123-abc")
        );
    }

    #[test]
    fn test_blank_token_is_not_elevated() {
        let auth = AuthContext::new("cid").with_access_token("   ");
        assert!(!auth.has_elevated_access());
        assert!(auth.authorization_header().is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = AuthContext::new("secret-client").with_access_token("secret-token");
        let printed = format!("{auth:?}");
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_apply_sets_query_and_header() {
        let client = reqwest::Client::new();
        let auth = AuthContext::new("cid").with_access_token("tok");
        let request = auth
            .apply(client.get("https://api.example.com/resolve?url=x"))
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/resolve?url=x&client_id=cid"
        );
        assert_eq!(request.headers()[AUTHORIZATION], "OAuth tok");
    }
}
