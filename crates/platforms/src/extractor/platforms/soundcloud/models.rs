use serde::Deserialize;

/// Body of `GET /resolve`. Only the fields needed to pick and fetch a stream.
#[derive(Debug, Deserialize)]
pub struct ResolveResponse {
    pub kind: Option<String>,
    pub id: Option<u64>,
    pub title: Option<String>,
    // milliseconds
    pub duration: Option<u64>,
    pub permalink_url: Option<String>,
    pub artwork_url: Option<String>,
    pub policy: Option<String>,
    pub track_authorization: Option<String>,
    pub user: Option<User>,
    #[serde(default)]
    pub media: Media,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub username: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub transcodings: Vec<Transcoding>,
}

#[derive(Debug, Deserialize)]
pub struct Transcoding {
    pub url: String,
    #[serde(default)]
    pub preset: String,
    // milliseconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub snipped: bool,
    #[serde(default)]
    pub quality: String,
    pub format: TranscodingFormat,
}

#[derive(Debug, Deserialize)]
pub struct TranscodingFormat {
    pub protocol: String,
    #[serde(default)]
    pub mime_type: String,
}
