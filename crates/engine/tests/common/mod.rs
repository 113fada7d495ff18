// In-process fixture serving a fake metadata API, playlists and segments.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use scdl_engine::HlsConfig;
use serde_json::json;
use tokio::net::TcpListener;

pub const TRACK_URL: &str = "https://soundcloud.com/artist/night-drive";

pub struct FixtureState {
    base: String,
    segments: Vec<Vec<u8>>,
    failures: Mutex<HashMap<usize, (u32, StatusCode)>>,
    missing: HashSet<usize>,
    delays: HashMap<usize, Duration>,
    playlist_failures: AtomicU32,
    segment_hits: Mutex<HashMap<usize, u32>>,
    playlist_hits: AtomicU32,
    low_variant_hits: AtomicU32,
    resolve_hits: AtomicU32,
}

#[derive(Default)]
pub struct FixtureBuilder {
    segment_count: usize,
    failures: HashMap<usize, (u32, StatusCode)>,
    missing: HashSet<usize>,
    delays: HashMap<usize, Duration>,
    playlist_failures: u32,
}

impl FixtureBuilder {
    /// Segment `index` answers 503 `times` times before succeeding.
    pub fn failing(mut self, index: usize, times: u32) -> Self {
        self.failures
            .insert(index, (times, StatusCode::SERVICE_UNAVAILABLE));
        self
    }

    /// Segment `index` answers 429 `times` times before succeeding.
    pub fn throttled(mut self, index: usize, times: u32) -> Self {
        self.failures
            .insert(index, (times, StatusCode::TOO_MANY_REQUESTS));
        self
    }

    pub fn missing(mut self, index: usize) -> Self {
        self.missing.insert(index);
        self
    }

    pub fn delayed(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    /// The media playlist answers 503 `times` times before succeeding.
    pub fn failing_playlist(mut self, times: u32) -> Self {
        self.playlist_failures = times;
        self
    }

    pub async fn start(self) -> Fixture {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(FixtureState {
            base: base.clone(),
            segments: (0..self.segment_count).map(segment_body).collect(),
            failures: Mutex::new(self.failures),
            missing: self.missing,
            delays: self.delays,
            playlist_failures: AtomicU32::new(self.playlist_failures),
            segment_hits: Mutex::new(HashMap::new()),
            playlist_hits: AtomicU32::new(0),
            low_variant_hits: AtomicU32::new(0),
            resolve_hits: AtomicU32::new(0),
        });

        let app = Router::new()
            .route("/resolve", get(resolve))
            .route("/media/opus/stream/hls", get(stream_location))
            .route("/playlist.m3u8", get(playlist))
            .route("/master.m3u8", get(master_playlist))
            .route("/low.m3u8", get(low_variant))
            .route("/ranged.m3u8", get(ranged_playlist))
            .route("/blob", get(blob))
            .route("/segments/{index}", get(segment))
            .with_state(Arc::clone(&state));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Fixture { base, state }
    }
}

pub struct Fixture {
    pub base: String,
    state: Arc<FixtureState>,
}

impl Fixture {
    pub fn builder(segment_count: usize) -> FixtureBuilder {
        FixtureBuilder {
            segment_count,
            ..Default::default()
        }
    }

    pub fn playlist_url(&self) -> String {
        format!("{}/playlist.m3u8", self.base)
    }

    pub fn stream_location_url(&self) -> String {
        format!("{}/media/opus/stream/hls", self.base)
    }

    pub fn master_playlist_url(&self) -> String {
        format!("{}/master.m3u8", self.base)
    }

    pub fn ranged_playlist_url(&self) -> String {
        format!("{}/ranged.m3u8", self.base)
    }

    /// Concatenation of every segment body, in order.
    pub fn expected_bytes(&self) -> Vec<u8> {
        self.state.segments.concat()
    }

    pub fn segment_hits(&self, index: usize) -> u32 {
        self.state
            .segment_hits
            .lock()
            .unwrap()
            .get(&index)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_segment_hits(&self) -> u32 {
        self.state.segment_hits.lock().unwrap().values().sum()
    }

    pub fn playlist_hits(&self) -> u32 {
        self.state.playlist_hits.load(Ordering::SeqCst)
    }

    /// Requests that reached a lower-bandwidth master playlist variant.
    pub fn low_variant_hits(&self) -> u32 {
        self.state.low_variant_hits.load(Ordering::SeqCst)
    }

    pub fn resolve_hits(&self) -> u32 {
        self.state.resolve_hits.load(Ordering::SeqCst)
    }
}

/// HLS settings with short delays so retry paths finish quickly.
pub fn fast_hls_config() -> HlsConfig {
    let mut config = HlsConfig::default();
    config.playlist_config.retry_delay_base = Duration::from_millis(10);
    config.fetcher_config.segment_retry_delay_base = Duration::from_millis(10);
    config.fetcher_config.max_retry_jitter = Duration::ZERO;
    config.fetcher_config.segment_download_timeout = Duration::from_secs(5);
    config
}

pub fn segment_body(index: usize) -> Vec<u8> {
    format!("segment-{index:02};").repeat(64).into_bytes()
}

async fn resolve(State(state): State<Arc<FixtureState>>) -> Response {
    state.resolve_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "kind": "track",
        "id": 42,
        "title": "Night Drive",
        "duration": 10000,
        "permalink_url": TRACK_URL,
        "user": { "username": "Artist" },
        "media": {
            "transcodings": [
                {
                    "url": format!("{}/media/opus/stream/hls", state.base),
                    "preset": "opus_0_0",
                    "duration": 10000,
                    "snipped": false,
                    "quality": "sq",
                    "format": { "protocol": "hls", "mime_type": "audio/ogg; codecs=\"opus\"" }
                }
            ]
        }
    }))
    .into_response()
}

async fn stream_location(State(state): State<Arc<FixtureState>>) -> Response {
    Json(json!({ "url": format!("{}/playlist.m3u8", state.base) })).into_response()
}

async fn playlist(State(state): State<Arc<FixtureState>>) -> Response {
    state.playlist_hits.fetch_add(1, Ordering::SeqCst);
    let remaining = state.playlist_failures.load(Ordering::SeqCst);
    if remaining > 0 {
        state.playlist_failures.store(remaining - 1, Ordering::SeqCst);
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let mut body = String::from(
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:2\n#EXT-X-PLAYLIST-TYPE:VOD\n",
    );
    for index in 0..state.segments.len() {
        body.push_str(&format!("#EXTINF:2.0,\n/segments/{index}\n"));
    }
    body.push_str("#EXT-X-ENDLIST\n");
    body.into_response()
}

// The full media playlist is the highest-bandwidth variant but not the last one.
async fn master_playlist() -> Response {
    "#EXTM3U\n\
     #EXT-X-STREAM-INF:BANDWIDTH=64000,CODECS=\"opus\"\nlow.m3u8?rate=64\n\
     #EXT-X-STREAM-INF:BANDWIDTH=256000,CODECS=\"opus\"\nplaylist.m3u8\n\
     #EXT-X-STREAM-INF:BANDWIDTH=128000,CODECS=\"opus\"\nlow.m3u8?rate=128\n"
        .into_response()
}

async fn low_variant(State(state): State<Arc<FixtureState>>) -> Response {
    state.low_variant_hits.fetch_add(1, Ordering::SeqCst);
    "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:2\n\
     #EXTINF:2.0,\n/segments/0\n#EXT-X-ENDLIST\n"
        .into_response()
}

// Declares a 4-byte sub-range of a blob that is served whole.
async fn ranged_playlist() -> Response {
    "#EXTM3U\n#EXT-X-VERSION:4\n#EXT-X-TARGETDURATION:2\n\
     #EXTINF:2.0,\n#EXT-X-BYTERANGE:4@0\n/blob\n#EXT-X-ENDLIST\n"
        .into_response()
}

async fn blob() -> Response {
    "0123456789".into_response()
}

async fn segment(State(state): State<Arc<FixtureState>>, Path(index): Path<usize>) -> Response {
    *state.segment_hits.lock().unwrap().entry(index).or_insert(0) += 1;

    if let Some(delay) = state.delays.get(&index) {
        tokio::time::sleep(*delay).await;
    }
    if state.missing.contains(&index) {
        return StatusCode::NOT_FOUND.into_response();
    }
    {
        let mut failures = state.failures.lock().unwrap();
        if let Some((remaining, status)) = failures.get_mut(&index)
            && *remaining > 0
        {
            *remaining -= 1;
            return (*status).into_response();
        }
    }

    match state.segments.get(index) {
        Some(body) => body.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
