use clap::Parser;
use scdl_engine::{AudioCodec, Quality};
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser)]
#[command(
    version,
    about = "Download SoundCloud tracks and transcode them locally",
    long_about = "Resolves a SoundCloud track, downloads its HLS stream and pipes it\n\
                  through ffmpeg into the requested codec.\n\
                  \n\
                  Credentials are read from the config file and can be overridden\n\
                  with --client-id and --oauth."
)]
pub struct CliArgs {
    /// Track page URL
    #[arg(
        short,
        long,
        help = "Track URL, e.g. https://soundcloud.com/<artist>/<track>"
    )]
    pub url: String,

    /// Output file name without extension
    #[arg(
        short,
        long,
        help = "Output file name without extension (default: \"<artist> - <title>\")"
    )]
    pub output: Option<String>,

    /// Output directory
    #[arg(
        short = 'd',
        long,
        default_value = ".",
        help = "Directory where the transcoded file is written"
    )]
    pub output_dir: PathBuf,

    /// Output codec
    #[arg(
        short,
        long,
        default_value = "mp3",
        help = "Output codec: mp3, opus, vorbis, aac, flac or wav"
    )]
    pub codec: AudioCodec,

    /// Codec-specific quality
    #[arg(
        short,
        long,
        help = "Quality override, e.g. 320k, q5 (vorbis/mp3 VBR), c5 (flac)"
    )]
    pub quality: Option<Quality>,

    /// Credentials file
    #[arg(
        long,
        default_value = "config.json",
        help = "JSON file holding client_id and oauth; created when missing"
    )]
    pub config: PathBuf,

    /// Client identifier, overrides the config file
    #[arg(long, help = "SoundCloud client id (overrides the config file)")]
    pub client_id: Option<String>,

    /// Elevated access token, overrides the config file
    #[arg(long, help = "OAuth token for subscription-tier streams (overrides the config file)")]
    pub oauth: Option<String>,

    /// Number of concurrent segment downloads
    #[arg(
        long,
        default_value = "4",
        help = "Maximum number of concurrent segment downloads"
    )]
    pub concurrency: usize,

    /// Encoder executable
    #[arg(
        long,
        default_value = "ffmpeg",
        help = "Encoder program name or path"
    )]
    pub encoder: PathBuf,

    /// Skip cover art
    #[arg(long, help = "Do not embed the track artwork")]
    pub no_artwork: bool,

    /// Overall timeout in seconds
    #[arg(
        long,
        default_value = "30",
        help = "Overall timeout in seconds for metadata and playlist requests"
    )]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value = "10",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    /// Custom HTTP headers for requests
    #[arg(
        long = "header",
        short = 'H',
        help = "Add custom HTTP header to requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,

    /// Hide the progress bar
    #[arg(long, help = "Disable the progress bar")]
    pub no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}
