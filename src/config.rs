use clap::Parser;
use reqwest::Url;
use std::time::Duration;

use crate::error::{Result, UploaderError};

pub const MAX_FILES: usize = 10;
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const MAX_DECODE_DIMENSION: u32 = 2000;
pub const VERIFY_TIMEOUT: Duration = Duration::from_millis(3000);
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);
pub const SUCCESS_CLEAR_DELAY: Duration = Duration::from_secs(3);

#[derive(Parser, Debug)]
#[command(
    name = "evidence_uploader",
    version,
    about = "Attach photo evidence to a business document"
)]
pub struct Cli {
    #[arg(help = "Link encoded in the document's QR code (carries business_id, doc_number, doc_type)")]
    pub entry_url: String,
    #[arg(long, help = "Server origin; defaults to the origin of the entry link")]
    pub server: Option<String>,
    #[arg(long, default_value = "info", help = "Log filter used when RUST_LOG is unset")]
    pub log_level: String,
}

/// Limits and timings for one uploader session.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub server: Url,
    pub max_files: usize,
    pub max_file_size: u64,
    pub max_decode_dimension: u32,
    pub verify_timeout: Duration,
    pub notice_duration: Duration,
    pub success_clear_delay: Duration,
}

impl UploaderConfig {
    pub fn new(server: Url) -> Self {
        Self {
            server,
            max_files: MAX_FILES,
            max_file_size: MAX_FILE_SIZE,
            max_decode_dimension: MAX_DECODE_DIMENSION,
            verify_timeout: VERIFY_TIMEOUT,
            notice_duration: NOTICE_DURATION,
            success_clear_delay: SUCCESS_CLEAR_DELAY,
        }
    }

    /// Resolves the server origin: an explicit `--server` wins, otherwise the
    /// entry link's own origin is used.
    pub fn from_cli(cli: &Cli, entry: &Url) -> Result<Self> {
        let server = match &cli.server {
            Some(raw) => Url::parse(raw)
                .map_err(|e| UploaderError::session(format!("Invalid server address: {}", e)))?,
            None => origin_of(entry)?,
        };
        Ok(Self::new(server))
    }
}

fn origin_of(entry: &Url) -> Result<Url> {
    let origin = entry.origin();
    if !origin.is_tuple() {
        return Err(UploaderError::session(
            "The entry link has no server origin; pass --server",
        ));
    }
    Url::parse(&origin.ascii_serialization())
        .map_err(|e| UploaderError::session(format!("Invalid server address: {}", e)))
}
