//! CLI arguments and server configuration defaults.

use clap::Parser;

pub const UPLOAD_DIR_ENV: &str = "UPLOAD_DIR";
pub const DEFAULT_UPLOAD_SUBDIR: &str = "uploads";
pub const DEFAULT_KEY_HEADER: &str = "HYZH-KEY";
pub const DEFAULT_SHARED_KEY: &str = "HYzh221015";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const SHUTDOWN_GRACE_SECS: u64 = 10;
/// Consecutive unreadable parts tolerated before the multipart stream is treated as finished.
pub const MAX_CONSECUTIVE_PART_ERRORS: u32 = 16;

pub const ALIVE_BODY: &str = "file_upload.rs";
pub const UPLOAD_OK_BODY: &str = "上传成功";

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "file-upload", version, about = "Project-scoped file upload server")]
pub struct Args {
    #[arg(
        long,
        env = UPLOAD_DIR_ENV,
        help = "Upload root directory (defaults to <executable dir>/uploads)"
    )]
    pub upload_dir: Option<String>,
    #[arg(
        short = 'b',
        long,
        env = "FILE_UPLOAD_BIND",
        default_value = "0.0.0.0",
        help = "Bind address"
    )]
    pub host: String,
    #[arg(
        short = 'p',
        long,
        env = "FILE_UPLOAD_PORT",
        default_value_t = DEFAULT_HTTP_PORT,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "FILE_UPLOAD_KEY_HEADER",
        default_value = DEFAULT_KEY_HEADER,
        help = "Request header carrying the shared key"
    )]
    pub key_header: String,
    #[arg(
        long,
        env = "FILE_UPLOAD_KEY",
        default_value = DEFAULT_SHARED_KEY,
        help = "Shared key expected in the key header"
    )]
    pub shared_key: String,
    #[arg(
        long,
        env = "FILE_UPLOAD_REQUIRE_KEY",
        help = "Reject uploads that do not carry the key header"
    )]
    pub require_key: bool,
}

impl Args {
    /// Upload root override, with an empty value treated as unset.
    pub fn upload_dir_override(&self) -> Option<&str> {
        self.upload_dir.as_deref().filter(|value| !value.is_empty())
    }
}
