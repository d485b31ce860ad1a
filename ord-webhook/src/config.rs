//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup and carried in [`crate::AppState`];
//! nothing else in the crate touches the environment.

use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Default wallet name handed to `ord --wallet`.
pub const DEFAULT_WALLET: &str = "ilyaFriends";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret used to verify the `ordinals-sig` header
    pub ordinals_secret: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Directory downloaded files are written to
    pub download_dir: PathBuf,

    /// Path to the `ord` binary
    pub ord_bin: PathBuf,

    /// Extra global flags passed to `ord` before `--wallet`
    pub ord_args: Vec<String>,

    /// Wallet name every inscribe/send runs under
    pub ord_wallet: String,

    /// User-Agent sent when downloading files
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            ordinals_secret: env::var("ORDINALS_SECRET").unwrap_or_default(),

            port: parse_or("PORT", 3010),

            download_dir: env::var("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./image-folder")),

            ord_bin: env::var("ORD_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_ord_bin()),

            ord_args: parse_csv("ORD_ARGS").unwrap_or_default(),

            ord_wallet: env::var("ORD_WALLET")
                .ok()
                .filter(|w| !w.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_WALLET.to_string()),

            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| {
                format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            }),
        }
    }

    /// Whether a usable signing secret was provided.
    pub fn is_secret_configured(&self) -> bool {
        !self.ordinals_secret.trim().is_empty()
    }
}

/// `~/bin/ord` when HOME is known, otherwise whatever `ord` is on PATH.
fn default_ord_bin() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join("bin").join("ord"),
        None => PathBuf::from("ord"),
    }
}

/// Parse a variable, falling back to `default` when unset or malformed.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
