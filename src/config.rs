use crate::comment::{ChainId, DEFAULT_CHAIN_ID};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_INDEXER_URL: &str = "https://api.ethcomments.xyz";
const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    /// Public origin of this service, used for absolute og:image urls
    pub base_url: String,
    pub indexer_url: String,
    pub chain_id: ChainId,
    /// How long do we wait for the indexer and remote images
    pub timeout: Duration,
    pub font_path: Option<PathBuf>,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind = parse_or("CALINK_BIND", lookup("CALINK_BIND"), default_bind);

        let base_url = match lookup("CALINK_BASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                warn!("CALINK_BASE_URL not set, defaulting to {DEFAULT_BASE_URL} - og:image urls may point to the wrong host");
                DEFAULT_BASE_URL.to_string()
            }
        };

        let indexer_url = lookup("ECP_INDEXER_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_INDEXER_URL.to_string());

        let chain_id = parse_or("CALINK_CHAIN_ID", lookup("CALINK_CHAIN_ID"), || DEFAULT_CHAIN_ID);
        let timeout_ms = parse_or("TIMEOUT_MS", lookup("TIMEOUT_MS"), || DEFAULT_TIMEOUT_MS);

        Config {
            bind,
            base_url,
            indexer_url,
            chain_id,
            timeout: Duration::from_millis(timeout_ms),
            font_path: lookup("CALINK_FONT").map(PathBuf::from),
            static_dir: PathBuf::from(
                lookup("CALINK_STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: default_bind(),
            base_url: DEFAULT_BASE_URL.to_string(),
            indexer_url: DEFAULT_INDEXER_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            font_path: None,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: impl FnOnce() -> T) -> T {
    match value {
        None => default(),
        Some(raw) => match raw.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("ignoring unparseable {key}={raw:?}, using default");
                default()
            }
        },
    }
}
