use anyhow::Context;
use std::{net::SocketAddr, path::PathBuf, time::Duration};

pub const DEFAULT_SOLR_URL: &str = "http://localhost:9983/solr/collection1/update";
pub const DEFAULT_AUGMENT_TASK: &str = "ADSAffil.tasks.task_update_record";

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    /// Unset disables the metrics store.
    pub metrics_db_path: Option<String>,
    pub solr_urls: Vec<String>,
    /// Unset disables links publication.
    pub links_resolver_url: Option<String>,
    pub api_token: String,
    /// Unset drops augmentation requests.
    pub augment_url: Option<String>,
    pub augment_task: String,
    pub sitemap_dir: PathBuf,
    pub enable_has: bool,
    /// Zero disables the scheduler.
    pub sync_interval: Duration,
    pub sync_lookback: Duration,
    pub sync_batch_size: usize,
    pub http_timeout: Duration,
    pub request_timeout: Duration,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid {}: {}", name, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = parse_var(
            "RECSYNC_LISTEN_ADDR",
            SocketAddr::from(([0, 0, 0, 0], 8088)),
        )?;
        let db_path = var("RECSYNC_DB_PATH").unwrap_or_else(|| "./recsync.db".into());
        let solr_urls: Vec<String> = var("RECSYNC_SOLR_URLS")
            .unwrap_or_else(|| DEFAULT_SOLR_URL.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if solr_urls.is_empty() {
            anyhow::bail!("RECSYNC_SOLR_URLS must name at least one update URL");
        }
        let sync_batch_size: usize = parse_var(
            "RECSYNC_SYNC_BATCH_SIZE",
            recsync_core::constants::DEFAULT_SYNC_BATCH_SIZE,
        )?;
        if sync_batch_size == 0 {
            anyhow::bail!("RECSYNC_SYNC_BATCH_SIZE must be positive");
        }

        Ok(Self {
            listen_addr,
            db_path,
            metrics_db_path: var("RECSYNC_METRICS_DB_PATH"),
            solr_urls,
            links_resolver_url: var("RECSYNC_LINKS_RESOLVER_UPDATE_URL"),
            api_token: var("RECSYNC_API_TOKEN").unwrap_or_default(),
            augment_url: var("RECSYNC_AUGMENT_URL"),
            augment_task: var("RECSYNC_AUGMENT_TASK").unwrap_or_else(|| DEFAULT_AUGMENT_TASK.into()),
            sitemap_dir: PathBuf::from(
                var("RECSYNC_SITEMAP_DIR").unwrap_or_else(|| "./sitemap".into()),
            ),
            enable_has: parse_var("RECSYNC_ENABLE_HAS", true)?,
            sync_interval: Duration::from_secs(parse_var("RECSYNC_SYNC_INTERVAL_SECS", 300u64)?),
            sync_lookback: Duration::from_secs(parse_var("RECSYNC_SYNC_LOOKBACK_SECS", 3600u64)?),
            sync_batch_size,
            http_timeout: Duration::from_secs(parse_var("RECSYNC_HTTP_TIMEOUT_SECS", 30u64)?),
            request_timeout: Duration::from_millis(parse_var(
                "RECSYNC_REQUEST_TIMEOUT_MS",
                30_000u64,
            )?),
        })
    }
}
