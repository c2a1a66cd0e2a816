use std::sync::Arc;

use crate::config::Config;
use crate::queue::{spawn_workers, QueueTaskSink};
use crate::scheduler::{start_sync_scheduler, SyncScheduler};
use recsync_core::{
    ingest::AugmentationClient,
    publish::{LinksResolverClient, MetricsStoreTrait},
    records::RecordRepositoryTrait,
    tasks::TaskSink,
    PipelineContext, PipelineSettings,
};
use recsync_downstream::{HttpSettings, HttpTaskForwarder, LinksResolverHttpClient, SolrClient};
use recsync_storage_sqlite::{db, RecordRepository, SitemapRepository, SqliteMetricsStore};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub ctx: PipelineContext,
    /// Same sink as `ctx.tasks`; handlers submit through it.
    pub tasks: Arc<dyn TaskSink>,
    pub records: Arc<dyn RecordRepositoryTrait>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("RECSYNC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Opens the stores, builds the downstream clients, starts the queue workers
/// and the scheduler.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let (pool, writer) = db::open(&config.db_path)?;
    tracing::info!("Record store in use: {}", config.db_path);

    let records: Arc<dyn RecordRepositoryTrait> =
        Arc::new(RecordRepository::new(pool.clone(), writer.clone()));
    let sitemaps = Arc::new(SitemapRepository::new(pool, writer));

    let metrics_store: Option<Arc<dyn MetricsStoreTrait>> = match &config.metrics_db_path {
        Some(path) => {
            let (metrics_pool, metrics_writer) = db::open_metrics(path)?;
            tracing::info!("Metrics store in use: {}", path);
            Some(Arc::new(SqliteMetricsStore::new(metrics_pool, metrics_writer)))
        }
        None => {
            tracing::warn!("RECSYNC_METRICS_DB_PATH not set, metrics publication is disabled");
            None
        }
    };

    let http = HttpSettings {
        timeout: config.http_timeout,
    };
    let search_index = Arc::new(SolrClient::new(config.solr_urls.clone(), &http)?);

    let links_resolver: Option<Arc<dyn LinksResolverClient>> = match &config.links_resolver_url {
        Some(url) => Some(Arc::new(LinksResolverHttpClient::new(
            url,
            &config.api_token,
            &http,
        )?)),
        None => {
            tracing::warn!("No links resolver URL configured, links publication is disabled");
            None
        }
    };

    let augmentation: Option<Arc<dyn AugmentationClient>> = match &config.augment_url {
        Some(url) => Some(Arc::new(HttpTaskForwarder::new(
            url,
            &config.augment_task,
            &http,
        )?)),
        None => None,
    };

    let (sink, receivers) = QueueTaskSink::new();
    let tasks: Arc<dyn TaskSink> = Arc::new(sink.clone());

    let ctx = PipelineContext {
        records: records.clone(),
        sitemaps,
        search_index,
        metrics_store,
        links_resolver,
        augmentation,
        tasks: tasks.clone(),
        settings: PipelineSettings {
            sitemap_dir: config.sitemap_dir.clone(),
            enable_has: config.enable_has,
        },
    };

    spawn_workers(ctx.clone(), sink, receivers);
    start_sync_scheduler(
        SyncScheduler::new(
            records.clone(),
            tasks.clone(),
            config.sync_batch_size,
            config.sync_lookback,
        ),
        config.sync_interval,
    );

    Ok(Arc::new(AppState {
        ctx,
        tasks,
        records,
        db_path: config.db_path.clone(),
    }))
}
