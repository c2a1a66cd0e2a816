use async_trait::async_trait;

use super::sitemap_model::SitemapInfo;
use crate::errors::Result;

#[async_trait]
pub trait SitemapRepositoryTrait: Send + Sync {
    fn get_sitemap_info(&self, bibcode: &str) -> Result<Option<SitemapInfo>>;

    /// Inserts or updates the row keyed by `info.bibcode`.
    async fn save_sitemap_info(&self, info: SitemapInfo) -> Result<SitemapInfo>;

    /// Removes every row. Returns the number removed.
    async fn delete_all(&self) -> Result<usize>;
}
