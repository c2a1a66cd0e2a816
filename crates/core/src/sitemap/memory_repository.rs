use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use super::sitemap_model::SitemapInfo;
use super::sitemap_traits::SitemapRepositoryTrait;
use crate::errors::{DatabaseError, Error, Result};

/// In-process sitemap table.
#[derive(Clone, Default)]
pub struct InMemorySitemapRepository {
    rows: Arc<Mutex<BTreeMap<String, SitemapInfo>>>,
    fail_on: Arc<Mutex<HashSet<String>>>,
}

impl InMemorySitemapRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<SitemapInfo> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    /// Makes saves of `bibcode` fail.
    pub fn fail_on(&self, bibcode: &str) {
        self.fail_on.lock().unwrap().insert(bibcode.to_string());
    }
}

#[async_trait]
impl SitemapRepositoryTrait for InMemorySitemapRepository {
    fn get_sitemap_info(&self, bibcode: &str) -> Result<Option<SitemapInfo>> {
        Ok(self.rows.lock().unwrap().get(bibcode).cloned())
    }

    async fn save_sitemap_info(&self, mut info: SitemapInfo) -> Result<SitemapInfo> {
        if self.fail_on.lock().unwrap().contains(&info.bibcode) {
            return Err(Error::Database(DatabaseError::QueryFailed(format!(
                "cannot save sitemap row for {}",
                info.bibcode
            ))));
        }
        let mut rows = self.rows.lock().unwrap();
        if info.id.is_none() {
            info.id = rows
                .get(&info.bibcode)
                .and_then(|r| r.id)
                .or(Some(rows.len() as i64 + 1));
        }
        rows.insert(info.bibcode.clone(), info.clone());
        Ok(info)
    }

    async fn delete_all(&self) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        let count = rows.len();
        rows.clear();
        Ok(count)
    }
}
