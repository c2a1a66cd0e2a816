use chrono::Utc;
use log::{debug, error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::sitemap_model::{SitemapAction, SitemapInfo, SitemapPopulationReport};
use super::sitemap_traits::SitemapRepositoryTrait;
use crate::errors::{DatabaseError, Error, Result};
use crate::records::{RecordFields, RecordRepositoryTrait};

pub struct SitemapService {
    records: Arc<dyn RecordRepositoryTrait>,
    sitemaps: Arc<dyn SitemapRepositoryTrait>,
    sitemap_dir: PathBuf,
}

impl SitemapService {
    pub fn new(
        records: Arc<dyn RecordRepositoryTrait>,
        sitemaps: Arc<dyn SitemapRepositoryTrait>,
        sitemap_dir: PathBuf,
    ) -> Self {
        Self {
            records,
            sitemaps,
            sitemap_dir,
        }
    }

    /// Populates the sitemap table for `bibcodes`.
    ///
    /// Per-key failures, including missing records, are counted and logged;
    /// the loop always runs to the end.
    pub async fn populate(
        &self,
        bibcodes: &[String],
        action: SitemapAction,
    ) -> Result<SitemapPopulationReport> {
        match action {
            SitemapAction::DeleteTable => {
                let removed = self.sitemaps.delete_all().await?;
                info!("Emptied sitemap table ({} rows)", removed);
                self.backup_sitemap_files()?;
                return Ok(SitemapPopulationReport::default());
            }
            SitemapAction::Remove => {
                info!(
                    "Sitemap action 'remove' is not acted upon ({} keys)",
                    bibcodes.len()
                );
                return Ok(SitemapPopulationReport {
                    total: bibcodes.len(),
                    ..Default::default()
                });
            }
            SitemapAction::Add | SitemapAction::ForceUpdate => {}
        }

        debug!("Updating sitemap info for: {:?}", bibcodes);
        let mut report = SitemapPopulationReport {
            total: bibcodes.len(),
            ..Default::default()
        };

        for bibcode in bibcodes {
            match self.populate_one(bibcode, action).await {
                Ok(created) => {
                    report.successful += 1;
                    if created {
                        report.created.push(bibcode.clone());
                    }
                    debug!("Successfully processed sitemap for bibcode: {}", bibcode);
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "Failed to populate sitemap table for bibcode {}: {}",
                        bibcode, e
                    );
                }
            }
        }

        info!(
            "Sitemap population completed: {} successful, {} failed out of {} total bibcodes",
            report.successful, report.failed, report.total
        );
        info!(
            "{} total sitemap records created: {:?}",
            report.created.len(),
            report.created
        );
        Ok(report)
    }

    /// Returns true when a new row was created.
    async fn populate_one(&self, bibcode: &str, action: SitemapAction) -> Result<bool> {
        let record = self
            .records
            .get_record(bibcode, &RecordFields::none())?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!(
                    "the bibcode {} doesn't exist",
                    bibcode
                )))
            })?;
        let record_id = record.id.ok_or_else(|| {
            Error::Unexpected(format!("record {} has no row id", bibcode))
        })?;

        let existing = self.sitemaps.get_sitemap_info(bibcode)?;
        let created = existing.is_none();

        let info = match existing {
            None => SitemapInfo {
                id: None,
                record_id,
                bibcode: record.bibcode.clone(),
                bib_data_updated: record.bib_data_updated,
                filename_lastmoddate: None,
                sitemap_filename: None,
                update_flag: true,
            },
            Some(row) => {
                let stale = match (row.filename_lastmoddate, record.bib_data_updated) {
                    (None, _) => true,
                    (Some(generated), Some(updated)) => updated > generated,
                    (Some(_), None) => false,
                };
                let flag = match action {
                    SitemapAction::ForceUpdate => true,
                    _ => stale,
                };
                SitemapInfo {
                    id: row.id,
                    record_id,
                    bibcode: record.bibcode.clone(),
                    bib_data_updated: record.bib_data_updated,
                    filename_lastmoddate: row.filename_lastmoddate,
                    sitemap_filename: row.sitemap_filename,
                    update_flag: row.update_flag || flag,
                }
            }
        };

        self.sitemaps.save_sitemap_info(info).await?;
        Ok(created)
    }

    /// Moves every file of the sitemap directory into a timestamped backup
    /// directory beneath it. Returns the backup directory, if anything moved.
    pub fn backup_sitemap_files(&self) -> Result<Option<PathBuf>> {
        backup_files(&self.sitemap_dir)
    }
}

fn backup_files(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        debug!("Sitemap directory {} does not exist", dir.display());
        return Ok(None);
    }

    let files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    if files.is_empty() {
        return Ok(None);
    }

    let backup_dir = dir
        .join("backups")
        .join(Utc::now().format("%Y%m%d%H%M%S%f").to_string());
    fs::create_dir_all(&backup_dir)?;
    for file in &files {
        if let Some(name) = file.file_name() {
            fs::rename(file, backup_dir.join(name))?;
        }
    }
    info!(
        "Moved {} sitemap file(s) to {}",
        files.len(),
        backup_dir.display()
    );
    Ok(Some(backup_dir))
}
