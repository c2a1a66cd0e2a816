use async_trait::async_trait;

use crate::errors::Result;

/// Hands a key to the external affiliation augmentation pipeline.
///
/// The pipeline answers later with an `augment` notification.
#[async_trait]
pub trait AugmentationClient: Send + Sync {
    async fn request_augment(&self, bibcode: &str) -> Result<()>;
}
