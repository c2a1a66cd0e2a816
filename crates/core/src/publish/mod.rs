//! Downstream publishers - remote writes followed by fingerprint commits.

mod memory_clients;
mod publish_model;
mod publish_service;
mod publish_traits;

#[cfg(test)]
mod publish_service_tests;

pub use memory_clients::InMemoryTarget;
pub use publish_model::{PublishReport, WriteOutcome};
pub use publish_service::PublishService;
pub use publish_traits::{LinksResolverClient, MetricsStoreTrait, SearchIndexClient};
