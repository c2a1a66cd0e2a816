//! Sitemap module - bookkeeping of which records need their sitemap files
//! regenerated.

mod memory_repository;
mod sitemap_model;
mod sitemap_service;
mod sitemap_traits;


pub use memory_repository::InMemorySitemapRepository;
pub use sitemap_model::{SitemapAction, SitemapInfo, SitemapPopulationReport};
pub use sitemap_service::SitemapService;
pub use sitemap_traits::SitemapRepositoryTrait;
