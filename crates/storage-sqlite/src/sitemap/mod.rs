mod model;
mod repository;

pub use model::{NewSitemapInfoDB, SitemapInfoDB};
pub use repository::SitemapRepository;
