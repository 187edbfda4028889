pub mod catalog;
pub mod memory;

pub use catalog::{CatalogRepository, PgCatalogRepository};
pub use memory::MemoryCatalogRepository;
