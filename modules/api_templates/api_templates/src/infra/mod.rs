pub mod memory;
pub mod storage;

pub use memory::{CatalogSnapshot, InMemoryCatalog};
pub use storage::SeaOrmCatalog;
