pub mod manager;
pub mod memory;
pub mod models;
pub mod query_builder;
pub mod record;
pub mod repository;
pub mod table;
pub mod tables;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryTable;
pub use record::Record;
pub use repository::Repository;
pub use table::Table;
pub use tables::Tables;
