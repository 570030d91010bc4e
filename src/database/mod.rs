pub mod manager;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod postgres;
pub mod seed;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryBackend;
pub use postgres::PgBackend;
