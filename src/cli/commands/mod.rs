pub mod database;
pub mod server;
pub mod tenant;
pub mod token;
pub mod user;
