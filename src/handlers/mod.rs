// handlers/mod.rs - Handlers grouped by the access they require
//
// public   - no authentication (/, /health)
// settings - authenticated, no tenant scope (/settings/*)
// tenant   - authenticated and inside an active tenant scope (/api/*)

pub mod public;
pub mod settings;
pub mod tenant;
