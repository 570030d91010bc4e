// handlers/settings/mod.rs - Account settings outside any tenant scope

pub mod tenant_context;

pub use tenant_context::{tenant_context_destroy, tenant_context_edit, tenant_context_update};
