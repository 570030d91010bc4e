pub mod client;
pub mod matter;
pub mod tenant;
pub mod user;

pub use client::{Client, NewClient};
pub use matter::{Matter, NewMatter};
pub use tenant::{Domain, NewTenant, Tenant, TenantRecord, TenantSummary};
pub use user::{NewUser, User};
