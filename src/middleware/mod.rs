pub mod auth;
pub mod response;
pub mod tenant_context;

pub use auth::authenticate;
pub use response::{ApiResponse, ApiResult};
pub use tenant_context::initialize_tenant_context;
