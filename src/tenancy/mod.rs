//! Tenant identification and access control.
//!
//! Per request: the [`resolver`] picks a candidate tenant, the [`guard`] decides whether
//! the identity may operate there, and [`scope`] activates the request-local
//! [`SecurityContext`] that confines all tenant-owned data access.

pub mod directory;
pub mod error;
pub mod guard;
pub mod identity;
pub mod resolver;
pub mod roles;
pub mod scope;
pub mod selector;
pub mod session;

pub use directory::{TenantDirectory, UserStore};
pub use error::{SelectionRule, TenancyError};
pub use guard::AccessGuard;
pub use identity::Identity;
pub use resolver::{ResolutionRequest, TenantResolver, TenantStrategy};
pub use roles::{PermissionPartition, RoleStore, SUPER_ADMIN};
pub use scope::{ScopeError, ScopeGuard, SecurityContext, TenantKey};
pub use selector::{SelectorView, SharedState, TenantContextSelector, TenantContextView};
pub use session::{SessionSelection, SessionStore};
