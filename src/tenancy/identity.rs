use uuid::Uuid;

use crate::database::models::User;
use crate::database::DatabaseError;
use crate::tenancy::directory::UserStore;
use crate::tenancy::roles::RoleStore;

/// The authenticated requester, loaded fresh for every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub session_id: Uuid,
    /// Home tenant; the only tenant a non-elevated identity may operate in.
    pub home_tenant_id: Option<String>,
    /// Holds the tenant-independent super-admin role.
    pub elevated: bool,
}

impl Identity {
    pub fn from_user(user: &User, session_id: Uuid, elevated: bool) -> Self {
        Self {
            user_id: user.id,
            session_id,
            home_tenant_id: user.tenant_id.clone().filter(|id| !id.is_empty()),
            elevated,
        }
    }

    /// Look up the user and elevated role. Unknown users yield `None` (unauthenticated).
    pub async fn load(
        users: &dyn UserStore,
        roles: &dyn RoleStore,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<Self>, DatabaseError> {
        let Some(user) = users.find_user(user_id).await? else {
            return Ok(None);
        };
        let elevated = roles.has_elevated_role(user.id).await?;
        Ok(Some(Self::from_user(&user, session_id, elevated)))
    }
}
