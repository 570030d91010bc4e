use tracing::warn;

use crate::database::models::Tenant;
use crate::tenancy::error::TenancyError;
use crate::tenancy::identity::Identity;
use crate::tenancy::scope::SecurityContext;

/// Decides whether an identity may operate inside a resolved tenant
pub struct AccessGuard;

impl AccessGuard {
    /// `selection` is the tenant id stored in the identity's session, if any.
    pub fn authorize(identity: Option<&Identity>, tenant: &Tenant, selection: Option<&str>) -> bool {
        let Some(identity) = identity else {
            return false;
        };

        if !identity.elevated {
            return identity.home_tenant_id.as_deref() == Some(tenant.id.as_str());
        }

        match selection {
            None => true,
            Some(selected) => selected.is_empty() || selected == tenant.id,
        }
    }

    /// Reset partitioned permission state, then report the uniform denial.
    pub fn deny(context: &SecurityContext, reason: &str) -> TenancyError {
        context.reset_partition();
        warn!("Tenant access denied: {}", reason);
        TenancyError::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::roles::PermissionPartition;
    use chrono::Utc;
    use uuid::Uuid;

    fn tenant(id: &str) -> Tenant {
        Tenant {
            id: id.to_string(),
            name: id.to_string(),
            slug: id.to_string(),
            logo_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn identity(home: Option<&str>, elevated: bool) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            home_tenant_id: home.map(str::to_string),
            elevated,
        }
    }

    #[test]
    fn unauthenticated_is_denied() {
        assert!(!AccessGuard::authorize(None, &tenant("t1"), None));
    }

    #[test]
    fn regular_identity_is_bound_to_home_tenant() {
        let user = identity(Some("t1"), false);
        for other in ["t2", "t3", "T1", ""] {
            assert!(!AccessGuard::authorize(Some(&user), &tenant(other), None));
        }
        assert!(AccessGuard::authorize(Some(&user), &tenant("t1"), None));
    }

    #[test]
    fn regular_identity_ignores_session_selection() {
        let user = identity(Some("t1"), false);
        assert!(!AccessGuard::authorize(Some(&user), &tenant("t2"), Some("t2")));
    }

    #[test]
    fn regular_identity_without_home_tenant_is_denied() {
        let user = identity(None, false);
        assert!(!AccessGuard::authorize(Some(&user), &tenant("t1"), None));
    }

    #[test]
    fn elevated_identity_without_selection_enters_any_tenant() {
        let admin = identity(None, true);
        for id in ["t1", "t3", "t5"] {
            assert!(AccessGuard::authorize(Some(&admin), &tenant(id), None));
            assert!(AccessGuard::authorize(Some(&admin), &tenant(id), Some("")));
        }
    }

    #[test]
    fn elevated_identity_is_pinned_to_selection() {
        let admin = identity(None, true);
        assert!(AccessGuard::authorize(Some(&admin), &tenant("t4"), Some("t4")));
        assert!(!AccessGuard::authorize(Some(&admin), &tenant("t5"), Some("t4")));
    }

    #[test]
    fn deny_resets_partition() {
        let ctx = SecurityContext::new();
        let _guard = ctx.enter(tenant("t1"));
        let err = AccessGuard::deny(&ctx, "test");
        assert!(matches!(err, TenancyError::Forbidden));
        assert_eq!(ctx.partition(), PermissionPartition::Global);
    }
}
