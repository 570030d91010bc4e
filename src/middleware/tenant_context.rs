use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::tenancy::resolver::request_host;
use crate::tenancy::{
    AccessGuard, Identity, ResolutionRequest, SecurityContext, SessionSelection, TenancyError,
};

/// Resolve, authorize and enter the tenant for a request.
///
/// On success the handler runs with a [`SecurityContext`] extension whose scope is
/// active; the scope exits once the response is produced. On any failure the scope
/// is never entered and the request is refused with the uniform 403.
pub async fn initialize_tenant_context(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let security = SecurityContext::new();
    let identity = request.extensions().get::<Identity>().cloned();

    // Resolved once; both the session strategy and the guard use this value.
    // A selection naming a deleted tenant is cleared here and counts as none.
    let selection = match identity.as_ref().filter(|i| i.elevated) {
        Some(elevated) => SessionSelection::new(
            state.sessions.as_ref(),
            elevated.session_id,
            state.config.tenancy.session_key(),
        )
        .resolve(state.tenants.as_ref())
        .await?
        .map(|tenant| tenant.id),
        None => None,
    };

    let resolved = {
        let headers = request.headers().clone();
        let host = request_host(request.uri(), &headers);
        let resolution = ResolutionRequest {
            host: host.as_deref(),
            headers: &headers,
            identity: identity.as_ref(),
            session_selection: selection.as_deref(),
        };
        state.resolver.resolve(&resolution).await
    };

    let tenant = match resolved {
        Ok(tenant) => tenant,
        Err(TenancyError::NoTenantResolved) => {
            security.exit();
            warn!("Tenant access denied: no tenant could be resolved for {}", request.uri().path());
            return Err(TenancyError::NoTenantResolved.into());
        }
        Err(err) => return Err(err.into()),
    };

    if !AccessGuard::authorize(identity.as_ref(), &tenant, selection.as_deref()) {
        let reason = match &identity {
            None => format!("anonymous request for tenant '{}'", tenant.id),
            Some(identity) => format!("user {} is not permitted in tenant '{}'", identity.user_id, tenant.id),
        };
        return Err(AccessGuard::deny(&security, &reason).into());
    }

    let _scope = security.enter(tenant);
    request.extensions_mut().insert(security.clone());
    Ok(next.run(request).await)
}
