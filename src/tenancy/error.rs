use thiserror::Error;

use crate::database::DatabaseError;
use crate::tenancy::scope::ScopeError;

/// Validation rule that rejected a tenant selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    Required,
    String,
    Exists,
}

impl SelectionRule {
    pub fn message(self) -> &'static str {
        match self {
            SelectionRule::Required => "Select a tenant before saving your context.",
            SelectionRule::String => "The tenant id field must be a string.",
            SelectionRule::Exists => "The selected tenant is no longer available.",
        }
    }
}

#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("No tenant could be resolved for this request")]
    NoTenantResolved,

    #[error("Identity is not permitted to operate in the resolved tenant")]
    Forbidden,

    #[error("Invalid {field}: {}", rule.message())]
    Validation {
        field: &'static str,
        rule: SelectionRule,
    },

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl TenancyError {
    pub fn invalid_tenant_id(rule: SelectionRule) -> Self {
        TenancyError::Validation {
            field: "tenant_id",
            rule,
        }
    }
}
