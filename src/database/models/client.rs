use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::store::TenantOwned;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub tenant_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client payload; the owning tenant always comes from the active scope.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
}

impl TenantOwned for Client {
    type Draft = NewClient;

    const TABLE: &'static str = "clients";

    fn id(&self) -> i64 {
        self.id
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}
