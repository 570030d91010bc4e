use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::store::TenantOwned;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Matter {
    pub id: i64,
    pub tenant_id: String,
    pub client_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub reference_number: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMatter {
    pub client_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub reference_number: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "open".to_string()
}

impl TenantOwned for Matter {
    type Draft = NewMatter;

    const TABLE: &'static str = "matters";

    fn id(&self) -> i64 {
        self.id
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}
