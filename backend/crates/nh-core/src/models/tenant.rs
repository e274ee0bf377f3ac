//! Tenant entity - the isolation unit that owns one notification channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An organization registered in the tenant directory.
///
/// The gateway only reads tenants. `secret_key` gates subscription access
/// and must never be logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Unique name, also the channel identifier
    pub name: String,
    #[serde(skip_serializing, default)]
    pub secret_key: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Notifications accepted today, maintained by the validation gate
    pub daily_notification_count: i64,
}

impl Tenant {
    /// Create a new tenant with a freshly generated secret key
    pub fn new(name: String, owner_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            secret_key: Uuid::new_v4().simple().to_string(),
            owner_id,
            created_at: Utc::now(),
            daily_notification_count: 0,
        }
    }

    pub fn secret_matches(&self, secret: &str) -> bool {
        self.secret_key.len() == secret.len()
            && self
                .secret_key
                .bytes()
                .zip(secret.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}
