//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Stored lowercased; unique across all tenants.
    pub email: String,
    pub full_name: String,
    /// Argon2id PHC string. `None` for SSO-only accounts.
    pub password_hash: Option<String>,
    /// `false` blocks every authentication path. There is no automatic
    /// reactivation.
    pub is_active: bool,
    /// Legacy free-text role label (e.g., `QA`, `Admin`). Superseded by
    /// user-role assignments, kept for label-to-role synchronisation.
    pub role: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub tenant_id: Uuid,
    pub email: String,
    pub full_name: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    /// `Some(Some(label))` = set, `Some(None)` = clear, `None` = no change.
    pub role: Option<Option<String>>,
    pub last_login_at: Option<DateTime<Utc>>,
}
