//! Permission matrix model.
//!
//! A permission row grants six independent capabilities on one module to one
//! role inside one tenant. A missing row grants nothing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::AlchemyError;
use crate::module::module_key;

/// Capability checked against a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Retrieve,
    Update,
    Delete,
    Comment,
    CreateTask,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Create,
        Action::Retrieve,
        Action::Update,
        Action::Delete,
        Action::Comment,
        Action::CreateTask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Retrieve => "retrieve",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Comment => "comment",
            Action::CreateTask => "create_task",
        }
    }

    /// Name of the permission column this action maps to.
    pub fn field_name(&self) -> &'static str {
        match self {
            Action::Create => "can_create",
            Action::Retrieve => "can_retrieve",
            Action::Update => "can_update",
            Action::Delete => "can_delete",
            Action::Comment => "can_comment",
            Action::CreateTask => "can_create_task",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AlchemyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "retrieve" => Ok(Action::Retrieve),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "comment" => Ok(Action::Comment),
            "create_task" => Ok(Action::CreateTask),
            other => Err(AlchemyError::Validation {
                message: format!("unknown action: {other}"),
            }),
        }
    }
}

/// Raw capability value as it may arrive from storage or an API payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FlagValue {
    pub fn is_set(&self) -> bool {
        match self {
            FlagValue::Bool(b) => *b,
            FlagValue::Int(i) => *i == 1,
            FlagValue::Text(s) => parse_flag(s),
        }
    }
}

/// Normalize a textual capability value.
///
/// `"true"`, `"t"`, `"1"` and `"yes"` (any case, surrounding whitespace
/// ignored) are set; everything else is unset. Every read path that sees a
/// non-boolean representation goes through here.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "1" | "yes"
    )
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<FlagValue>::deserialize(deserializer)?;
    Ok(value.is_some_and(|v| v.is_set()))
}

/// The six capability flags of a permission row.
///
/// Flags are independent: no flag implies another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionFlags {
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub can_create: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub can_retrieve: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub can_update: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub can_delete: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub can_comment: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub can_create_task: bool,
}

impl PermissionFlags {
    pub fn all() -> Self {
        Self {
            can_create: true,
            can_retrieve: true,
            can_update: true,
            can_delete: true,
            can_comment: true,
            can_create_task: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.can_create,
            Action::Retrieve => self.can_retrieve,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
            Action::Comment => self.can_comment,
            Action::CreateTask => self.can_create_task,
        }
    }

    /// Builder-style grant of a single action.
    pub fn with(mut self, action: Action) -> Self {
        match action {
            Action::Create => self.can_create = true,
            Action::Retrieve => self.can_retrieve = true,
            Action::Update => self.can_update = true,
            Action::Delete => self.can_delete = true,
            Action::Comment => self.can_comment = true,
            Action::CreateTask => self.can_create_task = true,
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub role_id: Uuid,
    /// Module identifier as entered (e.g., `Security_Controls`).
    pub module_name: String,
    pub flags: PermissionFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Case-insensitive module match.
    pub fn applies_to(&self, module_name: &str) -> bool {
        module_key(&self.module_name) == module_key(module_name)
    }

    pub fn allows(&self, action: Action) -> bool {
        self.flags.allows(action)
    }

    /// Deterministic record id for a `(role, module, tenant)` key.
    pub fn key_id(tenant_id: Uuid, role_id: Uuid, module_name: &str) -> Uuid {
        let key = format!("permission/{tenant_id}/{role_id}/{}", module_key(module_name));
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }
}

/// Insert-or-update input for one `(role, module, tenant)` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertPermission {
    pub tenant_id: Uuid,
    pub role_id: Uuid,
    pub module_name: String,
    pub flags: PermissionFlags,
}
