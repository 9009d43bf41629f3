//! Module identifiers and permission codes.
//!
//! Modules are free-text identifiers compared case-insensitively. New
//! modules appear without schema changes, so they stay strings; the
//! registry below is only consulted when strict validation is requested.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AlchemyError;
use crate::models::permission::Action;

/// Modules the platform ships with.
pub const KNOWN_MODULES: &[&str] = &[
    "actions",
    "audits",
    "certifications",
    "dashboard",
    "departments",
    "roles",
    "security_controls",
    "tasks",
    "users",
];

/// Canonical comparison key for a module name.
pub fn module_key(module_name: &str) -> String {
    module_name.trim().to_lowercase()
}

pub fn is_known_module(module_name: &str) -> bool {
    let key = module_key(module_name);
    KNOWN_MODULES.contains(&key.as_str())
}

/// A `"<module>_<action>"` code such as `users_retrieve` or
/// `security_controls_create_task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCode {
    pub module: String,
    pub action: Action,
}

impl PermissionCode {
    pub fn new(module: impl Into<String>, action: Action) -> Self {
        Self {
            module: module.into(),
            action,
        }
    }
}

impl FromStr for PermissionCode {
    type Err = AlchemyError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let invalid = || AlchemyError::Validation {
            message: format!("invalid permission code {code:?}: expected '<module>_<action>'"),
        };

        // `create_task` contains the separator, so it has to be tried first.
        let (module, action) = match code.strip_suffix("_create_task") {
            Some(module) => (module, Action::CreateTask),
            None => {
                let (module, action) = code.rsplit_once('_').ok_or_else(invalid)?;
                (module, action.parse::<Action>().map_err(|_| invalid())?)
            }
        };

        if module.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(module, action))
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.module, self.action)
    }
}
