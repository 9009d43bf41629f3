//! Well-known roles and the legacy role-label mapping.
//!
//! Users carry a free-text role label (`QA`, `PM`, `Admin`, ...). Whenever a
//! label has to become a concrete role assignment it is mapped onto one of
//! the canonical [`SystemRole`]s. Unknown labels fall back to the most
//! restrictive role, [`SystemRole::Viewer`].

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemRole {
    #[default]
    Viewer,
    Contributor,
    Admin,
    SuperAdmin,
    InternalAuditor,
    ExternalAuditor,
}

impl SystemRole {
    pub const ALL: [SystemRole; 6] = [
        SystemRole::Viewer,
        SystemRole::Contributor,
        SystemRole::Admin,
        SystemRole::SuperAdmin,
        SystemRole::InternalAuditor,
        SystemRole::ExternalAuditor,
    ];

    /// Role name as stored in the role table.
    pub fn role_name(&self) -> &'static str {
        match self {
            SystemRole::Viewer => "Viewer",
            SystemRole::Contributor => "Contributor",
            SystemRole::Admin => "Admin",
            SystemRole::SuperAdmin => "Super Admin",
            SystemRole::InternalAuditor => "Internal Auditor",
            SystemRole::ExternalAuditor => "External Auditor",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SystemRole::Viewer => "Read-only access",
            SystemRole::Contributor => "Can create and edit content",
            SystemRole::Admin => "Tenant administration",
            SystemRole::SuperAdmin => "Unrestricted access to every module",
            SystemRole::InternalAuditor => "Internal audit access",
            SystemRole::ExternalAuditor => "External audit access",
        }
    }

    /// Case-insensitive comparison against a stored role name.
    pub fn matches(&self, role_name: &str) -> bool {
        role_name.trim().to_lowercase() == self.role_name().to_lowercase()
    }

    /// Map a legacy user-facing label onto the canonical role.
    pub fn for_label(label: &str) -> Self {
        match label {
            "QA" | "DEV" | "PM" | "Contributor" => SystemRole::Contributor,
            "Others" | "Viewer" => SystemRole::Viewer,
            "Admin" => SystemRole::Admin,
            "Super Admin" => SystemRole::SuperAdmin,
            "Internal Auditor" => SystemRole::InternalAuditor,
            "External Auditor" => SystemRole::ExternalAuditor,
            _ => SystemRole::Viewer,
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role_name())
    }
}

/// Canonical role name for an optional legacy label.
pub fn canonical_role_name(label: Option<&str>) -> &'static str {
    label.map(SystemRole::for_label).unwrap_or_default().role_name()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_legacy_labels() {
        let cases = [
            ("QA", "Contributor"),
            ("DEV", "Contributor"),
            ("PM", "Contributor"),
            ("Others", "Viewer"),
            ("Viewer", "Viewer"),
            ("Contributor", "Contributor"),
            ("Admin", "Admin"),
            ("Super Admin", "Super Admin"),
            ("Internal Auditor", "Internal Auditor"),
            ("External Auditor", "External Auditor"),
        ];
        for (label, expected) in cases {
            assert_eq!(SystemRole::for_label(label).role_name(), expected, "{label}");
        }
    }

    #[test]
    fn unmapped_labels_default_to_viewer() {
        assert_eq!(SystemRole::for_label("Intern"), SystemRole::Viewer);
        assert_eq!(canonical_role_name(None), "Viewer");
        assert_eq!(canonical_role_name(Some("")), "Viewer");
    }

    #[test]
    fn super_admin_name_matches_any_case() {
        assert!(SystemRole::SuperAdmin.matches("super admin"));
        assert!(SystemRole::SuperAdmin.matches("SUPER ADMIN"));
        assert!(!SystemRole::SuperAdmin.matches("superadmin"));
        assert!(SystemRole::InternalAuditor.matches(" internal auditor"));
    }
}
