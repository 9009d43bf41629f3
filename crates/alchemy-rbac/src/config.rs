//! Authorization engine configuration.

/// Configuration for [`RbacService`](crate::RbacService).
#[derive(Debug, Clone)]
pub struct RbacConfig {
    /// When a user has no assignments in the requested tenant, retry the
    /// lookup without the tenant filter. Only safe while user ids are
    /// globally unique (default: true).
    pub tenant_fallback: bool,
    /// Skip deactivated roles when granting permissions or the super admin
    /// override (default: true).
    pub ignore_inactive_roles: bool,
    /// Reject permission updates for modules outside
    /// [`KNOWN_MODULES`](alchemy_core::module::KNOWN_MODULES) (default: false).
    pub strict_modules: bool,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            tenant_fallback: true,
            ignore_inactive_roles: true,
            strict_modules: false,
        }
    }
}
