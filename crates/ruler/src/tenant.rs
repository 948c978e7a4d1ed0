use alertsync_core::config::TenancyConfig;

/// Header the ruler uses to route a request to a tenant's rule store.
pub const SCOPE_ORG_ID_HEADER: &str = "X-Scope-OrgID";

/// Maps internal tenant ids to backend org ids.
///
/// Exactly one reserved internal id is remapped; every other id passes
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantMapper {
    reserved: String,
    backend: String,
}

impl TenantMapper {
    pub fn new(reserved: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            reserved: reserved.into(),
            backend: backend.into(),
        }
    }

    pub fn from_config(config: &TenancyConfig) -> Self {
        Self::new(&config.reserved_tenant, &config.backend_tenant)
    }

    /// Org id to send in [`SCOPE_ORG_ID_HEADER`] for `tenant`.
    pub fn org_id<'a>(&'a self, tenant: &'a str) -> &'a str {
        if tenant == self.reserved {
            &self.backend
        } else {
            tenant
        }
    }
}

impl Default for TenantMapper {
    fn default() -> Self {
        Self::from_config(&TenancyConfig::default())
    }
}
