use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub ruler: RulerConfig,
    pub tenancy: TenancyConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ALERTSYNC_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ALERTSYNC_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            ruler: RulerConfig::from_env_profiled(p),
            tenancy: TenancyConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  ruler:    url={}, namespace={}, timeout={}s, tls_insecure={}",
            self.ruler.url,
            self.ruler.namespace,
            self.ruler.timeout_secs,
            self.ruler.tls_insecure
        );
        tracing::info!(
            "  tenancy:  reserved={} -> backend={}",
            self.tenancy.reserved_tenant,
            self.tenancy.backend_tenant
        );
    }
}

// ── Ruler ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulerConfig {
    /// Base URL of the ruler, without trailing slash.
    pub url: String,
    /// Rule namespace all definition groups are stored under.
    pub namespace: String,
    pub timeout_secs: u64,
    /// Skip TLS certificate verification (self-signed dev clusters).
    pub tls_insecure: bool,
}

impl RulerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "RULER_URL", "http://localhost:9009")
                .trim_end_matches('/')
                .to_string(),
            namespace: profiled_env_or(p, "RULER_NAMESPACE", "alertsync"),
            timeout_secs: profiled_env_u64(p, "RULER_TIMEOUT_SECS", 10),
            tls_insecure: profiled_env_bool(p, "RULER_TLS_INSECURE", false),
        }
    }
}

impl Default for RulerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9009".to_string(),
            namespace: "alertsync".to_string(),
            timeout_secs: 10,
            tls_insecure: false,
        }
    }
}

// ── Tenancy ───────────────────────────────────────────────────

/// Internal tenant id that predates multi-tenancy and the backend org id it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenancyConfig {
    pub reserved_tenant: String,
    pub backend_tenant: String,
}

impl TenancyConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            reserved_tenant: profiled_env_or(p, "RULER_RESERVED_TENANT", "system"),
            backend_tenant: profiled_env_or(p, "RULER_BACKEND_TENANT", "fake"),
        }
    }
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            reserved_tenant: "system".to_string(),
            backend_tenant: "fake".to_string(),
        }
    }
}
