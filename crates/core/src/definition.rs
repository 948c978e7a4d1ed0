//! Alert definition rows as seen by the reconciliation pipeline.
//!
//! Rows are owned by the relational store; this crate only models the
//! read-only snapshot handed to a single sync call and the
//! [`DefinitionReader`] seam used to fetch it.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Tenant-tunable values layered onto a catalog template at render time.
///
/// Every field is optional: `None` means "keep whatever the template says".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterOverrides {
    pub threshold: Option<i64>,
    pub duration_secs: Option<u64>,
    pub enabled: Option<bool>,
}

impl ParameterOverrides {
    /// Only an explicit `enabled: false` disables a definition.
    pub fn is_disabled(&self) -> bool {
        self.enabled == Some(false)
    }
}

/// Snapshot of one alert definition row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDefinitionRow {
    pub id: Uuid,
    pub tenant: String,
    /// Stored YAML rule template with `[[ .Field ]]` placeholders.
    pub template: String,
    pub interval_secs: u64,
    #[serde(default)]
    pub overrides: ParameterOverrides,
}

impl AlertDefinitionRow {
    pub fn new(
        id: Uuid,
        tenant: impl Into<String>,
        template: impl Into<String>,
        interval_secs: u64,
    ) -> Self {
        Self {
            id,
            tenant: tenant.into(),
            template: template.into(),
            interval_secs,
            overrides: ParameterOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: ParameterOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Reject rows that cannot be addressed at the ruler.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.tenant.trim().is_empty() {
            return Err(CoreError::InvalidDefinition {
                id: self.id,
                reason: "tenant must not be empty".to_string(),
            });
        }
        if self.template.trim().is_empty() {
            return Err(CoreError::InvalidDefinition {
                id: self.id,
                reason: "template must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Read access to definition rows, keyed by tenant and definition id.
#[async_trait]
pub trait DefinitionReader: Send + Sync {
    /// Fetch the current row, or `None` if the definition no longer exists.
    async fn definition(
        &self,
        tenant: &str,
        id: Uuid,
    ) -> Result<Option<AlertDefinitionRow>, CoreError>;
}

/// In-process [`DefinitionReader`] backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryDefinitions {
    rows: RwLock<HashMap<(String, Uuid), AlertDefinitionRow>>,
}

impl InMemoryDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a row, returning the previous one.
    pub fn upsert(&self, row: AlertDefinitionRow) -> Option<AlertDefinitionRow> {
        self.rows
            .write()
            .expect("definitions lock poisoned")
            .insert((row.tenant.clone(), row.id), row)
    }

    pub fn remove(&self, tenant: &str, id: Uuid) -> Option<AlertDefinitionRow> {
        self.rows
            .write()
            .expect("definitions lock poisoned")
            .remove(&(tenant.to_string(), id))
    }

    pub fn len(&self) -> usize {
        self.rows.read().expect("definitions lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DefinitionReader for InMemoryDefinitions {
    async fn definition(
        &self,
        tenant: &str,
        id: Uuid,
    ) -> Result<Option<AlertDefinitionRow>, CoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| CoreError::Storage("definitions lock poisoned".to_string()))?;
        Ok(rows.get(&(tenant.to_string(), id)).cloned())
    }
}
