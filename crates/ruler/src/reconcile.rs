//! Build → push → verify for one alert definition.

use alertsync_core::{AlertDefinitionRow, Config, DefinitionReader};
use alertsync_rules::{build_definition_group, RuleGroup};
use tokio::time::{timeout_at, Instant};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::client::RulerClient;
use crate::error::SyncError;
use crate::transport::TransportError;

/// What [`Reconciler::sync_definition`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Group pushed and verified.
    Updated(RuleGroup),
    /// Definition is gone; its group was removed.
    Removed { group: String },
}

/// Keeps the ruler's copy of each definition in line with the stored row.
///
/// Stateless apart from the client; callers must not sync the same
/// definition from two tasks at once.
#[derive(Debug, Clone)]
pub struct Reconciler {
    client: RulerClient,
}

impl Reconciler {
    pub fn new(client: RulerClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Ok(Self::new(RulerClient::from_config(config)?))
    }

    pub fn client(&self) -> &RulerClient {
        &self.client
    }

    /// Render the group for `row` without touching the ruler.
    pub fn build_group(&self, row: &AlertDefinitionRow) -> Result<RuleGroup, SyncError> {
        row.validate()?;
        Ok(build_definition_group(row)?)
    }

    /// Build the definition's group, push it, then read it back and compare.
    ///
    /// Stops at the first failure and returns it unchanged. Nothing is retried.
    #[instrument(skip_all, fields(definition_id = %row.id, tenant = %row.tenant))]
    pub async fn update_definition_config(
        &self,
        row: &AlertDefinitionRow,
    ) -> Result<RuleGroup, SyncError> {
        let group = self.build_group(row)?;
        self.client.push(&group, &row.tenant).await?;
        self.client.verify(&group, &row.tenant).await?;
        info!(group = %group.name, "definition synced");
        Ok(group)
    }

    /// [`update_definition_config`](Self::update_definition_config) bounded by
    /// `deadline`. On expiry the in-flight request is dropped.
    pub async fn update_definition_config_by(
        &self,
        row: &AlertDefinitionRow,
        deadline: Instant,
    ) -> Result<RuleGroup, SyncError> {
        match timeout_at(deadline, self.update_definition_config(row)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::DeadlineExceeded {
                group: row.id.to_string(),
            }),
        }
    }

    /// Delete the definition's group. Succeeds if it is already gone.
    #[instrument(skip_all, fields(definition_id = %id, tenant = %tenant))]
    pub async fn remove_definition_config(&self, id: Uuid, tenant: &str) -> Result<(), SyncError> {
        let group = id.to_string();
        self.client.delete(&group, tenant).await?;
        info!(%group, "definition removed");
        Ok(())
    }

    /// [`remove_definition_config`](Self::remove_definition_config) bounded by
    /// `deadline`.
    pub async fn remove_definition_config_by(
        &self,
        id: Uuid,
        tenant: &str,
        deadline: Instant,
    ) -> Result<(), SyncError> {
        match timeout_at(deadline, self.remove_definition_config(id, tenant)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::DeadlineExceeded {
                group: id.to_string(),
            }),
        }
    }

    /// Look the definition up and update or remove its group accordingly.
    pub async fn sync_definition(
        &self,
        reader: &dyn DefinitionReader,
        tenant: &str,
        id: Uuid,
    ) -> Result<SyncOutcome, SyncError> {
        match reader.definition(tenant, id).await? {
            Some(row) => Ok(SyncOutcome::Updated(self.update_definition_config(&row).await?)),
            None => {
                self.remove_definition_config(id, tenant).await?;
                Ok(SyncOutcome::Removed { group: id.to_string() })
            }
        }
    }
}
