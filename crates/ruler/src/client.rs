//! Tenant-scoped push / verify / delete against the ruler config API.

use std::sync::Arc;

use alertsync_core::Config;
use alertsync_rules::RuleGroup;
use reqwest::Method;
use tracing::{debug, instrument, warn};

use crate::compare::{diff_groups, normalize_group};
use crate::error::SyncError;
use crate::tenant::{TenantMapper, SCOPE_ORG_ID_HEADER};
use crate::transport::{HttpTransport, RulerRequest, RulerResponse, RulerTransport, TransportError};

/// Prefix of the ruler's rule configuration API.
pub const RULES_API_PATH: &str = "/prometheus/config/v1/rules";

/// Client for one rule namespace on one ruler.
///
/// Holds no mutable state and is safe to share across tasks.
#[derive(Clone)]
pub struct RulerClient {
    transport: Arc<dyn RulerTransport>,
    namespace: String,
    tenants: TenantMapper,
}

impl RulerClient {
    pub fn new(
        transport: Arc<dyn RulerTransport>,
        namespace: impl Into<String>,
        tenants: TenantMapper,
    ) -> Self {
        Self {
            transport,
            namespace: namespace.into(),
            tenants,
        }
    }

    /// reqwest transport, namespace and tenant mapping from config.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let transport = HttpTransport::from_config(&config.ruler)?;
        Ok(Self::new(
            Arc::new(transport),
            config.ruler.namespace.clone(),
            TenantMapper::from_config(&config.tenancy),
        ))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn namespace_path(&self) -> String {
        format!("{}/{}", RULES_API_PATH, self.namespace)
    }

    fn group_path(&self, group: &str) -> String {
        format!("{}/{}/{}", RULES_API_PATH, self.namespace, group)
    }

    fn request(&self, method: Method, path: String, tenant: &str) -> RulerRequest {
        RulerRequest::new(method, path).header(SCOPE_ORG_ID_HEADER, self.tenants.org_id(tenant))
    }

    /// Create or replace `group` in the namespace.
    #[instrument(skip_all, fields(group = %group.name, tenant = %tenant))]
    pub async fn push(&self, group: &RuleGroup, tenant: &str) -> Result<(), SyncError> {
        let body = group.to_yaml().map_err(SyncError::Encode)?;
        let request = self.request(Method::POST, self.namespace_path(), tenant).body(body);

        let response = self.transport.send(request).await.map_err(|e| SyncError::PushFailed {
            group: group.name.clone(),
            status: None,
            message: e.to_string(),
        })?;

        if !response.is_success() {
            warn!(status = response.status, body = %response.body, "ruler rejected push");
            return Err(SyncError::PushFailed {
                group: group.name.clone(),
                status: Some(response.status),
                message: response.body,
            });
        }

        debug!(status = response.status, "pushed group");
        Ok(())
    }

    /// Read a group back as the ruler stores it.
    #[instrument(skip_all, fields(group = %name, tenant = %tenant))]
    pub async fn fetch_group(&self, name: &str, tenant: &str) -> Result<RuleGroup, SyncError> {
        let request = self.request(Method::GET, self.group_path(name), tenant);

        let response = self.transport.send(request).await.map_err(|e| SyncError::FetchFailed {
            group: name.to_string(),
            status: None,
            message: e.to_string(),
        })?;

        if !response.is_success() {
            warn!(status = response.status, body = %response.body, "ruler rejected fetch");
            return Err(SyncError::FetchFailed {
                group: name.to_string(),
                status: Some(response.status),
                message: response.body,
            });
        }

        RuleGroup::from_yaml(&response.body).map_err(|e| SyncError::DecodeFailed(e.to_string()))
    }

    /// Fetch `group` back and check it matches what was pushed.
    ///
    /// Both sides are normalized first: an empty or zero `for` means absent,
    /// and durations are compared in canonical form.
    #[instrument(skip_all, fields(group = %group.name, tenant = %tenant))]
    pub async fn verify(&self, group: &RuleGroup, tenant: &str) -> Result<(), SyncError> {
        let fetched = self.fetch_group(&group.name, tenant).await?;

        if fetched.rules.len() != 1 {
            return Err(SyncError::UnexpectedRuleCount {
                group: group.name.clone(),
                count: fetched.rules.len(),
            });
        }

        let expected = normalize_group(group)
            .map_err(|(value, source)| SyncError::InvalidFor { value, source })?;
        let actual = normalize_group(&fetched)
            .map_err(|(value, source)| SyncError::DecodeFailed(format!("{value:?}: {source}")))?;

        let differences = diff_groups(&expected, &actual);
        if !differences.is_empty() {
            warn!(?differences, "fetched group differs from pushed group");
            return Err(SyncError::ReconciliationMismatch {
                group: group.name.clone(),
                expected: Box::new(expected),
                actual: Box::new(actual),
                differences,
            });
        }

        debug!("group verified");
        Ok(())
    }

    /// Remove a group. A group that is already gone counts as removed.
    #[instrument(skip_all, fields(group = %name, tenant = %tenant))]
    pub async fn delete(&self, name: &str, tenant: &str) -> Result<(), SyncError> {
        let request = self.request(Method::DELETE, self.group_path(name), tenant);

        let response = self.transport.send(request).await.map_err(|e| SyncError::DeleteFailed {
            group: name.to_string(),
            status: None,
            message: e.to_string(),
        })?;

        match response {
            RulerResponse { status: 404, .. } => {
                debug!("group already absent");
                Ok(())
            }
            r if r.is_success() => {
                debug!(status = r.status, "deleted group");
                Ok(())
            }
            r => {
                warn!(status = r.status, body = %r.body, "ruler rejected delete");
                Err(SyncError::DeleteFailed {
                    group: name.to_string(),
                    status: Some(r.status),
                    message: r.body,
                })
            }
        }
    }
}

impl std::fmt::Debug for RulerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulerClient")
            .field("namespace", &self.namespace)
            .field("tenants", &self.tenants)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alertsync_rules::Rule;
    use async_trait::async_trait;

    use super::*;

    /// Replays canned responses and records every request.
    struct Scripted {
        responses: Mutex<Vec<Result<RulerResponse, TransportError>>>,
        seen: Mutex<Vec<RulerRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<RulerResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<RulerRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RulerTransport for Scripted {
        async fn send(&self, request: RulerRequest) -> Result<RulerResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(RulerResponse::new(500, "script exhausted")))
        }
    }

    fn client(transport: Arc<Scripted>) -> RulerClient {
        RulerClient::new(transport, "alertsync", TenantMapper::default())
    }

    fn group() -> RuleGroup {
        let mut rule = Rule::new("ClusterRAMUsageExceedsThreshold", "x > 100");
        rule.for_duration = "30s".into();
        RuleGroup::single("01e74407-0327-4e36-93cb-85801c098ba5", "15s", rule)
    }

    fn ok(body: &str) -> Result<RulerResponse, TransportError> {
        Ok(RulerResponse::new(200, body))
    }

    #[tokio::test]
    async fn push_posts_yaml_to_namespace() {
        let transport = Scripted::new(vec![Ok(RulerResponse::new(202, ""))]);
        client(transport.clone()).push(&group(), "tenant-a").await.unwrap();

        let seen = transport.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].path, "/prometheus/config/v1/rules/alertsync");
        assert_eq!(seen[0].header_value(SCOPE_ORG_ID_HEADER), Some("tenant-a"));
        let pushed = RuleGroup::from_yaml(seen[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(pushed, group());
    }

    #[tokio::test]
    async fn push_non_2xx_is_push_failed_with_status() {
        let transport = Scripted::new(vec![Ok(RulerResponse::new(400, "bad group"))]);
        let err = client(transport.clone()).push(&group(), "tenant-a").await.unwrap_err();
        match err {
            SyncError::PushFailed { status, message, .. } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "bad group");
            }
            other => panic!("expected PushFailed, got: {other:?}"),
        }
        // No retries.
        assert_eq!(transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_has_no_status() {
        let transport = Scripted::new(vec![Err(TransportError::Config("unreachable".into()))]);
        let err = client(transport).push(&group(), "tenant-a").await.unwrap_err();
        assert!(matches!(err, SyncError::PushFailed { status: None, .. }));
    }

    #[tokio::test]
    async fn reserved_tenant_is_remapped_in_header() {
        let transport = Scripted::new(vec![ok("")]);
        client(transport.clone()).push(&group(), "system").await.unwrap();
        assert_eq!(transport.seen()[0].header_value(SCOPE_ORG_ID_HEADER), Some("fake"));
    }

    #[tokio::test]
    async fn verify_accepts_equivalent_echo() {
        let echo = concat!(
            "name: 01e74407-0327-4e36-93cb-85801c098ba5\n",
            "interval: 15s\n",
            "rules:\n",
            "  - alert: ClusterRAMUsageExceedsThreshold\n",
            "    expr: x > 100\n",
            "    for: 30s\n",
        );
        let transport = Scripted::new(vec![ok(echo)]);
        client(transport.clone()).verify(&group(), "tenant-a").await.unwrap();

        let seen = transport.seen();
        assert_eq!(seen[0].method, Method::GET);
        assert_eq!(
            seen[0].path,
            "/prometheus/config/v1/rules/alertsync/01e74407-0327-4e36-93cb-85801c098ba5"
        );
    }

    #[tokio::test]
    async fn verify_normalizes_durations() {
        let mut local = group();
        local.interval = "60s".into();
        local.rules[0].for_duration = "0s".into();
        let echo = concat!(
            "name: 01e74407-0327-4e36-93cb-85801c098ba5\n",
            "interval: 1m\n",
            "rules:\n",
            "  - alert: ClusterRAMUsageExceedsThreshold\n",
            "    expr: x > 100\n",
        );
        let transport = Scripted::new(vec![ok(echo)]);
        client(transport).verify(&local, "tenant-a").await.unwrap();
    }

    #[tokio::test]
    async fn verify_reports_mismatch() {
        let echo = concat!(
            "name: 01e74407-0327-4e36-93cb-85801c098ba5\n",
            "interval: 15s\n",
            "rules:\n",
            "  - alert: SomethingElse\n",
            "    expr: x > 100\n",
            "    for: 30s\n",
        );
        let transport = Scripted::new(vec![ok(echo)]);
        let err = client(transport).verify(&group(), "tenant-a").await.unwrap_err();
        match err {
            SyncError::ReconciliationMismatch { expected, actual, differences, .. } => {
                assert_eq!(expected.rules[0].alert, "ClusterRAMUsageExceedsThreshold");
                assert_eq!(actual.rules[0].alert, "SomethingElse");
                assert_eq!(differences.len(), 1);
            }
            other => panic!("expected ReconciliationMismatch, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn verify_rejects_wrong_rule_count() {
        let echo = concat!(
            "name: g\n",
            "rules: []\n",
        );
        let transport = Scripted::new(vec![ok(echo)]);
        let err = client(transport).verify(&group(), "tenant-a").await.unwrap_err();
        assert!(matches!(err, SyncError::UnexpectedRuleCount { count: 0, .. }));
    }

    #[tokio::test]
    async fn verify_malformed_body_is_decode_failed() {
        let transport = Scripted::new(vec![ok("name: [not, a, group")]);
        let err = client(transport).verify(&group(), "tenant-a").await.unwrap_err();
        assert!(matches!(err, SyncError::DecodeFailed(_)));
    }

    #[tokio::test]
    async fn verify_non_2xx_is_fetch_failed() {
        let transport = Scripted::new(vec![Ok(RulerResponse::new(404, "group does not exist"))]);
        let err = client(transport).verify(&group(), "tenant-a").await.unwrap_err();
        assert!(matches!(err, SyncError::FetchFailed { status: Some(404), .. }));
    }

    #[tokio::test]
    async fn delete_treats_404_as_success() {
        let transport = Scripted::new(vec![
            Ok(RulerResponse::new(404, "")),
            Ok(RulerResponse::new(202, "")),
        ]);
        let c = client(transport.clone());
        c.delete("g", "tenant-a").await.unwrap();
        c.delete("g", "tenant-a").await.unwrap();
        assert!(transport.seen().iter().all(|r| r.method == Method::DELETE));
    }

    #[tokio::test]
    async fn delete_other_failure_is_delete_failed() {
        let transport = Scripted::new(vec![Ok(RulerResponse::new(503, "busy"))]);
        let err = client(transport).delete("g", "tenant-a").await.unwrap_err();
        assert!(matches!(err, SyncError::DeleteFailed { status: Some(503), .. }));
    }
}
