//! In-process ruler for tests and dry runs.
//!
//! Stores groups per (org id, namespace, name) and answers the same three
//! calls the real config API does. Failures and altered echoes can be
//! injected to exercise the client's error paths.

use std::collections::HashMap;
use std::sync::RwLock;

use alertsync_rules::RuleGroup;
use async_trait::async_trait;
use reqwest::Method;

use crate::client::RULES_API_PATH;
use crate::tenant::SCOPE_ORG_ID_HEADER;
use crate::transport::{RulerRequest, RulerResponse, RulerTransport, TransportError};

type GroupKey = (String, String, String);
type EchoHook = Box<dyn Fn(&mut RuleGroup) + Send + Sync>;

#[derive(Default)]
pub struct InMemoryRuler {
    groups: RwLock<HashMap<GroupKey, RuleGroup>>,
    requests: RwLock<Vec<RulerRequest>>,
    forced: RwLock<HashMap<Method, (u16, String)>>,
    echo: RwLock<Option<EchoHook>>,
}

impl InMemoryRuler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `method` request with `status` and `body` until cleared.
    pub fn force_status(&self, method: Method, status: u16, body: impl Into<String>) {
        self.forced
            .write()
            .expect("forced lock poisoned")
            .insert(method, (status, body.into()));
    }

    pub fn clear_forced(&self) {
        self.forced.write().expect("forced lock poisoned").clear();
    }

    /// Rewrite groups as they are served back on GET. Stored state is untouched.
    pub fn on_echo(&self, hook: impl Fn(&mut RuleGroup) + Send + Sync + 'static) {
        *self.echo.write().expect("echo lock poisoned") = Some(Box::new(hook));
    }

    pub fn group(&self, org_id: &str, namespace: &str, name: &str) -> Option<RuleGroup> {
        self.groups
            .read()
            .expect("groups lock poisoned")
            .get(&key(org_id, namespace, name))
            .cloned()
    }

    pub fn group_count(&self) -> usize {
        self.groups.read().expect("groups lock poisoned").len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<RulerRequest> {
        self.requests.read().expect("requests lock poisoned").clone()
    }

    fn handle(&self, request: &RulerRequest) -> RulerResponse {
        let Some(org_id) = request.header_value(SCOPE_ORG_ID_HEADER) else {
            return RulerResponse::new(401, "no org id");
        };
        let Some(rest) = request.path.strip_prefix(RULES_API_PATH) else {
            return RulerResponse::new(404, "unknown path");
        };
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

        match (&request.method, segments.as_slice()) {
            (m, [namespace]) if *m == Method::POST => {
                let body = request.body.as_deref().unwrap_or_default();
                match RuleGroup::from_yaml(body) {
                    Ok(group) => {
                        self.groups
                            .write()
                            .expect("groups lock poisoned")
                            .insert(key(org_id, namespace, &group.name), group);
                        RulerResponse::new(202, "")
                    }
                    Err(e) => RulerResponse::new(400, e.to_string()),
                }
            }
            (m, [namespace, name]) if *m == Method::GET => {
                let Some(mut group) = self.group(org_id, namespace, name) else {
                    return RulerResponse::new(404, "group does not exist");
                };
                if let Some(hook) = self.echo.read().expect("echo lock poisoned").as_ref() {
                    hook(&mut group);
                }
                match group.to_yaml() {
                    Ok(yaml) => RulerResponse::new(200, yaml),
                    Err(e) => RulerResponse::new(500, e.to_string()),
                }
            }
            (m, [namespace, name]) if *m == Method::DELETE => {
                let removed = self
                    .groups
                    .write()
                    .expect("groups lock poisoned")
                    .remove(&key(org_id, namespace, name));
                match removed {
                    Some(_) => RulerResponse::new(202, ""),
                    None => RulerResponse::new(404, "group does not exist"),
                }
            }
            _ => RulerResponse::new(405, "method not allowed"),
        }
    }
}

fn key(org_id: &str, namespace: &str, name: &str) -> GroupKey {
    (org_id.to_string(), namespace.to_string(), name.to_string())
}

#[async_trait]
impl RulerTransport for InMemoryRuler {
    async fn send(&self, request: RulerRequest) -> Result<RulerResponse, TransportError> {
        self.requests
            .write()
            .expect("requests lock poisoned")
            .push(request.clone());

        let forced = self
            .forced
            .read()
            .expect("forced lock poisoned")
            .get(&request.method)
            .cloned();
        if let Some((status, body)) = forced {
            return Ok(RulerResponse::new(status, body));
        }
        Ok(self.handle(&request))
    }
}
