//! Single alerting rule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label key overwritten with the threshold override.
pub const THRESHOLD_LABEL: &str = "threshold";
/// Label key overwritten with the rendered duration override.
pub const DURATION_LABEL: &str = "duration";

/// An alerting rule as stored in a definition template and sent to the ruler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub alert: String,
    pub expr: String,
    /// Firing duration. Empty means "fire immediately" and is omitted on the wire.
    #[serde(rename = "for", default, skip_serializing_if = "String::is_empty")]
    pub for_duration: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Rule {
    pub fn new(alert: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            alert: alert.into(),
            expr: expr.into(),
            for_duration: String::new(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
