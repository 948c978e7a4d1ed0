//! Rule group container.

use serde::{Deserialize, Serialize};

use super::Rule;

/// A named, interval-tagged group of rules.
///
/// The wire format admits any number of rules; groups built by this crate
/// always hold exactly one (see [`RuleGroup::single`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interval: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleGroup {
    /// Group holding exactly one rule.
    pub fn single(name: impl Into<String>, interval: impl Into<String>, rule: Rule) -> Self {
        Self {
            name: name.into(),
            interval: interval.into(),
            rules: vec![rule],
        }
    }

    /// The group's rule, if it has exactly one.
    pub fn sole_rule(&self) -> Option<&Rule> {
        match self.rules.as_slice() {
            [rule] => Some(rule),
            _ => None,
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
