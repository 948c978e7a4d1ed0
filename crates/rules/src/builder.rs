//! Stored template + overrides → rule → single-rule group.
//!
//! Everything here is pure: the same row and overrides always produce the
//! same group, and nothing is cached between calls.

use alertsync_core::{AlertDefinitionRow, ParameterOverrides};
use tracing::debug;
use uuid::Uuid;

use crate::duration::{canonicalize, format_seconds, parse_duration};
use crate::error::{Result, RuleError};
use crate::expression::{self, TemplateData};
use crate::schema::{Rule, RuleGroup, DURATION_LABEL, THRESHOLD_LABEL};

/// Decode a stored template blob into a draft rule.
pub fn decode(blob: &str) -> Result<Rule> {
    Rule::from_yaml(blob).map_err(RuleError::TemplateDecode)
}

/// Encode a rule into the stored template format.
pub fn encode(rule: &Rule) -> Result<String> {
    rule.to_yaml().map_err(RuleError::Encode)
}

/// Build the final rule for a template with the given overrides applied.
///
/// Overrides are written into the `threshold` / `duration` labels first and
/// the expression is then rendered from those labels, so labels and
/// expression can never disagree. A disabled definition gets
/// [`expression::DISABLED_CLAUSE`] appended after validation.
pub fn build_rule(template: &str, overrides: &ParameterOverrides) -> Result<Rule> {
    let mut rule = decode(template)?;

    if let Some(threshold) = overrides.threshold {
        rule.labels.insert(THRESHOLD_LABEL.to_string(), threshold.to_string());
    }
    if let Some(secs) = overrides.duration_secs {
        rule.labels.insert(DURATION_LABEL.to_string(), format_seconds(secs));
    }

    let data = TemplateData {
        threshold: rule.labels.get(THRESHOLD_LABEL).cloned(),
        duration: rule.labels.get(DURATION_LABEL).cloned(),
    };

    let expr = expression::render(&data, &rule.expr)?;
    rule.expr = if overrides.is_disabled() {
        expression::disable(&expr)
    } else {
        expr
    };

    rule.for_duration = resolve_for(&data, &rule.for_duration)?;

    debug!(alert = %rule.alert, expr = %rule.expr, "built rule");
    Ok(rule)
}

/// Templated `for` values are substituted and canonicalized; literal values
/// are kept verbatim but must parse.
fn resolve_for(data: &TemplateData, value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Ok(String::new());
    }
    if expression::has_placeholders(value) {
        let rendered = expression::substitute(data, value)?;
        return canonicalize(&rendered).map_err(|source| RuleError::InvalidFor {
            value: rendered,
            source,
        });
    }
    parse_duration(value).map_err(|source| RuleError::InvalidFor {
        value: value.to_string(),
        source,
    })?;
    Ok(value.to_string())
}

/// Wrap one rule into the group the ruler addresses by definition id.
///
/// The name is the id's lowercase hyphenated form, so it stays stable when
/// only the overrides change.
pub fn build_group(definition_id: Uuid, interval_secs: u64, rule: Rule) -> RuleGroup {
    RuleGroup::single(definition_id.to_string(), format_seconds(interval_secs), rule)
}

/// [`build_rule`] then [`build_group`] for a full definition row.
pub fn build_definition_group(row: &AlertDefinitionRow) -> Result<RuleGroup> {
    let rule = build_rule(&row.template, &row.overrides)?;
    Ok(build_group(row.id, row.interval_secs, rule))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION_ID: &str = "01e74407-0327-4e36-93cb-85801c098ba5";

    const RAM_TEMPLATE: &str =
        "alert: ClusterRAMUsageExceedsThreshold\nexpr: x > [[.Threshold]]\nfor: 30s";

    const LABELLED_TEMPLATE: &str = r#"
alert: HighErrorRate
expr: sum(rate(errors_total[5m])) > [[ .Threshold ]]
for: "[[ .Duration ]]"
labels:
  category: reliability
  threshold: "5"
  duration: "10m0s"
annotations:
  description: "error rate is {{ $value }}"
"#;

    fn id() -> Uuid {
        Uuid::parse_str(DEFINITION_ID).unwrap()
    }

    fn threshold(value: i64) -> ParameterOverrides {
        ParameterOverrides {
            threshold: Some(value),
            ..Default::default()
        }
    }

    #[test]
    fn threshold_override_sets_label_and_expr() {
        let rule = build_rule(RAM_TEMPLATE, &threshold(100)).unwrap();
        assert_eq!(rule.alert, "ClusterRAMUsageExceedsThreshold");
        assert_eq!(rule.expr, "x > 100");
        assert_eq!(rule.for_duration, "30s");
        assert_eq!(rule.labels[THRESHOLD_LABEL], "100");
        assert!(!rule.labels.contains_key(DURATION_LABEL));
    }

    #[test]
    fn template_labels_apply_without_overrides() {
        let rule = build_rule(LABELLED_TEMPLATE, &ParameterOverrides::default()).unwrap();
        assert_eq!(rule.expr, "sum(rate(errors_total[5m])) > 5");
        assert_eq!(rule.for_duration, "10m0s");
        assert_eq!(rule.annotations["description"], "error rate is {{ $value }}");
    }

    #[test]
    fn duration_override_renders_canonically_everywhere() {
        let overrides = ParameterOverrides {
            threshold: Some(7),
            duration_secs: Some(9900),
            enabled: None,
        };
        let rule = build_rule(LABELLED_TEMPLATE, &overrides).unwrap();
        assert_eq!(rule.labels[DURATION_LABEL], "2h45m0s");
        assert_eq!(rule.for_duration, "2h45m0s");
        assert_eq!(rule.expr, "sum(rate(errors_total[5m])) > 7");
    }

    #[test]
    fn negative_threshold_renders_as_decimal() {
        let rule = build_rule(RAM_TEMPLATE, &threshold(-3)).unwrap();
        assert_eq!(rule.labels[THRESHOLD_LABEL], "-3");
        assert_eq!(rule.expr, "x > -3");
    }

    #[test]
    fn disabled_definition_appends_false_clause() {
        let enabled = build_rule(RAM_TEMPLATE, &threshold(100)).unwrap();
        let overrides = ParameterOverrides {
            enabled: Some(false),
            ..threshold(100)
        };
        let disabled = build_rule(RAM_TEMPLATE, &overrides).unwrap();
        assert_eq!(disabled.expr, format!("{} and false", enabled.expr));
    }

    #[test]
    fn explicitly_enabled_is_untouched() {
        let overrides = ParameterOverrides {
            enabled: Some(true),
            ..threshold(100)
        };
        assert_eq!(build_rule(RAM_TEMPLATE, &overrides).unwrap().expr, "x > 100");
    }

    #[test]
    fn missing_threshold_is_undefined_field() {
        let err = build_rule(RAM_TEMPLATE, &ParameterOverrides::default()).unwrap_err();
        assert!(matches!(
            err,
            RuleError::Expression(expression::ExpressionError::UndefinedField { .. })
        ));
    }

    #[test]
    fn invalid_expression_propagates() {
        let template = "alert: A\nexpr: x ==>= [[ .Threshold ]]\n";
        let err = build_rule(template, &threshold(1)).unwrap_err();
        assert!(matches!(
            err,
            RuleError::Expression(expression::ExpressionError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn malformed_template_is_decode_error() {
        let err = build_rule("alert: [unterminated", &threshold(1)).unwrap_err();
        assert!(matches!(err, RuleError::TemplateDecode(_)));
    }

    #[test]
    fn unparsable_for_is_rejected() {
        let template = "alert: A\nexpr: up == 0\nfor: soon\n";
        let err = build_rule(template, &ParameterOverrides::default()).unwrap_err();
        match err {
            RuleError::InvalidFor { value, .. } => assert_eq!(value, "soon"),
            other => panic!("expected InvalidFor, got: {other:?}"),
        }
    }

    #[test]
    fn build_rule_is_deterministic() {
        let overrides = ParameterOverrides {
            threshold: Some(42),
            duration_secs: Some(90),
            enabled: Some(false),
        };
        let first = build_rule(LABELLED_TEMPLATE, &overrides).unwrap();
        for _ in 0..5 {
            assert_eq!(build_rule(LABELLED_TEMPLATE, &overrides).unwrap(), first);
        }
    }

    #[test]
    fn built_rules_round_trip_through_codec() {
        let overrides = ParameterOverrides {
            threshold: Some(42),
            duration_secs: Some(60),
            enabled: Some(false),
        };
        for template in [RAM_TEMPLATE, LABELLED_TEMPLATE] {
            let rule = build_rule(template, &overrides).unwrap();
            assert_eq!(decode(&encode(&rule).unwrap()).unwrap(), rule);
        }
    }

    #[test]
    fn group_is_named_by_definition_id() {
        let rule = build_rule(RAM_TEMPLATE, &threshold(100)).unwrap();
        let group = build_group(id(), 15, rule.clone());
        assert_eq!(group.name, DEFINITION_ID);
        assert_eq!(group.interval, "15s");
        assert_eq!(group.rules, vec![rule]);
    }

    #[test]
    fn group_name_ignores_overrides_and_interval_is_canonical() {
        let a = build_group(id(), 60, build_rule(RAM_TEMPLATE, &threshold(1)).unwrap());
        let b = build_group(id(), 90, build_rule(RAM_TEMPLATE, &threshold(2)).unwrap());
        assert_eq!(a.name, b.name);
        assert_eq!(a.interval, "1m0s");
        assert_eq!(b.interval, "1m30s");
    }

    #[test]
    fn definition_row_builds_full_group() {
        let row = AlertDefinitionRow::new(id(), "tenant-a", RAM_TEMPLATE, 15)
            .with_overrides(threshold(100));
        let group = build_definition_group(&row).unwrap();
        assert_eq!(group.name, DEFINITION_ID);
        assert_eq!(group.sole_rule().unwrap().expr, "x > 100");
    }
}
