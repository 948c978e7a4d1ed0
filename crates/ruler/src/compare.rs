//! Normalization and field-by-field comparison of rule groups.
//!
//! The ruler may echo a group back with a different but equivalent duration
//! spelling (`5m` for `5m0s`) or with a zero `for` dropped entirely. Both
//! sides are normalized before comparing so only real differences surface.

use std::collections::BTreeMap;

use alertsync_rules::duration::{format_duration, parse_duration, DurationError};
use alertsync_rules::{Rule, RuleGroup};

/// Canonical duration where empty and zero both mean "absent".
///
/// Applies to `for` and to the group interval: the ruler drops either
/// field when it is zero.
pub fn normalize_duration(value: &str) -> Result<String, DurationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    let parsed = parse_duration(trimmed)?;
    if parsed.is_zero() {
        return Ok(String::new());
    }
    Ok(format_duration(parsed))
}

/// Copy of `group` with interval and every `for` in canonical form.
///
/// On failure returns the offending value alongside the parse error.
pub fn normalize_group(group: &RuleGroup) -> Result<RuleGroup, (String, DurationError)> {
    let mut normalized = group.clone();
    normalized.interval =
        normalize_duration(&group.interval).map_err(|e| (group.interval.clone(), e))?;
    for rule in &mut normalized.rules {
        rule.for_duration =
            normalize_duration(&rule.for_duration).map_err(|e| (rule.for_duration.clone(), e))?;
    }
    Ok(normalized)
}

/// Differences between two groups as human-readable field paths.
///
/// Empty when the groups are equal. Label and annotation maps are compared
/// key by key, so ordering never matters.
pub fn diff_groups(expected: &RuleGroup, actual: &RuleGroup) -> Vec<String> {
    let mut out = Vec::new();

    if expected.name != actual.name {
        out.push(changed("name", &expected.name, &actual.name));
    }
    if expected.interval != actual.interval {
        out.push(changed("interval", &expected.interval, &actual.interval));
    }
    if expected.rules.len() != actual.rules.len() {
        out.push(format!(
            "rules: expected {} rule(s), got {}",
            expected.rules.len(),
            actual.rules.len()
        ));
    }

    for (i, (e, a)) in expected.rules.iter().zip(&actual.rules).enumerate() {
        diff_rule(&format!("rules[{i}]"), e, a, &mut out);
    }
    out
}

pub fn groups_match(expected: &RuleGroup, actual: &RuleGroup) -> bool {
    diff_groups(expected, actual).is_empty()
}

fn diff_rule(prefix: &str, expected: &Rule, actual: &Rule, out: &mut Vec<String>) {
    if expected.alert != actual.alert {
        out.push(changed(&format!("{prefix}.alert"), &expected.alert, &actual.alert));
    }
    if expected.expr != actual.expr {
        out.push(changed(&format!("{prefix}.expr"), &expected.expr, &actual.expr));
    }
    if expected.for_duration != actual.for_duration {
        out.push(changed(
            &format!("{prefix}.for"),
            &expected.for_duration,
            &actual.for_duration,
        ));
    }
    diff_map(&format!("{prefix}.labels"), &expected.labels, &actual.labels, out);
    diff_map(
        &format!("{prefix}.annotations"),
        &expected.annotations,
        &actual.annotations,
        out,
    );
}

fn diff_map(
    prefix: &str,
    expected: &BTreeMap<String, String>,
    actual: &BTreeMap<String, String>,
    out: &mut Vec<String>,
) {
    for (key, want) in expected {
        match actual.get(key) {
            Some(got) if got == want => {}
            Some(got) => out.push(changed(&format!("{prefix}.{key}"), want, got)),
            None => out.push(format!("{prefix}.{key}: missing (expected {want:?})")),
        }
    }
    for (key, got) in actual {
        if !expected.contains_key(key) {
            out.push(format!("{prefix}.{key}: unexpected {got:?}"));
        }
    }
}

fn changed(path: &str, expected: &str, actual: &str) -> String {
    format!("{path}: expected {expected:?}, got {actual:?}")
}
