//! Integration tests that build every sample template in
//! `data/templates/` with and without overrides.

use alertsync_core::{AlertDefinitionRow, ParameterOverrides};
use alertsync_rules::schema::{DURATION_LABEL, THRESHOLD_LABEL};
use alertsync_rules::{build_definition_group, build_rule, decode, encode, Rule};
use uuid::Uuid;

/// Resolve the templates directory relative to the workspace root.
/// Integration tests run from the crate directory, so we go up two levels.
fn templates_dir() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data/templates")
}

fn load_template(filename: &str) -> String {
    let path = templates_dir().join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

const ALL_TEMPLATES: &[&str] = &[
    "cluster-ram-usage.yml",
    "node-disk-pressure.yml",
    "target-down.yml",
];

// ── cluster-ram-usage.yml ───────────────────────────────────

#[test]
fn cluster_ram_usage_defaults() {
    let template = load_template("cluster-ram-usage.yml");
    let rule = build_rule(&template, &ParameterOverrides::default()).unwrap();

    assert_eq!(rule.alert, "ClusterRAMUsageExceedsThreshold");
    assert!(rule.expr.ends_with("* 100 > 90"), "unexpected expr: {}", rule.expr);
    assert_eq!(rule.for_duration, "5m0s");
    assert_eq!(rule.labels["category"], "capacity");
    assert_eq!(rule.labels["context"], "cluster");

    // Ruler-side templating in annotations is left alone.
    assert!(rule.annotations["description"].contains("{{ $value | humanize }}"));
}

#[test]
fn cluster_ram_usage_overrides() {
    let overrides = ParameterOverrides {
        threshold: Some(75),
        duration_secs: Some(900),
        enabled: None,
    };
    let rule = build_rule(&load_template("cluster-ram-usage.yml"), &overrides).unwrap();

    assert!(rule.expr.ends_with("* 100 > 75"));
    assert_eq!(rule.for_duration, "15m0s");
    assert_eq!(rule.labels[THRESHOLD_LABEL], "75");
    assert_eq!(rule.labels[DURATION_LABEL], "15m0s");
}

// ── node-disk-pressure.yml ──────────────────────────────────

#[test]
fn node_disk_pressure_keeps_literal_for() {
    let overrides = ParameterOverrides {
        threshold: Some(95),
        duration_secs: Some(60),
        enabled: None,
    };
    let rule = build_rule(&load_template("node-disk-pressure.yml"), &overrides).unwrap();

    assert!(rule.expr.ends_with("> 95"));
    // Not templated, so the override only shows up in the label.
    assert_eq!(rule.for_duration, "10m");
    assert_eq!(rule.labels[DURATION_LABEL], "1m0s");
}

// ── target-down.yml ─────────────────────────────────────────

#[test]
fn target_down_needs_no_parameters() {
    let template = load_template("target-down.yml");
    let rule = build_rule(&template, &ParameterOverrides::default()).unwrap();
    assert_eq!(rule.expr, "up == 0");
    assert!(rule.for_duration.is_empty());
}

#[test]
fn target_down_disabled() {
    let overrides = ParameterOverrides {
        enabled: Some(false),
        ..Default::default()
    };
    let rule = build_rule(&load_template("target-down.yml"), &overrides).unwrap();
    assert_eq!(rule.expr, "up == 0 and false");
}

// ── Every template: decode, build, round-trip ──────────────

#[test]
fn all_templates_decode() {
    for filename in ALL_TEMPLATES {
        let rule: Rule = decode(&load_template(filename))
            .unwrap_or_else(|e| panic!("Failed to decode {}: {}", filename, e));
        assert!(!rule.alert.is_empty(), "{} has no alert name", filename);
    }
}

#[test]
fn all_built_rules_round_trip() {
    let overrides = ParameterOverrides {
        threshold: Some(50),
        duration_secs: Some(120),
        enabled: Some(false),
    };
    for filename in ALL_TEMPLATES {
        let rule = build_rule(&load_template(filename), &overrides)
            .unwrap_or_else(|e| panic!("Failed to build {}: {}", filename, e));
        let blob = encode(&rule).unwrap();
        assert_eq!(decode(&blob).unwrap(), rule, "Round-trip failed for {}", filename);
    }
}

#[test]
fn end_to_end_definition_group() {
    let id = Uuid::parse_str("01e74407-0327-4e36-93cb-85801c098ba5").unwrap();
    let template = "alert: ClusterRAMUsageExceedsThreshold\nexpr: x > [[.Threshold]]\nfor: 30s";
    let overrides = ParameterOverrides {
        threshold: Some(100),
        ..Default::default()
    };
    let row = AlertDefinitionRow::new(id, "tenant-a", template, 15).with_overrides(overrides);

    let group = build_definition_group(&row).unwrap();
    assert_eq!(group.name, "01e74407-0327-4e36-93cb-85801c098ba5");
    assert_eq!(group.interval, "15s");
    assert_eq!(group.rules.len(), 1);
    assert_eq!(group.rules[0].expr, "x > 100");
    assert_eq!(group.rules[0].for_duration, "30s");
}
