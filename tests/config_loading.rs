use std::path::PathBuf;

use video_analyzer::config::{AnalyzerConfig, MAX_VIEWS};
use video_analyzer::HostPolicy;

#[test]
fn defaults_match_reference_ranges() {
    let config = AnalyzerConfig::default();

    assert_eq!(config.generator.title, "Sample Video Analysis");
    assert_eq!(config.generator.views_floor, 10_000);
    assert_eq!(config.generator.views_span, 1_000_000);
    assert!((config.generator.likes.min - 0.02).abs() < 1e-12);
    assert!((config.generator.likes.max - 0.10).abs() < 1e-12);
    assert!((config.generator.comments.min - 0.003).abs() < 1e-12);
    assert!((config.generator.shares.max - 0.011).abs() < 1e-12);
    assert_eq!(config.link.host_policy, HostPolicy::Any);
    assert_eq!(config.server.simulated_latency_ms, 1200);
    assert!(config.validate().is_ok());
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let config = AnalyzerConfig::from_toml(
        r#"
[generator]
views_floor = 50
title = "Launch Day"

[generator.likes]
min = 0.1
max = 0.2

[link]
host_policy = "youtube"
"#,
    )
    .unwrap();

    assert_eq!(config.generator.views_floor, 50);
    assert_eq!(config.generator.views_span, 1_000_000);
    assert_eq!(config.generator.title, "Launch Day");
    assert!((config.generator.likes.max - 0.2).abs() < 1e-12);
    assert!((config.generator.comments.max - 0.023).abs() < 1e-12);
    assert_eq!(config.link.host_policy, HostPolicy::YouTube);
    assert_eq!(config.server.simulated_latency_ms, 1200);
    assert!(config.validate().is_ok());
}

#[test]
fn malformed_toml_is_reported() {
    let err = AnalyzerConfig::from_toml("[generator\nviews_floor = ").unwrap_err();
    assert!(err.starts_with("failed to parse config"));
}

#[test]
fn validation_rejects_bad_ranges() {
    let mut config = AnalyzerConfig::default();
    config.generator.likes.max = 1.5;
    let err = config.validate().unwrap_err();
    assert!(err.contains("generator.likes"));

    let mut config = AnalyzerConfig::default();
    config.generator.shares.min = 0.05;
    config.generator.shares.max = 0.01;
    assert!(config.validate().unwrap_err().contains("generator.shares"));

    let mut config = AnalyzerConfig::default();
    config.generator.views_span = 0;
    assert!(config.validate().unwrap_err().contains("views_span"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let path = PathBuf::from("config/does-not-exist.toml");
    let (config, resolved) = AnalyzerConfig::load(Some(path.clone())).unwrap();

    assert_eq!(resolved, Some(path));
    assert!(config.validate().is_ok());
}

#[test]
fn validation_rejects_view_ranges_past_exact_float() {
    let mut config = AnalyzerConfig::default();
    config.generator.views_floor = 18_446_744_073_709_551_000;
    assert!(config.validate().unwrap_err().contains("views_floor + views_span"));

    let mut config = AnalyzerConfig::default();
    config.generator.views_floor = MAX_VIEWS - 10;
    config.generator.views_span = 11;
    assert!(config.validate().is_err());

    config.generator.views_span = 10;
    assert!(config.validate().is_ok());
}

#[test]
fn huge_floor_from_toml_fails_validation() {
    let config = AnalyzerConfig::from_toml(
        r#"
[generator]
views_floor = 9000000000000000000
"#,
    )
    .unwrap();
    assert!(config.validate().is_err());
}
