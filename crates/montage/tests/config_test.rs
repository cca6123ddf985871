//! Tests for layered configuration loading.

use montage::{ChainFailureMode, MontageConfig, Transition};
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_file_overrides_bundled_defaults() {
    let file = write_config(
        r#"
[dispatch]
max_concurrency = 2
preferred_backend = "veo"
fallback_backends = ["kling", "runway"]
shared_seed = 42

[imaging]
start_frames = true
on_chain_failure = "abort"

[assembly]
known_brands = ["Ember"]
default_transition = "fade_to_black"

[backends.veo]
rpm = 10
max_concurrent = 2
"#,
    );

    let config = MontageConfig::from_file(file.path()).unwrap();

    assert_eq!(*config.dispatch.max_concurrency(), 2);
    assert_eq!(config.dispatch.preferred_backend().as_deref(), Some("veo"));
    assert_eq!(config.dispatch.fallback_backends(), &vec!["kling".to_string(), "runway".to_string()]);
    assert_eq!(*config.dispatch.shared_seed(), Some(42));
    assert!(*config.imaging.start_frames());
    assert!(*config.imaging.reference_chain());
    assert_eq!(*config.imaging.on_chain_failure(), ChainFailureMode::Abort);
    assert_eq!(config.assembly.known_brands(), &vec!["Ember".to_string()]);
    assert_eq!(*config.assembly.default_transition(), Transition::FadeToBlack);

    let veo = config.limits_for("veo");
    assert_eq!(veo.rpm, Some(10));
    assert_eq!(veo.max_concurrent, Some(2));
    assert_eq!(config.limits_for("kling").rpm, None);

    // Untouched sections keep the bundled values
    assert_eq!(*config.storyboard.max_clip_seconds(), 8);
    assert_eq!(*config.retry.max_attempts(), 3);
    assert!(*config.cache.enabled());
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MontageConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Configuration Error"));
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = write_config("[dispatch\nmax_concurrency = ");
    let err = MontageConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Configuration Error"));
}

#[test]
fn test_wrong_type_is_config_error() {
    let file = write_config("[retry]\nmax_attempts = \"many\"\n");
    let err = MontageConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse configuration"));
}

#[test]
fn test_inverted_duration_range_is_rejected() {
    let err = MontageConfig::from_toml_str(
        "[storyboard]\nmin_target_duration = 40\nmax_target_duration = 20\n",
    )
    .unwrap_err();
    assert!(err.to_string().contains("min_target_duration"));
}
