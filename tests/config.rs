use marbatch::ConfigError;
use marbatch::config::EngineConfig;
use marbatch::renderer::BatchLimits;

#[test]
fn default_limits_match_hundred_thousand_triangles() {
    let config = EngineConfig::default();
    assert_eq!(config.limits.max_vertices, 300_000);
    assert_eq!(config.limits.max_indices, 300_000);
    assert_eq!(config.limits.max_transforms, 32);
    assert_eq!(config.limits.max_lights, 32);
}

#[test]
fn partial_json_keeps_other_defaults() {
    let config = EngineConfig::from_json_str(r#"{ "limits": { "max_transforms": 8 } }"#).unwrap();
    assert_eq!(config.limits.max_transforms, 8);
    assert_eq!(config.limits.max_vertices, BatchLimits::DEFAULT.max_vertices);
    assert_eq!(config.label_prefix, "scene");
}

#[test]
fn json_round_trip() {
    let mut config = EngineConfig::default();
    config.label_prefix = "level_1".into();
    let json = config.to_json_string().unwrap();
    assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(EngineConfig::from_json_str("{ limits: "), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(EngineConfig::load("does/not/exist.json"), Err(ConfigError::Io(_))));
}
