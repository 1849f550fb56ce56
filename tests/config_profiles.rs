use feed_rank::config::{ConfigFile, RankingConfig};
use feed_rank::error::ConfigError;

const CONFIG: &str = r#"
enabled = true

[engagement]
like_weight = 1
comment_weight = 4
share_weight = 9

[diversity]
max_consecutive = 3

[profiles.riverside.geo]
full_radius_km = 25

[profiles.riverside.diversity]
enabled = false

[profiles.broken.engagement]
like_weight = 10

[profiles.typo.geo]
full_radius = 40
"#;

#[test]
fn default_config_is_valid() {
    let config = RankingConfig::default();

    assert!(config.validate().is_ok());
    assert!((config.engagement.share_weight - 8.0).abs() < 1e-6);
    assert!((config.freshness.half_life_hours - 72.0).abs() < 1e-6);
    assert_eq!(config.diversity.max_consecutive, 2);
}

#[test]
fn partial_file_keeps_unlisted_defaults() {
    let file = ConfigFile::parse(CONFIG).unwrap();
    let config = file.resolve(None).unwrap();

    assert!((config.engagement.comment_weight - 4.0).abs() < 1e-6);
    assert!((config.engagement.default_score - 1.0).abs() < 1e-6);
    assert_eq!(config.diversity.max_consecutive, 3);
    assert!((config.diversity.penalty - 0.5).abs() < 1e-6);
    assert!((config.vitality.minimum - 0.5).abs() < 1e-6);
}

#[test]
fn tenant_profile_merges_over_defaults() {
    let file = ConfigFile::parse(CONFIG).unwrap();
    let config = file.resolve(Some("riverside")).unwrap();

    assert!((config.geo.full_radius_km - 25.0).abs() < 1e-6);
    assert!((config.geo.decay_interval_km - 10.0).abs() < 1e-6);
    assert!(!config.diversity.enabled);
    assert_eq!(config.diversity.max_consecutive, 3);
    assert!((config.engagement.share_weight - 9.0).abs() < 1e-6);
}

#[test]
fn unknown_tenant_is_an_error() {
    let file = ConfigFile::parse(CONFIG).unwrap();
    let err = file.resolve(Some("nowhere")).unwrap_err();

    assert!(matches!(err, ConfigError::UnknownProfile(ref name) if name == "nowhere"));
}

#[test]
fn profile_breaking_weight_order_is_rejected() {
    let file = ConfigFile::parse(CONFIG).unwrap();
    let err = file.resolve(Some("broken")).unwrap_err();

    assert!(matches!(err, ConfigError::Invalid { field: "engagement", .. }));
}

#[test]
fn misspelled_profile_key_is_rejected() {
    let file = ConfigFile::parse(CONFIG).unwrap();
    let err = file.resolve(Some("typo")).unwrap_err();

    assert!(matches!(err, ConfigError::UnknownKey(ref key) if key == "geo.full_radius"));
}

#[test]
fn social_graph_profile_overrides_apply() {
    let overrides: toml::Value = toml::from_str(
        r#"
[social_graph]
max_boost = 3.0
"#,
    )
    .unwrap();

    let config = RankingConfig::default().merged_with(&overrides).unwrap();

    assert!((config.social_graph.max_boost - 3.0).abs() < 1e-6);
    assert!((config.social_graph.follower_boost - 1.5).abs() < 1e-6);
    assert!(config.validate().is_ok());
}

#[test]
fn env_override_is_applied_on_load_and_validated_on_resolve() {
    let dir = std::env::temp_dir().join(format!("feed-rank-env-{}", std::process::id()));
    let path = dir.join("feed_rank.toml");
    RankingConfig::default().write(&path).unwrap();

    std::env::set_var("FEED_RANK_LIKE_WEIGHT", "20");
    let loaded = ConfigFile::load(Some(path));
    std::env::remove_var("FEED_RANK_LIKE_WEIGHT");
    let _ = std::fs::remove_dir_all(dir);

    let (file, _) = loaded.unwrap();
    assert!((file.defaults.engagement.like_weight - 20.0).abs() < 1e-6);
    assert!((file.defaults.engagement.comment_weight - 5.0).abs() < 1e-6);

    let err = file.resolve(None).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "engagement", .. }));
}

#[test]
fn validation_rejects_out_of_range_values() {
    let mut config = RankingConfig::default();
    config.freshness.minimum = 0.0;
    assert!(config.validate().is_err());

    let mut config = RankingConfig::default();
    config.vitality.full_days = 40.0;
    assert!(config.validate().is_err());

    let mut config = RankingConfig::default();
    config.diversity.penalty = 1.5;
    assert!(config.validate().is_err());

    let mut config = RankingConfig::default();
    config.diversity.max_consecutive = 0;
    assert!(config.validate().is_err());

    let mut config = RankingConfig::default();
    config.geo.decay_interval_km = 0.0;
    assert!(config.validate().is_err());

    let mut config = RankingConfig::default();
    config.social_graph.max_boost = 0.5;
    assert!(config.validate().is_err());
}

#[test]
fn malformed_toml_reports_parse_error() {
    let err = ConfigFile::parse("enabled = [").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn written_config_reads_back() {
    let dir = std::env::temp_dir().join(format!("feed-rank-config-{}", std::process::id()));
    let path = dir.join("feed_rank.toml");

    let mut config = RankingConfig::default();
    config.quality.video_boost = 1.6;
    config.write(&path).unwrap();

    let (file, loaded_from) = ConfigFile::load(Some(path.clone())).unwrap();
    assert_eq!(loaded_from, Some(path));
    assert!((file.defaults.quality.video_boost - 1.6).abs() < 1e-6);
    assert!(file.profiles.is_empty());

    let _ = std::fs::remove_dir_all(dir);
}
