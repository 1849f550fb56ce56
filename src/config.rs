use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::scoring::{
    DiversityConfig, EngagementWeights, FreshnessConfig, GeoDecayConfig, NegativeSignalConfig,
    QualityConfig, SocialGraphConfig, VitalityConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub enabled: bool,
    pub engagement: EngagementWeights,
    pub freshness: FreshnessConfig,
    pub geo: GeoDecayConfig,
    pub vitality: VitalityConfig,
    pub quality: QualityConfig,
    pub negative_signals: NegativeSignalConfig,
    pub social_graph: SocialGraphConfig,
    pub diversity: DiversityConfig,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engagement: EngagementWeights::default(),
            freshness: FreshnessConfig::default(),
            geo: GeoDecayConfig::default(),
            vitality: VitalityConfig::default(),
            quality: QualityConfig::default(),
            negative_signals: NegativeSignalConfig::default(),
            social_graph: SocialGraphConfig::default(),
            diversity: DiversityConfig::default(),
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = &self.engagement;
        for (field, value) in [
            ("engagement.like_weight", weights.like_weight),
            ("engagement.comment_weight", weights.comment_weight),
            ("engagement.share_weight", weights.share_weight),
            ("engagement.default_score", weights.default_score),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, "must be a non-negative number"));
            }
        }
        if !(weights.like_weight < weights.comment_weight
            && weights.comment_weight < weights.share_weight)
        {
            return Err(ConfigError::invalid(
                "engagement",
                "weights must be ordered like < comment < share",
            ));
        }

        for (field, value) in [
            ("freshness.minimum", self.freshness.minimum),
            ("geo.minimum", self.geo.minimum),
            ("vitality.minimum", self.vitality.minimum),
        ] {
            check_unit_interval(field, value)?;
        }

        if !(self.freshness.half_life_hours > 0.0) {
            return Err(ConfigError::invalid("freshness.half_life_hours", "must be positive"));
        }
        if !(self.freshness.full_hours >= 0.0) {
            return Err(ConfigError::invalid("freshness.full_hours", "must be non-negative"));
        }
        if !(self.geo.decay_interval_km > 0.0) {
            return Err(ConfigError::invalid("geo.decay_interval_km", "must be positive"));
        }
        if !(self.geo.full_radius_km >= 0.0) || !(self.geo.decay_per_interval >= 0.0) {
            return Err(ConfigError::invalid("geo", "radius and decay rate must be non-negative"));
        }
        if !(self.vitality.full_days >= 0.0 && self.vitality.full_days < self.vitality.decay_days) {
            return Err(ConfigError::invalid(
                "vitality",
                "full_days must be non-negative and below decay_days",
            ));
        }

        for (field, value) in [
            ("quality.image_boost", self.quality.image_boost),
            ("quality.link_boost", self.quality.link_boost),
            ("quality.video_boost", self.quality.video_boost),
            ("quality.hashtag_boost", self.quality.hashtag_boost),
            ("quality.mention_boost", self.quality.mention_boost),
            ("negative_signals.hide_penalty", self.negative_signals.hide_penalty),
            ("negative_signals.mute_penalty", self.negative_signals.mute_penalty),
            ("negative_signals.block_penalty", self.negative_signals.block_penalty),
            ("negative_signals.report_penalty_per", self.negative_signals.report_penalty_per),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, "must be a non-negative number"));
            }
        }

        for (field, value) in [
            ("social_graph.max_boost", self.social_graph.max_boost),
            ("social_graph.follower_boost", self.social_graph.follower_boost),
        ] {
            if !value.is_finite() || value < 1.0 {
                return Err(ConfigError::invalid(field, "must be at least 1"));
            }
        }

        check_unit_interval("diversity.penalty", self.diversity.penalty)?;
        if self.diversity.max_consecutive == 0 {
            return Err(ConfigError::invalid("diversity.max_consecutive", "must be at least 1"));
        }
        if self.diversity.type_max_consecutive == 0 {
            return Err(ConfigError::invalid(
                "diversity.type_max_consecutive",
                "must be at least 1",
            ));
        }

        Ok(())
    }

    /// Applies a partial override table key by key on top of this config.
    /// Keys that name no config field are rejected.
    pub fn merged_with(&self, overrides: &toml::Value) -> Result<Self, ConfigError> {
        let mut base = toml::Value::try_from(self)?;
        if let Some(key) = unknown_key(&base, overrides, "") {
            return Err(ConfigError::UnknownKey(key));
        }
        merge_values(&mut base, overrides);
        let merged: RankingConfig = base.try_into()?;
        Ok(merged)
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = toml::to_string_pretty(self)?;
        std::fs::write(path, payload).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_parse::<bool>("FEED_RANK_ENABLED") {
            self.enabled = value;
        }
        if let Some(value) = env_parse::<bool>("FEED_RANK_DIVERSITY_ENABLED") {
            self.diversity.enabled = value;
        }
        if let Some(value) = env_parse::<f64>("FEED_RANK_LIKE_WEIGHT") {
            self.engagement.like_weight = value;
        }
        if let Some(value) = env_parse::<f64>("FEED_RANK_COMMENT_WEIGHT") {
            self.engagement.comment_weight = value;
        }
        if let Some(value) = env_parse::<f64>("FEED_RANK_SHARE_WEIGHT") {
            self.engagement.share_weight = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub defaults: RankingConfig,
    #[serde(default)]
    pub profiles: BTreeMap<String, toml::Value>,
}

impl ConfigFile {
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        Ok(file)
    }

    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let config_path = path.or_else(default_config_path);
        let mut file = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                debug!(path = %path.display(), "loaded ranking config");
                ConfigFile::parse(&contents)?
            }
            Some(path) => {
                warn!(path = %path.display(), "ranking config not found, using defaults");
                ConfigFile::default()
            }
            None => ConfigFile::default(),
        };

        file.defaults.apply_env_overrides();
        Ok((file, config_path))
    }

    pub fn resolve(&self, tenant: Option<&str>) -> Result<RankingConfig, ConfigError> {
        let config = match tenant {
            None => self.defaults.clone(),
            Some(tenant) => {
                let overrides = self
                    .profiles
                    .get(tenant)
                    .ok_or_else(|| ConfigError::UnknownProfile(tenant.to_string()))?;
                self.defaults.merged_with(overrides)?
            }
        };
        config.validate()?;
        Ok(config)
    }
}

fn merge_values(base: &mut toml::Value, overrides: &toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(base), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overrides) => *base = overrides.clone(),
    }
}

fn unknown_key(base: &toml::Value, overrides: &toml::Value, prefix: &str) -> Option<String> {
    let (toml::Value::Table(base), toml::Value::Table(overrides)) = (base, overrides) else {
        return None;
    };

    overrides.iter().find_map(|(key, value)| {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match base.get(key) {
            Some(existing) => unknown_key(existing, value, &path),
            None => Some(path),
        }
    })
}

fn check_unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be in (0, 1]"))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn default_config_path() -> Option<PathBuf> {
    env::var("FEED_RANK_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/feed_rank.toml")))
}
