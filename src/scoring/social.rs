use serde::{Deserialize, Serialize};

const LOG_STEPS: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialGraphConfig {
    pub enabled: bool,
    pub max_boost: f64,
    pub follower_boost: f64,
}

impl Default for SocialGraphConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_boost: 2.0,
            follower_boost: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SocialGraphScorer {
    config: SocialGraphConfig,
}

impl SocialGraphScorer {
    pub fn new(config: SocialGraphConfig) -> Self {
        Self { config }
    }

    /// 1 interaction gives 1.25, 3 give 1.5, 15 or more reach `max_boost`.
    /// Following the author multiplies in `follower_boost`; the product is
    /// still capped at `max_boost`.
    pub fn boost(&self, interactions: Option<u32>, follows_author: bool) -> f64 {
        if !self.config.enabled {
            return 1.0;
        }

        let mut boost = match interactions {
            Some(count) if count > 0 => {
                let step = (self.config.max_boost - 1.0) / LOG_STEPS;
                1.0 + (f64::from(count) + 1.0).log2() * step
            }
            _ => 1.0,
        };
        if follows_author {
            boost *= self.config.follower_boost;
        }

        boost.min(self.config.max_boost).max(1.0)
    }
}
