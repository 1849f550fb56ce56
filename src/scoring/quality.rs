use serde::{Deserialize, Serialize};

use crate::{ItemType, NegativeSignals};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub enabled: bool,
    pub length_min: usize,
    pub image_boost: f64,
    pub link_boost: f64,
    pub video_boost: f64,
    pub hashtag_boost: f64,
    pub mention_boost: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            length_min: 50,
            image_boost: 1.3,
            link_boost: 1.1,
            video_boost: 1.4,
            hashtag_boost: 1.1,
            mention_boost: 1.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegativeSignalConfig {
    pub enabled: bool,
    pub hide_penalty: f64,
    pub mute_penalty: f64,
    pub block_penalty: f64,
    pub report_penalty_per: f64,
}

impl Default for NegativeSignalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hide_penalty: 0.0,
            mute_penalty: 0.1,
            block_penalty: 0.0,
            report_penalty_per: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenalizedScore {
    pub score: f64,
    pub penalty: f64,
}

#[derive(Debug, Clone)]
pub struct QualityAndSignalAdjuster {
    quality: QualityConfig,
    signals: NegativeSignalConfig,
}

impl QualityAndSignalAdjuster {
    pub fn new(quality: QualityConfig, signals: NegativeSignalConfig) -> Self {
        Self { quality, signals }
    }

    pub fn quality_boost(&self, item_type: &ItemType, content_length: usize) -> f64 {
        if !self.quality.enabled || content_length < self.quality.length_min {
            return 1.0;
        }

        match item_type {
            ItemType::VideoPost => self.quality.video_boost,
            ItemType::ImagePost => self.quality.image_boost,
            ItemType::LinkPost => self.quality.link_boost,
            _ => 1.0,
        }
    }

    /// Hashtags and mentions count regardless of `length_min`.
    pub fn markup_boost(&self, has_hashtag: bool, has_mention: bool) -> f64 {
        if !self.quality.enabled {
            return 1.0;
        }

        let mut boost = 1.0;
        if has_hashtag {
            boost *= self.quality.hashtag_boost;
        }
        if has_mention {
            boost *= self.quality.mention_boost;
        }
        boost
    }

    pub fn penalty(&self, signals: &NegativeSignals) -> f64 {
        if !self.signals.enabled {
            return 0.0;
        }

        let mut penalty = 0.0;

        penalty += f64::from(signals.hides) * self.signals.hide_penalty;
        penalty += f64::from(signals.mutes) * self.signals.mute_penalty;
        penalty += f64::from(signals.blocks) * self.signals.block_penalty;
        penalty += f64::from(signals.reports) * self.signals.report_penalty_per;

        penalty
    }

    pub fn apply_penalty(&self, score: f64, signals: &NegativeSignals) -> PenalizedScore {
        let penalty = self.penalty(signals);
        let retained = (1.0 - penalty).max(0.0);
        PenalizedScore {
            score: (score * retained).max(0.0),
            penalty,
        }
    }
}
