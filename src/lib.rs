pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod geo;
pub mod scoring;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RankingConfig;
use crate::geo::GeoPoint;
use crate::scoring::RankingPipeline;

/// Unknown labels are kept verbatim in [`ItemType::Other`] so they still take
/// part in content-type diversity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemType {
    Post,
    ImagePost,
    VideoPost,
    LinkPost,
    Listing,
    Event,
    Group,
    Other(String),
}

impl ItemType {
    pub fn from_label(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "" | "post" | "text" | "text_post" => ItemType::Post,
            "image_post" | "image" | "photo" | "photo_post" => ItemType::ImagePost,
            "video_post" | "video" | "vid" => ItemType::VideoPost,
            "link_post" | "link" | "url" => ItemType::LinkPost,
            "listing" | "offer" | "request" => ItemType::Listing,
            "event" => ItemType::Event,
            "group" => ItemType::Group,
            other => ItemType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ItemType::Post => "post",
            ItemType::ImagePost => "image_post",
            ItemType::VideoPost => "video_post",
            ItemType::LinkPost => "link_post",
            ItemType::Listing => "listing",
            ItemType::Event => "event",
            ItemType::Group => "group",
            ItemType::Other(label) => label,
        }
    }
}

impl From<String> for ItemType {
    fn from(value: String) -> Self {
        ItemType::from_label(&value)
    }
}

impl From<ItemType> for String {
    fn from(value: ItemType) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub likes: u32,
    pub comments: u32,
    pub shares: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeSignals {
    pub hides: u32,
    pub mutes: u32,
    pub blocks: u32,
    pub reports: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorableItem {
    pub id: String,
    pub author_id: String,
    pub item_type: ItemType,
    pub created_at: DateTime<Utc>,
    pub poster_last_active_at: Option<DateTime<Utc>>,
    pub distance_km: Option<f64>,
    pub origin: Option<GeoPoint>,
    pub author_joined_at: Option<DateTime<Utc>>,
    pub engagement: EngagementCounts,
    pub negative_signals: NegativeSignals,
    pub content_length: usize,
    #[serde(default)]
    pub has_hashtag: bool,
    #[serde(default)]
    pub has_mention: bool,
    pub viewer_interactions: Option<u32>,
    #[serde(default)]
    pub viewer_follows_author: bool,
}

impl ScorableItem {
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        item_type: ItemType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            item_type,
            created_at,
            poster_last_active_at: Some(created_at),
            distance_km: None,
            origin: None,
            author_joined_at: None,
            engagement: EngagementCounts::default(),
            negative_signals: NegativeSignals::default(),
            content_length: 0,
            has_hashtag: false,
            has_mention: false,
            viewer_interactions: None,
            viewer_follows_author: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ViewerContext {
    pub viewer_location: Option<GeoPoint>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    pub item_id: String,
    pub composite_score: f64,
    pub rank: usize,
    pub signal_penalty: f64,
}

pub fn rank(items: &[ScorableItem], viewer: &ViewerContext) -> Vec<RankingResult> {
    RankingPipeline::new(RankingConfig::default()).rank_at(items, viewer, Utc::now())
}

pub fn format_score(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}
