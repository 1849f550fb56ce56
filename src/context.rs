use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::ScoreBreakdown;
use crate::ScorableItem;

const NEW_MEMBER_DAYS: i64 = 14;
const RECENT_POST_HOURS: f64 = 24.0;
const INACTIVE_VITALITY: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    NewMember,
    InactiveCreator,
    RecentPost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub kind: BadgeKind,
    pub label: String,
    pub description: String,
    pub admin_only: bool,
}

impl Badge {
    fn new(kind: BadgeKind, label: &str, description: &str, admin_only: bool) -> Self {
        Self {
            kind,
            label: label.to_string(),
            description: description.to_string(),
            admin_only,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationContext {
    pub is_new_member: bool,
    pub is_inactive_creator: bool,
    pub is_recent_post: bool,
    pub badges: Vec<Badge>,
}

impl RecommendationContext {
    pub fn for_item(item: &ScorableItem, breakdown: &ScoreBreakdown, now: DateTime<Utc>) -> Self {
        let mut context = RecommendationContext::default();

        if let Some(joined) = item.author_joined_at {
            if now - joined <= Duration::days(NEW_MEMBER_DAYS) {
                context.is_new_member = true;
                context.badges.push(Badge::new(
                    BadgeKind::NewMember,
                    "New Member",
                    "Joined within the last 2 weeks",
                    false,
                ));
            }
        }

        if breakdown.vitality <= INACTIVE_VITALITY {
            context.is_inactive_creator = true;
            context.badges.push(Badge::new(
                BadgeKind::InactiveCreator,
                "Needs Support",
                "This member hasn't been active recently",
                true,
            ));
        }

        if breakdown.age_hours <= RECENT_POST_HOURS {
            context.is_recent_post = true;
            context.badges.push(Badge::new(
                BadgeKind::RecentPost,
                "Fresh",
                "Posted within the last 24 hours",
                false,
            ));
        }

        context
    }

    pub fn visible_badges(&self, is_admin: bool) -> Vec<Badge> {
        filter_badges(&self.badges, is_admin)
    }
}

pub fn filter_badges(badges: &[Badge], is_admin: bool) -> Vec<Badge> {
    badges
        .iter()
        .filter(|badge| is_admin || !badge.admin_only)
        .cloned()
        .collect()
}
