pub mod generator;
pub mod reference;

use serde::{Deserialize, Serialize};

pub use generator::{generate, generate_seeded, GeneratorConfig, MetricsGenerator, RatioRange};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub day: String,
    pub engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicShare {
    pub category: String,
    pub percentage: u32,
}

/// Synthetic performance figures for one analysis request.
///
/// Only the counts and `engagement` are random; the suggestions, trend and
/// demographics are the same reference content on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsBundle {
    pub title: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub engagement: f64,
    pub suggestions: Vec<String>,
    pub engagement_trend: Vec<TrendPoint>,
    pub viewer_demographics: Vec<DemographicShare>,
}

impl MetricsBundle {
    /// Likes as a percentage of views.
    pub fn like_ratio(&self) -> f64 {
        if self.views == 0 {
            return 0.0;
        }
        self.likes as f64 / self.views as f64 * 100.0
    }

    pub fn engagement_band(&self) -> EngagementBand {
        EngagementBand::from_engagement(self.engagement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementBand {
    Low,
    Moderate,
    High,
}

impl EngagementBand {
    pub fn from_engagement(engagement: f64) -> Self {
        if engagement > 5.0 {
            EngagementBand::High
        } else if engagement > 2.0 {
            EngagementBand::Moderate
        } else {
            EngagementBand::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EngagementBand::Low => "Low",
            EngagementBand::Moderate => "Moderate",
            EngagementBand::High => "High",
        }
    }
}

/// `(likes + comments + shares) / views * 100`, rounded half away from zero
/// to two decimals.
pub fn engagement_rate(views: u64, likes: u64, comments: u64, shares: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    let total = likes.saturating_add(comments).saturating_add(shares);
    let rate = total as f64 / views as f64 * 100.0;
    round_to(rate, 2)
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
