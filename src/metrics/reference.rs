use crate::metrics::{DemographicShare, TrendPoint};

pub const DEFAULT_TITLE: &str = "Sample Video Analysis";

pub const SUGGESTIONS: [&str; 5] = [
    "Your engagement rate is above average for your category",
    "Consider adding more CTAs (Calls-to-Action) in your video",
    "Your comment section is active - keep engaging with viewers",
    "Video length appears optimal for your audience",
    "Thumbnail performed well with above 5% CTR",
];

const TREND: [(&str, f64); 7] = [
    ("Day 1", 12.5),
    ("Day 2", 18.3),
    ("Day 3", 15.7),
    ("Day 4", 22.1),
    ("Day 5", 19.8),
    ("Day 6", 25.4),
    ("Day 7", 23.9),
];

// Percentages sum to 100.
const DEMOGRAPHICS: [(&str, u32); 5] = [
    ("18-24", 28),
    ("25-34", 35),
    ("35-44", 18),
    ("45-54", 12),
    ("55+", 7),
];

pub fn suggestions() -> Vec<String> {
    SUGGESTIONS.iter().map(|s| s.to_string()).collect()
}

pub fn engagement_trend() -> Vec<TrendPoint> {
    TREND
        .iter()
        .map(|(day, engagement)| TrendPoint {
            day: day.to_string(),
            engagement: *engagement,
        })
        .collect()
}

pub fn viewer_demographics() -> Vec<DemographicShare> {
    DEMOGRAPHICS
        .iter()
        .map(|(category, percentage)| DemographicShare {
            category: category.to_string(),
            percentage: *percentage,
        })
        .collect()
}
