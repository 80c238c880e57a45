pub mod config;
pub mod link;
pub mod metrics;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use link::{extract_identifier, extract_identifier_with, HostPolicy, Identifier};
pub use metrics::{
    engagement_rate, generate, generate_seeded, DemographicShare, EngagementBand, MetricsBundle,
    MetricsGenerator, TrendPoint,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeError {
    /// No recognized video link form in the input.
    IdentifierNotFound,
}

impl AnalyzeError {
    pub fn user_message(self) -> &'static str {
        match self {
            AnalyzeError::IdentifierNotFound => "Please enter a valid YouTube URL",
        }
    }
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for AnalyzeError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub video_id: Identifier,
    pub metrics: MetricsBundle,
}

/// Extracts the identifier from `input` and generates metrics for it.
pub fn analyze<R: Rng + ?Sized>(
    input: &str,
    policy: HostPolicy,
    generator: &MetricsGenerator,
    rng: &mut R,
) -> Result<Analysis, AnalyzeError> {
    let video_id =
        extract_identifier_with(input, policy).ok_or(AnalyzeError::IdentifierNotFound)?;
    let metrics = generator.generate(&video_id, rng);
    Ok(Analysis { video_id, metrics })
}

/// Card-style count, e.g. `12345` -> `12.3K`.
pub fn format_compact(value: u64) -> String {
    format!("{:.1}K", value as f64 / 1000.0)
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

/// Formats a value that is already a percentage (`2.4` -> `2.40%`).
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
