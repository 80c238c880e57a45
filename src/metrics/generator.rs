use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::link::Identifier;
use crate::metrics::{engagement_rate, reference, MetricsBundle};

/// Half-open `[min, max)` fraction of views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioRange {
    pub min: f64,
    pub max: f64,
}

impl RatioRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.min + rng.gen::<f64>() * (self.max - self.min)
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min >= 0.0
            && self.min <= self.max
            && self.max < 1.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub title: String,
    pub views_floor: u64,
    pub views_span: u64,
    pub likes: RatioRange,
    pub comments: RatioRange,
    pub shares: RatioRange,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            title: reference::DEFAULT_TITLE.to_string(),
            views_floor: 10_000,
            views_span: 1_000_000,
            likes: RatioRange::new(0.02, 0.10),
            comments: RatioRange::new(0.003, 0.023),
            shares: RatioRange::new(0.001, 0.011),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsGenerator {
    config: GeneratorConfig,
}

impl Default for MetricsGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl MetricsGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.clone())
    }

    /// Draws a fresh bundle. The identifier is only logged; it has no effect
    /// on the numbers.
    pub fn generate<R: Rng + ?Sized>(&self, id: &Identifier, rng: &mut R) -> MetricsBundle {
        let span = self.config.views_span.max(1);
        let views = self
            .config
            .views_floor
            .max(1)
            .saturating_add(rng.gen_range(0..span));
        let likes = scale(views, self.config.likes.sample(rng));
        let comments = scale(views, self.config.comments.sample(rng));
        let shares = scale(views, self.config.shares.sample(rng));
        let engagement = engagement_rate(views, likes, comments, shares);

        debug!(video_id = %id, views, likes, comments, shares, engagement, "generated metrics");

        MetricsBundle {
            title: self.config.title.clone(),
            views,
            likes,
            comments,
            shares,
            engagement,
            suggestions: reference::suggestions(),
            engagement_trend: reference::engagement_trend(),
            viewer_demographics: reference::viewer_demographics(),
        }
    }
}

pub fn generate<R: Rng + ?Sized>(id: &Identifier, rng: &mut R) -> MetricsBundle {
    MetricsGenerator::default().generate(id, rng)
}

pub fn generate_seeded(id: &Identifier, seed: u64) -> MetricsBundle {
    let mut rng = StdRng::seed_from_u64(seed);
    generate(id, &mut rng)
}

fn scale(views: u64, fraction: f64) -> u64 {
    let value = (views as f64 * fraction).floor();
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    (value as u64).min(views.saturating_sub(1))
}
