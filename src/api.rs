use serde::{Deserialize, Serialize};
use video_analyzer::{Analysis, EngagementBand, MetricsBundle};

#[derive(Debug, Deserialize)]
pub struct ApiAnalyzeRequest {
    pub url: Option<String>,
    pub request_id: Option<String>,
    pub seed: Option<u64>,
}

impl ApiAnalyzeRequest {
    pub fn url(&self) -> Result<&str, String> {
        let url = self.url.as_deref().unwrap_or_default().trim();
        if url.is_empty() {
            return Err("url is required".to_string());
        }
        Ok(url)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiAnalyzeResponse {
    pub request_id: String,
    pub video_id: String,
    pub analysis: MetricsBundle,
    pub engagement_band: EngagementBand,
    pub like_ratio: f64,
}

impl ApiAnalyzeResponse {
    pub fn from_analysis(analysis: Analysis, request_id: String) -> Self {
        Self {
            request_id,
            engagement_band: analysis.metrics.engagement_band(),
            like_ratio: analysis.metrics.like_ratio(),
            video_id: analysis.video_id.into_inner(),
            analysis: analysis.metrics,
        }
    }
}
