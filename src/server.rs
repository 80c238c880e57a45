use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::{
    collections::HashMap,
    convert::Infallible,
    net::SocketAddr,
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::sync::{broadcast, Mutex};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};

use crate::api::{ApiAnalyzeRequest, ApiAnalyzeResponse};
use video_analyzer::config::AnalyzerConfig;
use video_analyzer::{analyze, extract_identifier_with, AnalyzeError, HostPolicy, MetricsGenerator};

/// Upper bound on how long a progress channel lives after it is opened.
const CHANNEL_TTL: Duration = Duration::from_secs(120);
/// Grace period for late subscribers once an analysis has finished.
const FINISHED_TTL: Duration = Duration::from_secs(10);

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Serialize)]
struct ProgressEvent {
    event: &'static str,
    message: String,
    timestamp_ms: u128,
}

/// Progress channels keyed by client request id.
///
/// Every channel is scheduled for removal when it is opened, whether or not
/// an analysis ever runs for it. Each entry carries a generation so a stale
/// removal never drops a channel reopened under the same id.
#[derive(Clone)]
struct ProgressHub {
    channels: Arc<Mutex<HashMap<String, (u64, broadcast::Sender<ProgressEvent>)>>>,
    generation: Arc<AtomicU64>,
    ttl: Duration,
}

impl ProgressHub {
    fn new(ttl: Duration) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    async fn open(&self, request_id: &str) -> (u64, broadcast::Sender<ProgressEvent>) {
        let mut channels = self.channels.lock().await;
        if let Some((generation, sender)) = channels.get(request_id) {
            return (*generation, sender.clone());
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let (sender, _) = broadcast::channel(32);
        channels.insert(request_id.to_string(), (generation, sender.clone()));
        self.close_after(request_id.to_string(), generation, self.ttl);
        (generation, sender)
    }

    async fn track(&self, request_id: &str) -> Progress {
        let (generation, sender) = self.open(request_id).await;
        Progress {
            channel: Some(TrackedChannel {
                hub: self.clone(),
                request_id: request_id.to_string(),
                generation,
                sender,
            }),
        }
    }

    fn close_after(&self, request_id: String, generation: u64, delay: Duration) {
        let channels = self.channels.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut channels = channels.lock().await;
            if matches!(channels.get(&request_id), Some((current, _)) if *current == generation) {
                channels.remove(&request_id);
                debug!(%request_id, "closed progress channel");
            }
        });
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }
}

struct TrackedChannel {
    hub: ProgressHub,
    request_id: String,
    generation: u64,
    sender: broadcast::Sender<ProgressEvent>,
}

/// Sending half for one analysis; inert when the client gave no request id.
struct Progress {
    channel: Option<TrackedChannel>,
}

impl Progress {
    fn detached() -> Self {
        Self { channel: None }
    }

    fn emit(&self, event: &'static str, message: &str) {
        if let Some(channel) = self.channel.as_ref() {
            send_event(&channel.sender, event, message);
        }
    }

    fn finish(self, event: &'static str, message: &str) {
        self.emit(event, message);
        if let Some(channel) = self.channel {
            channel
                .hub
                .close_after(channel.request_id, channel.generation, FINISHED_TTL);
        }
    }
}

fn send_event(sender: &broadcast::Sender<ProgressEvent>, event: &'static str, message: &str) {
    let _ = sender.send(ProgressEvent {
        event,
        message: message.to_string(),
        timestamp_ms: now_ms(),
    });
}

#[derive(Clone)]
struct AppState {
    generator: MetricsGenerator,
    host_policy: HostPolicy,
    latency: Duration,
    progress: ProgressHub,
}

#[derive(serde::Deserialize)]
struct StreamQuery {
    request_id: String,
}

pub async fn serve(args: crate::ServeArgs, config: AnalyzerConfig) -> Result<(), String> {
    let state = AppState {
        generator: config.generator(),
        host_policy: config.link.host_policy,
        latency: Duration::from_millis(config.server.simulated_latency_ms),
        progress: ProgressHub::new(CHANNEL_TTL),
    };

    let mut app = router(state);
    let web_root = args.web_root;
    if Path::new(&web_root).is_dir() {
        let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
        info!(%web_root, "serving static files");
        app = app.fallback_service(
            ServeDir::new(web_root).not_found_service(ServeFile::new(index_path)),
        );
    } else {
        warn!(%web_root, "web root not found, serving API only");
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/analyze/stream", get(stream_handler))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiAnalyzeRequest>,
) -> Result<Json<ApiAnalyzeResponse>, (StatusCode, String)> {
    let url = request
        .url()
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?
        .to_string();
    let progress = match request.request_id.as_deref() {
        Some(request_id) => state.progress.track(request_id).await,
        None => Progress::detached(),
    };
    let request_id = request.request_id.unwrap_or_else(next_request_id);

    progress.emit("validating", "Checking video link");

    // Reject bad links before the simulated delay.
    if extract_identifier_with(&url, state.host_policy).is_none() {
        let err = AnalyzeError::IdentifierNotFound;
        warn!(%request_id, %url, "rejected link");
        progress.finish("error", err.user_message());
        return Err((StatusCode::BAD_REQUEST, err.to_string()));
    }

    progress.emit("analyzing", "Generating performance metrics");
    if !state.latency.is_zero() {
        tokio::time::sleep(state.latency).await;
    }

    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let analysis = analyze(&url, state.host_policy, &state.generator, &mut rng)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
    info!(
        %request_id,
        video_id = %analysis.video_id,
        views = analysis.metrics.views,
        engagement = analysis.metrics.engagement,
        "analysis complete"
    );

    progress.finish("done", "Analysis complete");
    Ok(Json(ApiAnalyzeResponse::from_analysis(analysis, request_id)))
}

async fn stream_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (_, sender) = state.progress.open(&query.request_id).await;
    let stream = BroadcastStream::new(sender.subscribe()).filter_map(|event| {
        let event = event.ok()?;
        let data = serde_json::to_string(&event).unwrap_or_default();
        Some(Ok(Event::default().data(data)))
    });

    send_event(&sender, "connected", "Streaming analysis status");
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(8)))
}

fn next_request_id() -> String {
    let sequence = NEXT_REQUEST.fetch_add(1, Ordering::Relaxed);
    format!("analysis-{:x}-{}", now_ms(), sequence)
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state_with(latency: Duration, ttl: Duration) -> AppState {
        AppState {
            generator: MetricsGenerator::default(),
            host_policy: HostPolicy::Any,
            latency,
            progress: ProgressHub::new(ttl),
        }
    }

    async fn post_analyze(app: Router, body: Value) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = router(state_with(Duration::ZERO, CHANNEL_TTL));
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_link_returns_validation_message() {
        let app = router(state_with(Duration::ZERO, CHANNEL_TTL));
        let (status, body) = post_analyze(app, json!({ "url": "not a url" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(String::from_utf8(body).unwrap(), "Please enter a valid YouTube URL");
    }

    #[tokio::test]
    async fn missing_url_is_rejected() {
        let app = router(state_with(Duration::ZERO, CHANNEL_TTL));
        let (status, body) = post_analyze(app, json!({ "seed": 1 })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(String::from_utf8(body).unwrap(), "url is required");
    }

    #[tokio::test]
    async fn invalid_link_skips_simulated_delay() {
        let app = router(state_with(Duration::from_secs(3600), CHANNEL_TTL));
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            post_analyze(app, json!({ "url": "https://vimeo.com/123" })),
        )
        .await;

        let (status, _) = outcome.expect("invalid link waited for the delay");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn seeded_analysis_returns_full_response() {
        let app = router(state_with(Duration::ZERO, CHANNEL_TTL));
        let body = json!({
            "url": "https://www.youtube.com/watch?v=abc123&t=30",
            "request_id": "req-seeded",
            "seed": 42,
        });

        let (status, first) = post_analyze(app.clone(), body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        let first: Value = serde_json::from_slice(&first).unwrap();

        assert_eq!(first["request_id"], "req-seeded");
        assert_eq!(first["video_id"], "abc123");
        assert_eq!(first["analysis"]["engagementTrend"].as_array().map(Vec::len), Some(7));
        assert_eq!(first["analysis"]["viewerDemographics"].as_array().map(Vec::len), Some(5));
        assert!(first["engagement_band"].is_string());
        assert!(first["like_ratio"].as_f64().is_some());

        let views = first["analysis"]["views"].as_u64().unwrap();
        assert!((10_000..1_010_000).contains(&views));

        let (_, second) = post_analyze(app, body).await;
        let second: Value = serde_json::from_slice(&second).unwrap();
        assert_eq!(second["analysis"]["views"].as_u64(), Some(views));
    }

    #[tokio::test]
    async fn generated_request_ids_are_unique() {
        let app = router(state_with(Duration::ZERO, CHANNEL_TTL));
        let body = json!({ "url": "https://youtu.be/xyz789" });

        let (_, first) = post_analyze(app.clone(), body.clone()).await;
        let (_, second) = post_analyze(app, body).await;
        let first: Value = serde_json::from_slice(&first).unwrap();
        let second: Value = serde_json::from_slice(&second).unwrap();

        assert_eq!(first["video_id"], "xyz789");
        assert_ne!(first["request_id"], second["request_id"]);
    }

    #[tokio::test]
    async fn unused_stream_channels_expire() {
        let state = state_with(Duration::ZERO, Duration::from_millis(20));
        let hub = state.progress.clone();
        let app = router(state);

        for id in ["orphan-1", "orphan-2"] {
            let request = Request::builder()
                .uri(format!("/api/analyze/stream?request_id={}", id))
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(hub.len().await, 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hub.len().await, 0);
    }

    #[tokio::test]
    async fn stale_expiry_keeps_reopened_channel() {
        let hub = ProgressHub::new(Duration::from_secs(60));
        let (first, _) = hub.open("shared").await;
        hub.channels.lock().await.remove("shared");
        let (second, _) = hub.open("shared").await;
        assert_ne!(first, second);

        hub.close_after("shared".to_string(), first, Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hub.len().await, 1);
    }
}
