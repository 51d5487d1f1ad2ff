//! Heart Disease Prediction API Server
//!
//! Serves predictions from the trained model artifacts over HTTP. The
//! artifacts are loaded once at startup; every request then encodes,
//! scales and classifies against the same read-only state.

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use feature_engine::{CategoryPolicy, FeatureEncoder, PatientRecord};
use inference_engine::{InferenceEngine, PredictionResult};
use metrics_exporter_prometheus::PrometheusHandle;
use model_store::ModelArtifacts;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::model::ModelInfoResponse;
pub use routes::predictions::PredictionResponse;

use config::{CorsConfig, LoggingConfig};
use rate_limit::create_governor_config;

/// Application state shared across handlers
pub struct AppState {
    /// Record to feature row
    pub encoder: FeatureEncoder,
    /// Scaler and classifier
    pub engine: InferenceEngine,
    /// Label column removed from the artifact column list
    pub target_column: String,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus renderer, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
    /// Prediction outcomes since startup
    pub counters: PredictionCounters,
}

/// Served and failed predictions since startup
#[derive(Debug, Default)]
pub struct PredictionCounters {
    served: AtomicU64,
    failed: AtomicU64,
}

impl PredictionCounters {
    pub fn prediction_count(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

impl AppState {
    /// Build the encoder and inference engine from loaded artifacts
    pub fn new(artifacts: ModelArtifacts, policy: CategoryPolicy, target_column: &str) -> Self {
        let (layout, scaler, classifier) = artifacts.into_parts();
        Self {
            encoder: FeatureEncoder::new(layout, policy),
            engine: InferenceEngine::new(scaler, classifier),
            target_column: target_column.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
            counters: PredictionCounters::default(),
        }
    }

    /// Attach a Prometheus handle for `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Encode, scale and classify one record
    pub fn predict(&self, record: &PatientRecord) -> Result<PredictionResult, ApiError> {
        let result = self
            .encoder
            .encode(record)
            .map_err(ApiError::from)
            .and_then(|features| self.engine.predict(&features).map_err(ApiError::from));

        match result {
            Ok(result) => {
                self.counters.served.fetch_add(1, Ordering::Relaxed);
                let diagnosis = result.prediction.diagnosis().as_str();
                metrics::counter!("predictions_total", "diagnosis" => diagnosis).increment(1);
                metrics::histogram!("inference_latency_seconds")
                    .record(result.latency_us as f64 / 1_000_000.0);
                Ok(result.prediction)
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("prediction_errors_total", "kind" => e.kind()).increment(1);
                Err(e)
            }
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelSummary,
    pub metrics: SystemMetrics,
}

/// Loaded model summary
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub classifier: String,
    pub n_features: usize,
}

/// Prediction counters
#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub prediction_count: u64,
    pub error_count: u64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, config: &ServiceConfig) -> Router {
    let mut predict_routes = Router::new()
        .route("/predict_heart_disease/", post(routes::predictions::predict))
        .route("/api/v1/predict", post(routes::predictions::predict));

    if config.rate_limit.enabled {
        match create_governor_config(&config.rate_limit) {
            Some(governor) => {
                info!(
                    "Rate limiting predictions: 1 request per {}s, burst {}",
                    config.rate_limit.per_second, config.rate_limit.burst_size
                );
                predict_routes = predict_routes.layer(GovernorLayer { config: governor });
            }
            None => warn!("Invalid rate limit settings, rate limiting disabled"),
        }
    }

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/model", get(routes::model::get_model))
        .route("/metrics", get(metrics_handler))
        .merge(predict_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors))
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = if config.allowed_origins.iter().any(|origin| origin.trim() == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    cors.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: ModelSummary {
            classifier: state.engine.classifier().kind().to_string(),
            n_features: state.encoder.layout().width(),
        },
        metrics: SystemMetrics {
            prediction_count: state.counters.prediction_count(),
            error_count: state.counters.error_count(),
        },
    };

    Json(response)
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or_else(|| ApiError::NotFound("metrics are disabled".to_string()))
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
            .expect("Failed to set tracing subscriber");
    } else {
        tracing::subscriber::set_global_default(builder.finish())
            .expect("Failed to set tracing subscriber");
    }
}

/// Run the server
pub async fn run_server(state: Arc<AppState>, config: &ServiceConfig) -> anyhow::Result<()> {
    let app = create_router(state, config);

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr.as_str()).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
