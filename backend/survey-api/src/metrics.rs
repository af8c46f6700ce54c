use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Survey store
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "survey_store_operations_total",
        "Total number of survey store operations",
        &["operation", "backend", "status"]
    )
    .unwrap();

    pub static ref STORE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "survey_store_operation_duration_seconds",
        "Survey store operation duration in seconds",
        &["operation", "backend"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref SURVEYS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "surveys_total",
        "Survey definitions created, imported or deleted",
        &["action"]
    )
    .unwrap();

    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "survey_sessions_total",
        "Survey sessions by lifecycle event",
        &["status"]
    )
    .unwrap();

    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "survey_sessions_active",
        "Number of currently open survey sessions"
    )
    .unwrap();

    pub static ref ANSWERS_RECORDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_recorded_total",
        "Answer edits applied to sessions",
        &["question_type"]
    )
    .unwrap();

    pub static ref POINTER_SAMPLES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "pointer_samples_total",
        "Pointer-move samples received",
        &["outcome"]
    )
    .unwrap();

    pub static ref SUBMISSIONS_REJECTED_TOTAL: IntCounter = register_int_counter!(
        "submissions_rejected_total",
        "Submissions refused because mandatory questions were unanswered"
    )
    .unwrap();

    pub static ref EXPORTS_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "exports_generated_total",
        "Total number of exports generated",
        &["format"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track survey store operation with metrics
pub async fn track_store_operation<F, T>(
    operation: &str,
    backend: &str,
    future: F,
) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, backend, status])
        .inc();

    STORE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, backend])
        .observe(duration);

    result
}
