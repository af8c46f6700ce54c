use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// Adds `X-Content-Type-Options: nosniff` so downloads are never sniffed.
async fn nosniff_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([
            header::CONTENT_DISPOSITION,
            header::HeaderName::from_static(middlewares::trace::TRACE_ID_HEADER),
        ])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .nest("/api/v1/surveys", survey_routes().layer(cors.clone()))
        .nest("/api/v1/sessions", session_routes().layer(cors))
        .with_state(app_state)
        .layer(middleware::from_fn(nosniff_middleware))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn survey_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::surveys::list_surveys).post(handlers::surveys::create_survey),
        )
        .route("/import", post(handlers::surveys::import_survey))
        .route(
            "/{id}",
            get(handlers::surveys::get_survey).delete(handlers::surveys::delete_survey),
        )
        .route("/{id}/script", get(handlers::surveys::survey_script))
        .route("/{id}/sessions", post(handlers::surveys::start_session))
}

fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/{id}",
            get(handlers::sessions::get_session).delete(handlers::sessions::end_session),
        )
        .route("/{id}/answers", post(handlers::sessions::record_answer))
        .route("/{id}/pointer", post(handlers::sessions::record_pointer))
        .route("/{id}/submit", post(handlers::sessions::submit_session))
}
