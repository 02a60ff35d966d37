use std::any::Any;
use std::sync::Arc;

use axum::{
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{warn, Level};

use patient_cell::{patient_routes, PatientService};
use shared_config::AppConfig;
use shared_models::error::AppError;

pub fn create_router(config: &AppConfig, service: Arc<PatientService>) -> Router {
    Router::new()
        .route("/", get(|| async { "Patient records API is running!" }))
        .nest("/patients", patient_routes(service))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(config))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = match config.cors_allow_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                warn!("CORS_ALLOW_ORIGIN '{}' is not a valid header value, allowing any origin", origin);
                AllowOrigin::any()
            }
        },
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
}

/// Turns a handler panic into the regular 500 envelope so the process keeps serving.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(detail).into_response()
}
