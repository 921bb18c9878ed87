use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Instrument;

/// Runs the request inside a span carrying its id, then logs the outcome once
/// at a level that follows the status class. Health checks stay at debug.
pub async fn log_request(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_owned();
    let health_check = request.uri().path().starts_with("/health");
    let span = tracing::info_span!(
        "request",
        %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let start = Instant::now();
        let response = next.run(request).await;
        let status = response.status().as_u16();
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match response.status() {
            s if s.is_server_error() => tracing::error!(status, elapsed_ms, "server error"),
            s if s.is_client_error() => tracing::warn!(status, elapsed_ms, "client error"),
            _ if health_check => tracing::debug!(status, elapsed_ms, "health check answered"),
            _ => tracing::info!(status, elapsed_ms, "handled"),
        }

        response
    }
    .instrument(span)
    .await
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
