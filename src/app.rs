use std::{net::SocketAddr, time::Duration};

use axum::{
    body::Body,
    http::{Request, Response},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{field, info, info_span, Span};

use crate::state::AppState;
use crate::{drafts, home, meals};

/// Every endpoint of the meal log, under `/api/v1`.
pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(home::router())
        .merge(meals::router())
        .merge(drafts::router())
        .route("/health", get(|| async { "ok" }));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| request_span(req))
                .on_response(|res: &Response<Body>, latency: Duration, span: &Span| {
                    record_response(res, latency, span)
                }),
        )
}

fn request_span<B>(req: &Request<B>) -> Span {
    info_span!(
        "http_request",
        method = %req.method(),
        uri = %req.uri(),
        status = field::Empty,
    )
}

fn record_response<B>(res: &Response<B>, latency: Duration, span: &Span) {
    let status = res.status();
    span.record("status", field::display(status));
    if status.is_server_error() {
        tracing::error!(%status, ?latency, "response");
    } else {
        info!(%status, ?latency, "response");
    }
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    async fn call(method: Method, uri: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = build_app(AppState::fake()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_is_served_under_api_prefix() {
        assert_eq!(
            call(Method::GET, "/api/v1/health").await,
            (StatusCode::OK, "ok".to_string())
        );
        let (status, _) = call(Method::GET, "/health").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn home_menu_lists_routes() {
        let (status, body) = call(Method::GET, "/api/v1/home").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("meal_input"));
        assert!(body.contains("meal_analysis"));
    }

    #[tokio::test]
    async fn drafts_and_meals_are_mounted() {
        let (status, body) = call(Method::POST, "/api/v1/drafts").await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.contains("\"id\""));

        let (status, body) = call(Method::GET, "/api/v1/meals?date=2024-5-3").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("meals"));
    }
}
