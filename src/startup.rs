use axum::{
    extract::Request,
    http::{header, Method},
    middleware,
    response::Html,
    routing::{get, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    handlers,
    middleware::{metrics_middleware, request_id::RequestId, request_id_middleware},
    openapi::ApiDoc,
};

pub fn build_router(state: Arc<crate::AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.as_str())
            .unwrap_or("-");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id,
        )
    });

    // Auth routes
    let auth_routes = Router::new().route("/me", get(handlers::auth_handler::get_me));

    // User routes - /me, /subject and /email must come before /{id}
    let user_routes = Router::new()
        .route("/", get(handlers::users_handler::get_users))
        .route("/me", put(handlers::users_handler::update_own_profile))
        .route(
            "/subject/{subject}",
            get(handlers::users_handler::get_user_by_subject),
        )
        .route(
            "/email/{email}",
            get(handlers::users_handler::get_user_by_email),
        )
        .route("/{id}", get(handlers::users_handler::get_user));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/docs", get(api_docs_ui))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(trace)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}

async fn api_docs_ui() -> Html<&'static str> {
    Html(r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Volunteer Match Auth API</title>
</head>
<body>
    <script id="api-reference" data-url="/api-docs/openapi.json"></script>
    <script src="https://cdn.jsdelivr.net/npm/@scalar/api-reference"></script>
</body>
</html>
    "#)
}
