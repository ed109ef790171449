mod config;
mod dto;
mod handlers;
mod models;
mod repository;
mod service;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use std::sync::Arc;

use handlers::{rest, ui};
use repository::{MemoryRepository, NoteStore, Repository};

use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use service::NoteService;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt::init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {e}");
        panic!("failed to locate or load config: {e}");
    });
    tracing::info!("Successfully loaded notes server config");

    // Store selection; the database connection itself is opened on first use
    let store = match cfg.database_dsn {
        Some(dsn) => NoteStore::Postgres(Repository::new(dsn)),
        None => {
            tracing::warn!("No database DSN configured, notes will be kept in memory");
            NoteStore::Memory(MemoryRepository::default())
        }
    };

    // Service creation
    let service = Arc::new(NoteService::new(Arc::new(store)));

    let http_listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind port {}: {e}", cfg.port);
            panic!("failed to bind port {}: {e}", cfg.port);
        });

    match http_listener.local_addr() {
        Ok(addr) => tracing::info!("Notes server starting, listening on {}", addr),
        Err(e) => tracing::warn!("Notes server starting, local address unknown: {e}"),
    }

    if let Err(e) = axum::serve(http_listener, app(service)).await {
        tracing::error!("HTTP server error: {e}");
        panic!("failed to start HTTP server: {e}");
    }
}

/// Assembles the REST API, the browser UI and the API docs into one router.
fn app(service: Arc<NoteService>) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/app.js", get(ui::script))
        .route("/health", get(health))
        .route(
            "/notes",
            get(rest::get_all_notes).post(rest::create_note),
        )
        .route(
            "/notes/{id}",
            get(rest::get_one_note)
                .put(rest::update_note)
                .delete(rest::delete_note),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", rest::ApiDoc::openapi()))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Response {
    (StatusCode::OK, "Notes server is up").into_response()
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;

    fn memory_app() -> Router {
        let store = NoteStore::Memory(MemoryRepository::default());
        app(Arc::new(NoteService::new(Arc::new(store))))
    }

    #[tokio::test]
    async fn health_check_responds() {
        let response = memory_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_lists_note_routes() {
        let response = memory_app()
            .oneshot(
                Request::get("/api-doc/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/notes"]["get"].is_object());
        assert!(doc["paths"]["/notes"]["post"].is_object());
        assert!(doc["paths"]["/notes/{id}"]["put"].is_object());
        assert!(doc["paths"]["/notes/{id}"]["delete"].is_object());
    }
}
