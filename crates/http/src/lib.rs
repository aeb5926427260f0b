//! HTTP server facade for Stacks with Axum, error handling, and OpenAPI support.

use std::future::Future;

use anyhow::Context;
use axum::{routing::get, Router};

use stacks_kernel::settings::Settings;
use stacks_kernel::ModuleRegistry;

pub mod error;
pub mod router;

use router::RouterBuilder;

/// Start the HTTP server with the given module registry, serving until
/// `shutdown` resolves
pub async fn start_server<F>(
    registry: &ModuleRegistry,
    settings: &Settings,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("starting HTTP server on {}", address);

    let app = build_router(registry, settings);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {}", address))?;

    tracing::info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let mut router_builder = RouterBuilder::new().route("/healthz", get(health_check));

    for module in registry.modules() {
        let module_name = module.name();
        tracing::info!(
            module = module_name,
            "mounting module routes under /api/{}",
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module.routes());
    }

    // Layers wrap the routes added before them, so they go last.
    router_builder
        .with_openapi(registry)
        .with_timeout(settings.server.request_timeout_ms)
        .with_request_id()
        .with_cors()
        .with_tracing()
        .build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use stacks_kernel::Module;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct ShelfModule;

    #[async_trait]
    impl Module for ShelfModule {
        fn name(&self) -> &'static str {
            "shelf"
        }

        fn routes(&self) -> Router {
            Router::new().route("/health", get(|| async { "shelf module is healthy" }))
        }

        fn openapi(&self) -> Option<serde_json::Value> {
            Some(serde_json::json!({
                "paths": { "/health": { "get": { "summary": "Shelf health" } } },
                "components": { "schemas": { "Shelf": { "type": "object" } } }
            }))
        }
    }

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(ShelfModule));
        registry
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn healthz_answers_ok() {
        let router = build_router(&registry(), &Settings::default());
        let (status, body) = get_body(router, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn module_routes_are_mounted_under_api() {
        let router = build_router(&registry(), &Settings::default());
        let (status, body) = get_body(router, "/api/shelf/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"shelf module is healthy");
    }

    #[tokio::test]
    async fn openapi_merges_module_fragments() {
        let router = build_router(&registry(), &Settings::default());
        let (status, body) = get_body(router, "/docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);

        let document: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(document["paths"]["/api/shelf/health"].is_object());
        assert!(document["paths"]["/healthz"].is_object());
        assert!(document["components"]["schemas"]["Shelf"].is_object());
        assert!(document["components"]["schemas"]["ErrorResponse"].is_object());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let router = build_router(&registry(), &Settings::default());
        let response = router
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
