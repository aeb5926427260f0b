pub mod data;
pub mod models;
pub mod repository;
pub mod routes;
pub mod view_model;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use once_cell::sync::OnceCell;
use serde_json::json;
use stacks_kernel::{InitCtx, Module};

use repository::{InMemoryItemRepository, ItemRepository};
use routes::CatalogContext;
use view_model::{ProductViewModel, ViewModelConfig};

/// Paginated, searchable, sortable product catalog
pub struct CatalogModule {
    repository: Arc<dyn ItemRepository>,
    page_size: OnceCell<usize>,
    screen: Arc<OnceCell<ProductViewModel>>,
}

impl CatalogModule {
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self {
            repository,
            page_size: OnceCell::new(),
            screen: Arc::new(OnceCell::new()),
        }
    }

    fn context(&self) -> CatalogContext {
        CatalogContext {
            repository: Arc::clone(&self.repository),
            page_size: self.page_size.get().copied().unwrap_or(10),
            screen: Arc::clone(&self.screen),
        }
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let settings = &ctx.settings.catalog;
        if settings.page_size == 0 {
            anyhow::bail!("catalog.page_size must be at least 1");
        }

        let _ = self.page_size.set(settings.page_size);
        self.screen.get_or_init(|| {
            ProductViewModel::new(
                Arc::clone(&self.repository),
                ViewModelConfig::from(settings),
            )
        });

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            page_size = settings.page_size,
            load_more_delay_ms = settings.load_more_delay_ms,
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/health", get(routes::health_check))
            .route("/items", get(routes::list_items))
            .route("/items/search", get(routes::search_items))
            .route("/items/sorted", get(routes::sorted_items))
            .route("/feed", get(routes::feed_state))
            .route("/feed/fetch", post(routes::feed_fetch))
            .route("/feed/load-more", post(routes::feed_load_more))
            .route("/feed/search", post(routes::feed_search))
            .route("/feed/sort", post(routes::feed_sort))
            .with_state(self.context())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let param = |name: &str, location: &str, required: bool, schema: serde_json::Value| {
            json!({ "name": name, "in": location, "required": required, "schema": schema })
        };
        let page = param("page", "query", false, json!({ "type": "integer", "minimum": 1 }));
        let size = param("size", "query", false, json!({ "type": "integer", "minimum": 1 }));
        let sort_by = |required| {
            param("sortBy", "query", required, json!({ "type": "string", "enum": ["name", "price"] }))
        };
        let order = param("order", "query", false, json!({ "type": "string", "enum": ["asc", "desc"] }));
        let items = json!({
            "description": "Items",
            "content": { "application/json": { "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Item" } } } }
        });
        let feed = json!({
            "description": "Product screen state",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CatalogState" } } }
        });
        let error = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
            })
        };

        Some(json!({
            "paths": {
                "/health": {
                    "get": {
                        "summary": "Catalog health check",
                        "tags": ["Catalog"],
                        "responses": {
                            "200": { "description": "OK", "content": { "text/plain": { "schema": { "type": "string" } } } }
                        }
                    }
                },
                "/items": {
                    "get": {
                        "summary": "Fetch one page of items",
                        "tags": ["Catalog"],
                        "parameters": [page.clone(), size.clone(), sort_by(false), order.clone()],
                        "responses": {
                            "200": items.clone(),
                            "400": error("Unknown sort key"),
                            "422": error("Invalid page or size")
                        }
                    }
                },
                "/items/search": {
                    "get": {
                        "summary": "Search items by name or brand",
                        "tags": ["Catalog"],
                        "parameters": [param("query", "query", true, json!({ "type": "string" })), page, size],
                        "responses": { "200": items.clone(), "422": error("Invalid page or size") }
                    }
                },
                "/items/sorted": {
                    "get": {
                        "summary": "Fetch every item, sorted",
                        "tags": ["Catalog"],
                        "parameters": [sort_by(true), order],
                        "responses": { "200": items, "400": error("Unknown sort key") }
                    }
                },
                "/feed": {
                    "get": { "summary": "Current product screen state", "tags": ["Catalog"], "responses": { "200": feed.clone() } }
                },
                "/feed/fetch": {
                    "post": { "summary": "Append the next page", "tags": ["Catalog"], "responses": { "200": feed.clone() } }
                },
                "/feed/load-more": {
                    "post": {
                        "summary": "Append the next page after the scroll delay",
                        "tags": ["Catalog"],
                        "parameters": [param("lastVisible", "query", false, json!({ "type": "integer", "minimum": 0 }))],
                        "responses": { "200": feed.clone() }
                    }
                },
                "/feed/search": {
                    "post": {
                        "summary": "Replace the screen list with search matches",
                        "tags": ["Catalog"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/FeedSearch" } } }
                        },
                        "responses": { "200": feed.clone() }
                    }
                },
                "/feed/sort": {
                    "post": {
                        "summary": "Sort the screen list",
                        "tags": ["Catalog"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/FeedSort" } } }
                        },
                        "responses": { "200": feed }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Item": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "brand": { "type": "string" },
                            "price": { "type": "number" }
                        },
                        "required": ["name", "brand", "price"]
                    },
                    "CatalogState": {
                        "type": "object",
                        "properties": {
                            "items": { "type": "array", "items": { "$ref": "#/components/schemas/Item" } },
                            "is_loading": { "type": "boolean" },
                            "is_fetching_more": { "type": "boolean" },
                            "error_message": { "type": ["string", "null"] },
                            "current_page": { "type": "integer" },
                            "is_last_page": { "type": "boolean" }
                        },
                        "required": ["items", "is_loading", "is_fetching_more", "current_page", "is_last_page"]
                    },
                    "FeedSearch": {
                        "type": "object",
                        "properties": { "query": { "type": "string" } },
                        "required": ["query"]
                    },
                    "FeedSort": {
                        "type": "object",
                        "properties": {
                            "sort_by": { "type": "string", "enum": ["name", "price"] },
                            "order": { "type": "string", "enum": ["asc", "desc"] }
                        },
                        "required": ["sort_by"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        if let Some(screen) = self.screen.get() {
            screen.settle().await;
        }
        tracing::info!(module = self.name(), "catalog module stopped");
        Ok(())
    }
}

/// Create a new instance of the catalog module over the seed list
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(CatalogModule::new(Arc::new(InMemoryItemRepository::seeded())))
}
