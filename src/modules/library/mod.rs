pub mod lending;
pub mod models;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use parking_lot::RwLock;
use serde_json::json;
use stacks_kernel::{InitCtx, Module};

pub use lending::{Library, LibraryError};
use routes::SharedLibrary;

/// Book lending over the in-memory library shelf
pub struct LibraryModule {
    library: SharedLibrary,
}

impl LibraryModule {
    pub fn new(library: Library) -> Self {
        Self {
            library: Arc::new(RwLock::new(library)),
        }
    }

    /// Shared handle to the shelf served by this module
    pub fn library(&self) -> SharedLibrary {
        Arc::clone(&self.library)
    }
}

#[async_trait]
impl Module for LibraryModule {
    fn name(&self) -> &'static str {
        "library"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = {
            let mut library = self.library.write();
            if let Some(username) = &ctx.settings.library.default_user {
                library.set_current_user(username.as_str());
            }
            library.books().len()
        };

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books,
            current_user = ?ctx.settings.library.default_user,
            "library module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/health", get(routes::health_check))
            .route("/session", post(routes::start_session))
            .route("/books", get(routes::list_books))
            .route("/books/borrowed", get(routes::borrowed_books))
            .route("/books/{name}/available", get(routes::book_availability))
            .route("/books/{name}/borrow", post(routes::borrow_book))
            .route("/books/{name}/return", post(routes::return_book))
            .with_state(self.library())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
            })
        };
        let name_param = json!({
            "name": "name", "in": "path", "required": true, "schema": { "type": "string" }
        });
        let search_param = json!({
            "name": "search", "in": "query", "required": false, "schema": { "type": "string" }
        });
        let book = json!({
            "description": "Book",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Book" } } }
        });
        let user = json!({
            "description": "Signed-in user",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/LibraryUser" } } }
        });

        Some(json!({
            "paths": {
                "/health": {
                    "get": {
                        "summary": "Library health check",
                        "tags": ["Library"],
                        "responses": {
                            "200": { "description": "OK", "content": { "text/plain": { "schema": { "type": "string" } } } }
                        }
                    }
                },
                "/session": {
                    "post": {
                        "summary": "Sign a user in",
                        "tags": ["Library"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/StartSession" } } }
                        },
                        "responses": { "200": user.clone(), "422": error("Empty username") }
                    }
                },
                "/books": {
                    "get": {
                        "summary": "List books on the shelf",
                        "tags": ["Library"],
                        "parameters": [search_param.clone()],
                        "responses": {
                            "200": {
                                "description": "Books",
                                "content": { "application/json": { "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } } } }
                            }
                        }
                    }
                },
                "/books/borrowed": {
                    "get": {
                        "summary": "Books held by the signed-in user",
                        "tags": ["Library"],
                        "parameters": [search_param],
                        "responses": { "200": user }
                    }
                },
                "/books/{name}/available": {
                    "get": {
                        "summary": "Check whether a title can be borrowed",
                        "tags": ["Library"],
                        "parameters": [name_param.clone()],
                        "responses": {
                            "200": {
                                "description": "Availability",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Availability" } } }
                            }
                        }
                    }
                },
                "/books/{name}/borrow": {
                    "post": {
                        "summary": "Borrow a book",
                        "tags": ["Library"],
                        "parameters": [name_param.clone()],
                        "responses": {
                            "200": book.clone(),
                            "400": error("No user signed in"),
                            "404": error("Unknown book"),
                            "409": error("Book already borrowed")
                        }
                    }
                },
                "/books/{name}/return": {
                    "post": {
                        "summary": "Return a borrowed book",
                        "tags": ["Library"],
                        "parameters": [name_param],
                        "responses": {
                            "200": book,
                            "400": error("No user signed in"),
                            "404": error("Unknown book"),
                            "409": error("Book not held by this user")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": ["string", "null"], "description": "Optional catalogue id" },
                            "name": { "type": "string", "description": "Title of the book" },
                            "authors": { "type": "string", "description": "Author(s) of the book" },
                            "is_available": { "type": "boolean", "description": "Whether the book is on the shelf" }
                        },
                        "required": ["name", "authors", "is_available"]
                    },
                    "LibraryUser": {
                        "type": "object",
                        "properties": {
                            "username": { "type": ["string", "null"] },
                            "borrowed_books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                        },
                        "required": ["borrowed_books"]
                    },
                    "StartSession": {
                        "type": "object",
                        "properties": { "username": { "type": "string" } },
                        "required": ["username"]
                    },
                    "Availability": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "available": { "type": "boolean" }
                        },
                        "required": ["name", "available"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "library module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let on_loan = {
            let library = self.library.read();
            library.books().iter().filter(|b| !b.is_available).count()
        };
        tracing::info!(module = self.name(), on_loan, "library module stopped");
        Ok(())
    }
}

/// Create a new instance of the library module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(LibraryModule::new(Library::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use stacks_kernel::settings::Settings;
    use tower::ServiceExt;

    async fn initialized() -> LibraryModule {
        let module = LibraryModule::new(Library::new());
        let settings = Settings::default();
        module
            .init(&InitCtx {
                settings: &settings,
            })
            .await
            .unwrap();
        module
    }

    async fn send(
        router: Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn init_signs_in_the_default_user() {
        let module = initialized().await;
        let library = module.library();
        assert_eq!(
            library.read().current_user().map(|u| u.username().to_string()),
            Some("user1".to_string())
        );
    }

    #[tokio::test]
    async fn borrow_then_return_over_http() {
        let module = initialized().await;

        let (status, body) = send(module.routes(), "POST", "/books/Book2/borrow", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Book2");
        assert_eq!(body["is_available"], false);

        let (_, body) = send(module.routes(), "GET", "/books/Book2/available", None).await;
        assert_eq!(body["available"], false);

        let (status, body) = send(module.routes(), "POST", "/books/Book2/borrow", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "already_borrowed");

        let (_, body) = send(module.routes(), "GET", "/books/borrowed", None).await;
        assert_eq!(body["username"], "user1");
        assert_eq!(body["borrowed_books"][0]["name"], "Book2");

        let (status, body) = send(module.routes(), "POST", "/books/Book2/return", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_available"], true);
    }

    #[tokio::test]
    async fn unknown_book_is_not_found() {
        let module = initialized().await;
        let (status, body) = send(module.routes(), "POST", "/books/Dune/borrow", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "book_not_found");
    }

    #[tokio::test]
    async fn switching_users_isolates_borrowed_lists() {
        let module = initialized().await;
        send(module.routes(), "POST", "/books/Book1/borrow", None).await;

        let (status, body) = send(
            module.routes(),
            "POST",
            "/session",
            Some(json!({ "username": "user2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "user2");
        assert_eq!(body["borrowed_books"], json!([]));

        let (status, body) = send(module.routes(), "POST", "/books/Book1/return", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "not_borrowed");
    }

    #[tokio::test]
    async fn empty_username_is_rejected() {
        let module = initialized().await;
        let (status, body) = send(
            module.routes(),
            "POST",
            "/session",
            Some(json!({ "username": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["details"][0]["field"], "username");
    }

    #[tokio::test]
    async fn search_filters_books() {
        let module = initialized().await;
        let (_, body) = send(module.routes(), "GET", "/books?search=book4", None).await;
        assert_eq!(body, json!([{ "id": null, "name": "Book4", "authors": "Aman", "is_available": true }]));
    }
}
