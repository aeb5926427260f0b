use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use parking_lot::RwLock;
use serde_json::json;
use stacks_http::error::AppError;

use super::lending::{Library, LibraryError};
use super::models::{Availability, Book, BookQuery, StartSession, UserView};

pub type SharedLibrary = Arc<RwLock<Library>>;

impl From<LibraryError> for AppError {
    fn from(error: LibraryError) -> Self {
        let message = error.to_string();
        match error {
            LibraryError::BookNotFound(_) => AppError::not_found(message).with_code("book_not_found"),
            LibraryError::AlreadyBorrowed(name) => {
                AppError::conflict(vec![json!({ "book": name })], message)
                    .with_code("already_borrowed")
            }
            LibraryError::NotBorrowed { name, username } => AppError::conflict(
                vec![json!({ "book": name, "username": username })],
                message,
            )
            .with_code("not_borrowed"),
            LibraryError::NoCurrentUser => AppError::bad_request(message).with_code("no_current_user"),
        }
    }
}

fn user_view(library: &Library) -> UserView {
    UserView {
        username: library.current_user().map(|u| u.username().to_string()),
        borrowed_books: library.borrowed_books().to_vec(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "library module is healthy"
}

pub async fn list_books(
    State(library): State<SharedLibrary>,
    Query(query): Query<BookQuery>,
) -> Json<Vec<Book>> {
    let library = library.read();
    let books = match query.search.as_deref() {
        Some(search) => library.search_books(search),
        None => library.books().to_vec(),
    };
    Json(books)
}

pub async fn borrowed_books(
    State(library): State<SharedLibrary>,
    Query(query): Query<BookQuery>,
) -> Json<UserView> {
    let library = library.read();
    let mut view = user_view(&library);
    if let Some(search) = query.search.as_deref() {
        view.borrowed_books = library.search_borrowed_books(search);
    }
    Json(view)
}

pub async fn book_availability(
    State(library): State<SharedLibrary>,
    Path(name): Path<String>,
) -> Json<Availability> {
    let available = library.read().is_book_available(&name);
    Json(Availability { name, available })
}

pub async fn start_session(
    State(library): State<SharedLibrary>,
    Json(request): Json<StartSession>,
) -> Result<Json<UserView>, AppError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AppError::validation(
            vec![json!({ "field": "username", "error": "required" })],
            "username must not be empty",
        ));
    }

    let mut library = library.write();
    library.set_current_user(username);
    Ok(Json(user_view(&library)))
}

pub async fn borrow_book(
    State(library): State<SharedLibrary>,
    Path(name): Path<String>,
) -> Result<Json<Book>, AppError> {
    let book = library.write().borrow_book(&name)?;
    Ok(Json(book))
}

pub async fn return_book(
    State(library): State<SharedLibrary>,
    Path(name): Path<String>,
) -> Result<Json<Book>, AppError> {
    let book = library.write().return_book(&name)?;
    Ok(Json(book))
}
