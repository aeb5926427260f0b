//! Lending rules for the library shelf.
//!
//! A book is either on the shelf (`is_available`) or held by exactly one
//! user. Borrowing and returning move a book between those two places and
//! are rejected when the book is not where the operation expects it.

use std::collections::HashMap;

use thiserror::Error;

use super::models::{Book, User};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("no book named '{0}' in the library")]
    BookNotFound(String),

    #[error("'{0}' is already borrowed")]
    AlreadyBorrowed(String),

    #[error("'{name}' is not borrowed by {username}")]
    NotBorrowed { name: String, username: String },

    #[error("no user is signed in")]
    NoCurrentUser,
}

/// The shelf of books plus the members who have used it.
#[derive(Debug, Clone)]
pub struct Library {
    books: Vec<Book>,
    users: HashMap<String, User>,
    current_user: Option<String>,
}

impl Library {
    /// The six-book starting shelf.
    pub fn new() -> Self {
        Self::with_books(vec![
            Book::new("Book1", "Nitin"),
            Book::new("Book2", "Rahul"),
            Book::new("Book3", "Arya"),
            Book::new("Book4", "Aman"),
            Book::new("Book5", "joy"),
            Book::new("Book6", "Rohit"),
        ])
    }

    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            books,
            users: HashMap::new(),
            current_user: None,
        }
    }

    /// Sign `username` in. A returning user gets their borrowed list back.
    pub fn set_current_user(&mut self, username: impl Into<String>) -> &User {
        let username = username.into();
        tracing::debug!(%username, "switching current user");
        self.current_user = Some(username.clone());
        self.users
            .entry(username.clone())
            .or_insert_with(|| User::new(username))
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user
            .as_ref()
            .and_then(|username| self.users.get(username))
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Books held by the current user, empty when nobody is signed in.
    pub fn borrowed_books(&self) -> &[Book] {
        self.current_user()
            .map(User::borrowed_books)
            .unwrap_or_default()
    }

    pub fn search_books(&self, query: &str) -> Vec<Book> {
        self.books
            .iter()
            .filter(|book| book.name_contains(query))
            .cloned()
            .collect()
    }

    pub fn search_borrowed_books(&self, query: &str) -> Vec<Book> {
        self.borrowed_books()
            .iter()
            .filter(|book| book.name_contains(query))
            .cloned()
            .collect()
    }

    pub fn is_book_available(&self, title: &str) -> bool {
        self.books
            .iter()
            .any(|book| book.name == title && book.is_available)
    }

    /// Take an available copy of `name` off the shelf for the current user.
    pub fn borrow_book(&mut self, name: &str) -> Result<Book, LibraryError> {
        let username = self.current_username()?;

        let mut copies = self.books.iter_mut().filter(|book| book.name == name);
        let Some(first) = copies.next() else {
            return Err(LibraryError::BookNotFound(name.to_string()));
        };
        let book = if first.is_available {
            first
        } else {
            copies
                .find(|book| book.is_available)
                .ok_or_else(|| LibraryError::AlreadyBorrowed(name.to_string()))?
        };

        book.is_available = false;
        let lent = book.clone();

        self.users
            .entry(username.clone())
            .or_insert_with(|| User::new(username.clone()))
            .borrow_book(lent.clone());

        tracing::info!(book = name, %username, "book borrowed");
        Ok(lent)
    }

    /// Put a copy of `name` held by the current user back on the shelf.
    pub fn return_book(&mut self, name: &str) -> Result<Book, LibraryError> {
        let username = self.current_username()?;

        if !self.books.iter().any(|book| book.name == name) {
            return Err(LibraryError::BookNotFound(name.to_string()));
        }

        let not_borrowed = || LibraryError::NotBorrowed {
            name: name.to_string(),
            username: username.clone(),
        };

        let held = self
            .users
            .get(&username)
            .is_some_and(|user| user.has_borrowed(name));
        if !held {
            return Err(not_borrowed());
        }

        let book = self
            .books
            .iter_mut()
            .find(|book| book.name == name && !book.is_available)
            .ok_or_else(not_borrowed)?;
        book.is_available = true;
        let returned = book.clone();

        if let Some(user) = self.users.get_mut(&username) {
            user.return_book(name);
        }

        tracing::info!(book = name, %username, "book returned");
        Ok(returned)
    }

    fn current_username(&self) -> Result<String, LibraryError> {
        self.current_user.clone().ok_or(LibraryError::NoCurrentUser)
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(username: &str) -> Library {
        let mut library = Library::new();
        library.set_current_user(username);
        library
    }

    #[test]
    fn starts_with_six_available_books() {
        let library = Library::new();
        let names: Vec<_> = library.books().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Book1", "Book2", "Book3", "Book4", "Book5", "Book6"]
        );
        assert!(library.books().iter().all(|b| b.is_available));
        assert!(library.borrowed_books().is_empty());
    }

    #[test]
    fn borrowing_takes_the_book_off_the_shelf() {
        let mut library = signed_in("user1");

        let lent = library.borrow_book("Book3").unwrap();

        assert!(!lent.is_available);
        assert!(!library.is_book_available("Book3"));
        assert_eq!(library.borrowed_books(), &[lent]);
    }

    #[test]
    fn second_borrow_of_the_same_book_is_rejected() {
        let mut library = signed_in("user1");
        library.borrow_book("Book1").unwrap();

        library.set_current_user("user2");
        let err = library.borrow_book("Book1").unwrap_err();

        assert_eq!(err, LibraryError::AlreadyBorrowed("Book1".to_string()));
        assert!(library.borrowed_books().is_empty());
    }

    #[test]
    fn returning_puts_the_book_back() {
        let mut library = signed_in("user1");
        library.borrow_book("Book2").unwrap();

        let returned = library.return_book("Book2").unwrap();

        assert!(returned.is_available);
        assert!(library.is_book_available("Book2"));
        assert!(library.borrowed_books().is_empty());
    }

    #[test]
    fn returning_a_shelved_book_is_rejected() {
        let mut library = signed_in("user1");
        let err = library.return_book("Book4").unwrap_err();
        assert_eq!(
            err,
            LibraryError::NotBorrowed {
                name: "Book4".to_string(),
                username: "user1".to_string(),
            }
        );
    }

    #[test]
    fn only_the_borrower_can_return() {
        let mut library = signed_in("user1");
        library.borrow_book("Book5").unwrap();

        library.set_current_user("user2");
        assert!(matches!(
            library.return_book("Book5"),
            Err(LibraryError::NotBorrowed { .. })
        ));
        assert!(!library.is_book_available("Book5"));

        library.set_current_user("user1");
        assert_eq!(library.borrowed_books().len(), 1);
        library.return_book("Book5").unwrap();
    }

    #[test]
    fn unknown_books_and_missing_users_are_errors() {
        let mut library = Library::new();
        assert_eq!(
            library.borrow_book("Book1"),
            Err(LibraryError::NoCurrentUser)
        );

        library.set_current_user("user1");
        assert_eq!(
            library.borrow_book("Dune"),
            Err(LibraryError::BookNotFound("Dune".to_string()))
        );
        assert_eq!(
            library.return_book("Dune"),
            Err(LibraryError::BookNotFound("Dune".to_string()))
        );
    }

    #[test]
    fn duplicate_titles_lend_the_free_copy() {
        let mut library = Library::with_books(vec![
            Book::new("Dune", "A"),
            Book::new("Dune", "B"),
        ]);
        library.set_current_user("user1");

        assert_eq!(library.borrow_book("Dune").unwrap().authors, "A");
        assert!(library.is_book_available("Dune"));
        assert_eq!(library.borrow_book("Dune").unwrap().authors, "B");
        assert!(!library.is_book_available("Dune"));
        assert_eq!(
            library.borrow_book("Dune"),
            Err(LibraryError::AlreadyBorrowed("Dune".to_string()))
        );
    }

    #[test]
    fn availability_needs_an_exact_title() {
        let library = Library::new();
        assert!(library.is_book_available("Book1"));
        assert!(!library.is_book_available("book1"));
        assert!(!library.is_book_available("Book"));
    }

    #[test]
    fn search_filters_shelf_and_borrowed_lists() {
        let mut library = signed_in("user1");
        library.borrow_book("Book1").unwrap();
        library.borrow_book("Book6").unwrap();

        assert_eq!(library.search_books("BOOK").len(), 6);
        assert_eq!(library.search_books("6").len(), 1);
        let held: Vec<_> = library
            .search_borrowed_books("book1")
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(held, vec!["Book1"]);
    }
}
