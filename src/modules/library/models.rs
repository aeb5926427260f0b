use serde::{Deserialize, Serialize};

/// A book on the library shelf. Books are identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Optional catalogue id; the seeded shelf has none
    #[serde(default)]
    pub id: Option<String>,
    /// Title of the book
    pub name: String,
    /// Author(s) of the book
    pub authors: String,
    /// Whether the book can currently be borrowed
    pub is_available: bool,
}

impl Book {
    /// An available book without a catalogue id.
    pub fn new(name: impl Into<String>, authors: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            authors: authors.into(),
            is_available: true,
        }
    }

    /// Case-insensitive substring match on the book name.
    pub fn name_contains(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// A library member and the books they currently hold, in borrow order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    username: String,
    borrowed_books: Vec<Book>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            borrowed_books: Vec::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn borrowed_books(&self) -> &[Book] {
        &self.borrowed_books
    }

    pub fn has_borrowed(&self, name: &str) -> bool {
        self.borrowed_books.iter().any(|book| book.name == name)
    }

    pub(crate) fn borrow_book(&mut self, book: Book) {
        self.borrowed_books.push(book);
    }

    /// Remove the first held copy named `name`.
    pub(crate) fn return_book(&mut self, name: &str) -> Option<Book> {
        let index = self
            .borrowed_books
            .iter()
            .position(|book| book.name == name)?;
        Some(self.borrowed_books.remove(index))
    }
}

/// Request body for signing a user in.
#[derive(Debug, Clone, Deserialize)]
pub struct StartSession {
    pub username: String,
}

/// Query string for listing books.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    /// Case-insensitive name filter
    #[serde(default)]
    pub search: Option<String>,
}

/// The signed-in user as returned over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub username: Option<String>,
    pub borrowed_books: Vec<Book>,
}

/// Availability answer for a single title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub name: String,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_match_ignores_case() {
        let book = Book::new("Book1", "Nitin");
        assert!(book.name_contains("book"));
        assert!(book.name_contains("OK1"));
        assert!(book.name_contains(""));
        assert!(!book.name_contains("Nitin"));
    }

    #[test]
    fn user_returns_first_matching_copy() {
        let mut user = User::new("user1");
        user.borrow_book(Book::new("Book1", "Nitin"));
        user.borrow_book(Book::new("Book2", "Rahul"));

        let returned = user.return_book("Book1").unwrap();
        assert_eq!(returned.name, "Book1");
        assert_eq!(user.borrowed_books().len(), 1);
        assert!(!user.has_borrowed("Book1"));
        assert!(user.return_book("Book1").is_none());
    }
}
