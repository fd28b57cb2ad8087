use crate::isbn::Isbn;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// A stored book record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Book {
    pub id: i64,
    pub isbn: Isbn,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn authors_display(&self) -> String {
        self.authors.join(", ")
    }

    /// Title, falling back to the ISBN when no title is known.
    pub fn title_or_isbn(&self) -> String {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("Book {}", self.isbn),
        }
    }

    pub fn display_name(&self) -> String {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => format!("{} by {}", t, self.authors_display()),
            _ => format!("Book {}", self.isbn),
        }
    }
}

/// Metadata describing a book, either from the lookup API or synthesized.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BookMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub cover_image_url: Option<String>,
}

pub const FALLBACK_DESCRIPTION: &str = "Book information could not be retrieved from Google Books API. You can edit this information later.";

impl BookMetadata {
    /// Placeholder record used when the lookup API cannot supply real data.
    pub fn fallback(isbn: &Isbn) -> Self {
        Self {
            title: Some(format!("Book with ISBN {isbn}")),
            description: Some(FALLBACK_DESCRIPTION.to_string()),
            ..Self::default()
        }
    }

    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

impl From<&Book> for BookMetadata {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            authors: book.authors.clone(),
            publisher: book.publisher.clone(),
            published_date: book.published_date,
            description: book.description.clone(),
            thumbnail_url: book.thumbnail_url.clone(),
            cover_image_url: book.cover_image_url.clone(),
        }
    }
}
