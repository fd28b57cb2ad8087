use crate::isbn::Isbn;
use crate::types::Book;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// A `books` row exactly as stored.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookRow {
    pub id: i64,
    pub isbn: String,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<BookRow> for Book {
    type Error = sqlx::Error;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        // Tolerate a hand-edited authors column rather than failing the whole listing.
        let authors = row
            .authors
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
            .unwrap_or_default();
        let published_date = row
            .published_date
            .as_deref()
            .map(|s| NaiveDate::parse_from_str(s, DATE_FORMAT))
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Book {
            id: row.id,
            isbn: Isbn::from_normalized(row.isbn),
            title: row.title,
            authors,
            publisher: row.publisher,
            published_date,
            description: row.description,
            thumbnail_url: row.thumbnail_url,
            cover_image_url: row.cover_image_url,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Authors go to the database as a JSON array, or NULL when empty.
pub(crate) fn encode_authors(authors: &[String]) -> Result<Option<String>, sqlx::Error> {
    if authors.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(authors)
        .map(Some)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

pub(crate) fn encode_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
