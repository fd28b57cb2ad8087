//! SQL DDL for the book store.

/// SQLite schema:
/// - `isbn` holds the normalized ISBN-13 and is UNIQUE
/// - `authors` is a JSON array serialized as text, NULL when there are none
/// - `published_date` is `YYYY-MM-DD`, timestamps are RFC3339
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    isbn TEXT NOT NULL UNIQUE,
    title TEXT NULL,
    authors TEXT NULL,
    publisher TEXT NULL,
    published_date TEXT NULL,
    description TEXT NULL,
    thumbnail_url TEXT NULL,
    cover_image_url TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);
CREATE INDEX IF NOT EXISTS idx_books_created_at ON books(created_at);
"#;
