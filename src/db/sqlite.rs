use crate::db::models::{BookRow, encode_authors, encode_date};
use crate::db::schema::SQLITE_INIT;
use crate::error::ShelfError;
use crate::isbn::Isbn;
use crate::types::{Book, BookMetadata};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::{debug, error};

pub type SqlitePool = Pool<Sqlite>;

const BOOK_COLUMNS: &str = "id, isbn, title, authors, publisher, published_date, description, \
     thumbnail_url, cover_image_url, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInfo {
    pub book_count: Option<i64>,
    pub tables: Vec<String>,
}

#[derive(Clone)]
pub struct BooksStorage {
    pool: SqlitePool,
}

impl BooksStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, ShelfError> {
        let storage = Self::open(database_url).await?;
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open the database without touching the schema.
    pub async fn open(database_url: &str) -> Result<Self, ShelfError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let mut pool_opts = SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            // Every connection to `:memory:` is a separate database; pin a single one.
            pool_opts = pool_opts
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_opts.connect_with(connect_opts).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), ShelfError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Drop the `books` table and its indexes. All data is lost.
    pub async fn drop_schema(&self) -> Result<(), ShelfError> {
        sqlx::query("DROP TABLE IF EXISTS books")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Drop and recreate the schema.
    pub async fn reset_schema(&self) -> Result<(), ShelfError> {
        self.drop_schema().await?;
        self.init_schema().await
    }

    /// User tables currently present, sorted by name.
    pub async fn tables(&self) -> Result<Vec<String>, ShelfError> {
        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names.into_iter().map(|(n,)| n).collect())
    }

    /// Book count and table list. The count is `None` when `books` does not exist.
    pub async fn info(&self) -> Result<DatabaseInfo, ShelfError> {
        let tables = self.tables().await?;
        let book_count = if tables.iter().any(|t| t == "books") {
            Some(self.count().await?)
        } else {
            None
        };
        Ok(DatabaseInfo { book_count, tables })
    }

    pub async fn ping(&self) -> Result<(), ShelfError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a new book inside a transaction. Returns the stored row.
    ///
    /// Any failure before commit drops the transaction, which rolls it back.
    pub async fn insert(&self, isbn: &Isbn, meta: &BookMetadata) -> Result<Book, ShelfError> {
        let now = Utc::now().to_rfc3339();
        let authors = encode_authors(&meta.authors).map_err(ShelfError::Save)?;

        let mut tx = self.pool.begin().await.map_err(ShelfError::Save)?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO books (
                isbn, title, authors, publisher, published_date, description,
                thumbnail_url, cover_image_url, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(isbn.as_str())
        .bind(meta.title.as_deref())
        .bind(authors)
        .bind(meta.publisher.as_deref())
        .bind(encode_date(meta.published_date))
        .bind(meta.description.as_deref())
        .bind(meta.thumbnail_url.as_deref())
        .bind(meta.cover_image_url.as_deref())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await;

        let id = match inserted {
            Ok(res) => res.last_insert_rowid(),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(isbn = %isbn, "insert hit unique constraint");
                return Err(ShelfError::Duplicate(isbn.clone()));
            }
            Err(e) => {
                error!(isbn = %isbn, error = %e, "insert failed; rolling back");
                return Err(ShelfError::Save(e));
            }
        };

        let row: BookRow = sqlx::query_as(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(ShelfError::Save)?;

        tx.commit().await.map_err(ShelfError::Save)?;
        Ok(row.try_into()?)
    }

    pub async fn exists_by_isbn(&self, isbn: &Isbn) -> Result<bool, ShelfError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books WHERE isbn = ?")
            .bind(isbn.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0 > 0)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Book>, ShelfError> {
        let row: Option<BookRow> =
            sqlx::query_as(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Book::try_from).transpose()?)
    }

    pub async fn get_by_isbn(&self, isbn: &Isbn) -> Result<Option<Book>, ShelfError> {
        let row: Option<BookRow> =
            sqlx::query_as(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE isbn = ?"))
                .bind(isbn.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Book::try_from).transpose()?)
    }

    /// All books, newest first.
    pub async fn list_recent(&self) -> Result<Vec<Book>, ShelfError> {
        let rows: Vec<BookRow> = sqlx::query_as(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| Book::try_from(r).map_err(ShelfError::from))
            .collect()
    }

    pub async fn count(&self) -> Result<i64, ShelfError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    /// Overwrite every metadata column of book `id` and bump `updated_at`.
    pub async fn update_metadata(&self, id: i64, meta: &BookMetadata) -> Result<Book, ShelfError> {
        let authors = encode_authors(&meta.authors).map_err(ShelfError::Save)?;
        let mut tx = self.pool.begin().await.map_err(ShelfError::Save)?;

        let res = sqlx::query(
            r#"UPDATE books SET
                title = ?,
                authors = ?,
                publisher = ?,
                published_date = ?,
                description = ?,
                thumbnail_url = ?,
                cover_image_url = ?,
                updated_at = ?
              WHERE id = ?"#,
        )
        .bind(meta.title.as_deref())
        .bind(authors)
        .bind(meta.publisher.as_deref())
        .bind(encode_date(meta.published_date))
        .bind(meta.description.as_deref())
        .bind(meta.thumbnail_url.as_deref())
        .bind(meta.cover_image_url.as_deref())
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(ShelfError::Save)?;

        if res.rows_affected() == 0 {
            return Err(ShelfError::NotFound(id));
        }

        let row: BookRow = sqlx::query_as(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(ShelfError::Save)?;
        tx.commit().await.map_err(ShelfError::Save)?;
        Ok(row.try_into()?)
    }

    /// Returns whether a row was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool, ShelfError> {
        let res = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
