use crate::db::BooksStorage;
use crate::error::ShelfError;
use crate::isbn::Isbn;
use crate::service::metadata_client::MetadataClient;
use crate::types::{Book, BookMetadata};
use tracing::{info, warn};

/// Result of adding a book: the stored record plus any fallback notice.
#[derive(Debug, Clone)]
pub struct AddedBook {
    pub book: Book,
    pub warning: Option<String>,
    pub retry_later: bool,
}

#[derive(Debug, Clone)]
pub struct RefreshedBook {
    pub book: Book,
    pub warning: Option<String>,
    pub used_fallback: bool,
}

/// The ISBN → metadata → storage pipeline plus collection CRUD.
#[derive(Clone)]
pub struct BookService {
    storage: BooksStorage,
    metadata: MetadataClient,
}

impl BookService {
    pub fn new(storage: BooksStorage, metadata: MetadataClient) -> Self {
        Self { storage, metadata }
    }

    pub fn storage(&self) -> &BooksStorage {
        &self.storage
    }

    pub fn metadata(&self) -> &MetadataClient {
        &self.metadata
    }

    /// Validate `raw`, reject duplicates, fetch metadata (falling back to a
    /// placeholder) and store the book.
    pub async fn add_book(&self, raw: &str) -> Result<AddedBook, ShelfError> {
        let isbn = Isbn::parse(raw)?;
        self.check_duplicate_isbn(&isbn).await?;

        let lookup = self.metadata.lookup_with_fallback(&isbn).await;
        let mut meta = lookup.metadata;
        if !meta.has_title() {
            warn!(isbn = %isbn, "no title found, using placeholder");
            meta.title = Some(format!("Unknown Title (ISBN: {isbn})"));
        }

        let book = self.storage.insert(&isbn, &meta).await?;
        match &lookup.fallback {
            Some(fb) => warn!(
                isbn = %isbn,
                id = book.id,
                warning = %fb.warning,
                "stored book with fallback data"
            ),
            None => info!(isbn = %isbn, id = book.id, title = ?book.title, "stored book"),
        }

        Ok(AddedBook {
            book,
            retry_later: lookup.fallback.as_ref().is_some_and(|fb| fb.retry_later),
            warning: lookup.fallback.map(|fb| fb.warning),
        })
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, ShelfError> {
        let books = self.storage.list_recent().await?;
        info!(count = books.len(), "listed books");
        Ok(books)
    }

    pub async fn get_book(&self, id: i64) -> Result<Book, ShelfError> {
        if id <= 0 {
            warn!(id, "invalid book id");
            return Err(ShelfError::NotFound(id));
        }
        self.storage
            .get_by_id(id)
            .await?
            .ok_or(ShelfError::NotFound(id))
    }

    /// Look a book up by any accepted ISBN spelling. Invalid input finds nothing.
    pub async fn get_book_by_isbn(&self, raw: &str) -> Result<Option<Book>, ShelfError> {
        match Isbn::parse(raw) {
            Ok(isbn) => self.storage.get_by_isbn(&isbn).await,
            Err(_) => Ok(None),
        }
    }

    pub async fn isbn_exists(&self, isbn: &Isbn) -> Result<bool, ShelfError> {
        self.storage.exists_by_isbn(isbn).await
    }

    /// Normalize `raw` and fail with [`ShelfError::Duplicate`] if it is already stored.
    pub async fn check_duplicate(&self, raw: &str) -> Result<Isbn, ShelfError> {
        let isbn = Isbn::parse(raw)?;
        self.check_duplicate_isbn(&isbn).await?;
        Ok(isbn)
    }

    async fn check_duplicate_isbn(&self, isbn: &Isbn) -> Result<(), ShelfError> {
        if self.isbn_exists(isbn).await? {
            info!(isbn = %isbn, "duplicate isbn rejected");
            return Err(ShelfError::Duplicate(isbn.clone()));
        }
        Ok(())
    }

    /// Replace a book's metadata. An empty title keeps the stored one.
    pub async fn update_metadata(&self, id: i64, meta: BookMetadata) -> Result<Book, ShelfError> {
        let current = self.get_book(id).await?;
        let mut meta = meta;
        if !meta.has_title() {
            meta.title = current.title;
        }
        let book = self.storage.update_metadata(id, &meta).await?;
        info!(id, title = ?book.title, "updated book");
        Ok(book)
    }

    /// Re-fetch metadata for a stored book.
    ///
    /// When the lookup falls back, the existing record is kept as is (only
    /// missing fields are filled from the placeholder).
    pub async fn refresh_book(&self, id: i64) -> Result<RefreshedBook, ShelfError> {
        let current = self.get_book(id).await?;
        let lookup = self.metadata.lookup_with_fallback(&current.isbn).await;

        let meta = match &lookup.fallback {
            None => lookup.metadata,
            Some(_) => {
                let mut kept = BookMetadata::from(&current);
                if !kept.has_title() {
                    kept.title = lookup.metadata.title;
                }
                if kept.description.is_none() {
                    kept.description = lookup.metadata.description;
                }
                kept
            }
        };

        let book = self.update_metadata(id, meta).await?;
        Ok(RefreshedBook {
            book,
            used_fallback: lookup.fallback.is_some(),
            warning: lookup.fallback.map(|fb| fb.warning),
        })
    }

    pub async fn delete_book(&self, id: i64) -> Result<Book, ShelfError> {
        let book = self.get_book(id).await?;
        if !self.storage.delete(id).await? {
            return Err(ShelfError::NotFound(id));
        }
        info!(id, isbn = %book.isbn, "deleted book");
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetadataConfig;
    use crate::isbn::IsbnError;

    /// Service whose lookups always fail fast (nothing listens on port 9).
    async fn offline_service() -> BookService {
        let storage = BooksStorage::connect("sqlite::memory:").await.unwrap();
        let cfg = MetadataConfig {
            api_url: "http://127.0.0.1:9/books/v1/volumes".parse().unwrap(),
            max_attempts: 1,
            min_request_interval_ms: 0,
            timeout_secs: 2,
            ..Default::default()
        };
        BookService::new(storage, MetadataClient::new(cfg, None).unwrap())
    }

    #[tokio::test]
    async fn add_book_falls_back_when_lookup_fails() {
        let svc = offline_service().await;
        let added = svc.add_book("0-306-40615-2").await.unwrap();
        assert_eq!(added.book.isbn.as_str(), "9780306406157");
        assert_eq!(
            added.book.title.as_deref(),
            Some("Book with ISBN 9780306406157")
        );
        assert!(added.retry_later);
        assert!(
            added
                .warning
                .as_deref()
                .unwrap()
                .starts_with("Could not retrieve book information from Google Books API")
        );
    }

    #[tokio::test]
    async fn duplicates_are_rejected_in_any_spelling() {
        let svc = offline_service().await;
        svc.add_book("9780306406157").await.unwrap();
        let err = svc.add_book("0306406152").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Book with ISBN 9780306406157 already exists in your collection"
        );
        assert!(matches!(
            svc.check_duplicate("978-0-306-40615-7").await,
            Err(ShelfError::Duplicate(_))
        ));
        assert_eq!(svc.list_books().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_isbn_is_reported_before_any_lookup() {
        let svc = offline_service().await;
        assert!(matches!(
            svc.add_book("   ").await,
            Err(ShelfError::Isbn(IsbnError::Empty))
        ));
        assert!(matches!(
            svc.add_book("12345").await,
            Err(ShelfError::Isbn(IsbnError::Length(5)))
        ));
        assert!(svc.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookups_by_id_and_isbn() {
        let svc = offline_service().await;
        let book = svc.add_book("9780306406157").await.unwrap().book;
        assert_eq!(svc.get_book(book.id).await.unwrap().id, book.id);
        assert!(matches!(svc.get_book(0).await, Err(ShelfError::NotFound(0))));
        assert!(matches!(svc.get_book(42).await, Err(ShelfError::NotFound(42))));
        assert_eq!(
            svc.get_book_by_isbn("0306406152").await.unwrap().map(|b| b.id),
            Some(book.id)
        );
        assert!(svc.get_book_by_isbn("garbage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fallback_refresh_keeps_existing_data() {
        let svc = offline_service().await;
        let book = svc.add_book("9780306406157").await.unwrap().book;
        let edited = BookMetadata {
            title: Some("Signals and Systems".into()),
            authors: vec!["Ada".into()],
            ..Default::default()
        };
        svc.update_metadata(book.id, edited).await.unwrap();

        let refreshed = svc.refresh_book(book.id).await.unwrap();
        assert!(refreshed.used_fallback);
        assert!(refreshed.warning.is_some());
        assert_eq!(refreshed.book.title.as_deref(), Some("Signals and Systems"));
        assert_eq!(refreshed.book.authors, vec!["Ada".to_string()]);
    }

    #[tokio::test]
    async fn update_without_title_keeps_title() {
        let svc = offline_service().await;
        let book = svc.add_book("9780306406157").await.unwrap().book;
        let updated = svc
            .update_metadata(
                book.id,
                BookMetadata {
                    publisher: Some("Acme".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, book.title);
        assert_eq!(updated.publisher.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn delete_removes_the_book() {
        let svc = offline_service().await;
        let book = svc.add_book("9780306406157").await.unwrap().book;
        assert_eq!(svc.delete_book(book.id).await.unwrap().id, book.id);
        assert!(matches!(
            svc.delete_book(book.id).await,
            Err(ShelfError::NotFound(_))
        ));
        assert!(!svc.isbn_exists(&book.isbn).await.unwrap());
    }
}
