use crate::handlers::{books, health, scan};
use crate::service::{BarcodeService, BookService};
use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Upload ceiling for `/scan/validate-file`; must stay above `MAX_SCAN_FILE_BYTES`.
const SCAN_UPLOAD_BODY_LIMIT: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct ShelfState {
    pub books: BookService,
    pub scans: BarcodeService,
    cookie_key: Key,
}

impl ShelfState {
    /// `secret_key` needs at least 64 bytes; otherwise a per-process key is generated.
    pub fn new(books: BookService, secret_key: Option<&str>) -> Self {
        let cookie_key = match secret_key.map(|s| Key::try_from(s.as_bytes())) {
            Some(Ok(key)) => key,
            Some(Err(_)) => {
                warn!("secret_key shorter than 64 bytes, generating a random cookie key");
                Key::generate()
            }
            None => Key::generate(),
        };
        Self {
            scans: BarcodeService::new(books.clone()),
            books,
            cookie_key,
        }
    }
}

impl FromRef<ShelfState> for Key {
    fn from_ref(state: &ShelfState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn shelf_router(state: ShelfState) -> Router {
    Router::new()
        .route("/", get(books::index))
        .route("/books", get(books::list_books))
        .route("/add-book", post(books::add_book))
        .route("/book/{id}", get(books::book_detail))
        .route("/refresh-book/{id}", post(books::refresh_book))
        .route("/delete-book/{id}", post(books::delete_book))
        .route("/scan", get(scan::scanner))
        .route("/scan/process", post(scan::process_scan))
        .route("/scan/save", post(scan::save_scan))
        .route(
            "/scan/validate-file",
            post(scan::validate_file).layer(DefaultBodyLimit::max(SCAN_UPLOAD_BODY_LIMIT)),
        )
        .route("/scan/error-info/{error_type}", get(scan::error_info))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
