#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{RawQuery, State},
    http::{Request, StatusCode, header},
    response::IntoResponse,
    routing,
};
use bookshelf::config::MetadataConfig;
use bookshelf::db::BooksStorage;
use bookshelf::server::router::{ShelfState, shelf_router};
use bookshelf::service::{BookService, MetadataClient};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const GATSBY_ISBN: &str = "9780743273565";

pub fn gatsby_json() -> String {
    serde_json::json!({
        "kind": "books#volumes",
        "totalItems": 1,
        "items": [{
            "volumeInfo": {
                "title": "The Great Gatsby",
                "authors": ["F. Scott Fitzgerald"],
                "publisher": "Scribner",
                "publishedDate": "2004-09-30",
                "description": "A classic American novel.",
                "imageLinks": {
                    "smallThumbnail": "http://books.example/gatsby-s.jpg",
                    "thumbnail": "http://books.example/gatsby.jpg"
                }
            }
        }]
    })
    .to_string()
}

pub fn empty_json() -> String {
    r#"{"kind":"books#volumes","totalItems":0}"#.to_string()
}

/// Scripted stand-in for the Google Books volumes endpoint.
///
/// Replies are consumed in order; the last one repeats forever.
#[derive(Clone)]
pub struct FakeBooks {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<String>>>,
}

#[derive(Clone)]
struct Script {
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    hits: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<String>>>,
}

async fn volumes(State(script): State<Script>, RawQuery(query): RawQuery) -> impl IntoResponse {
    script.hits.fetch_add(1, Ordering::SeqCst);
    *script.last_query.lock().unwrap() = query;
    let mut replies = script.replies.lock().unwrap();
    let (status, body) = if replies.len() > 1 {
        replies.pop_front().unwrap()
    } else {
        replies.front().cloned().unwrap()
    };
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

impl FakeBooks {
    pub async fn spawn(replies: Vec<(StatusCode, String)>) -> Self {
        assert!(!replies.is_empty(), "script needs at least one reply");
        let script = Script {
            replies: Arc::new(Mutex::new(replies.into())),
            hits: Arc::new(AtomicUsize::new(0)),
            last_query: Arc::new(Mutex::new(None)),
        };
        let app = Router::new()
            .route("/books/v1/volumes", routing::get(volumes))
            .with_state(script.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake upstream");
        });

        Self {
            base_url: format!("http://{addr}/books/v1/volumes"),
            hits: script.hits,
            last_query: script.last_query,
        }
    }

    pub async fn ok(body: String) -> Self {
        Self::spawn(vec![(StatusCode::OK, body)]).await
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }

    /// Fast settings: no pacing, millisecond backoff.
    pub fn config(&self) -> MetadataConfig {
        MetadataConfig {
            api_url: self.base_url.parse().expect("fake url"),
            api_key: None,
            timeout_secs: 5,
            min_request_interval_ms: 0,
            max_attempts: 3,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 4,
            breaker_threshold: 5,
            breaker_timeout_secs: 300,
        }
    }
}

pub async fn book_service(cfg: MetadataConfig) -> BookService {
    let storage = BooksStorage::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    let client = MetadataClient::new(cfg, None).expect("metadata client");
    BookService::new(storage, client)
}

pub async fn test_app(upstream: &FakeBooks) -> (Router, BookService) {
    let books = book_service(upstream.config()).await;
    let state = ShelfState::new(books.clone(), None);
    (shelf_router(state), books)
}

pub fn form_post(uri: &str, body: &str, htmx: bool) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded");
    if htmx {
        req = req.header("HX-Request", "true");
    }
    req.body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn get(uri: &str, htmx: bool) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if htmx {
        req = req.header("HX-Request", "true");
    }
    req.body(Body::empty()).expect("failed to build request")
}

/// Send one request; returns status, headers and the body as text.
pub async fn send(
    app: &Router,
    req: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let text = String::from_utf8(body.to_vec()).expect("response body was not utf-8");
    (status, headers, text)
}
