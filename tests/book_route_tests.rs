mod common;

use axum::http::{StatusCode, header};
use bookshelf::types::BookMetadata;
use common::{
    FakeBooks, GATSBY_ISBN, form_post, gatsby_json, get, send, test_app,
};

#[tokio::test]
async fn index_page_renders_form_and_empty_collection() {
    let upstream = FakeBooks::ok(gatsby_json()).await;
    let (app, _) = test_app(&upstream).await;

    let (status, _, body) = send(&app, get("/", false)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains("Book Management"));
    assert!(body.contains("Enter ISBN"));
    assert!(body.contains("Your collection is empty"));
    assert!(body.contains("Add your first book"));
}

#[tokio::test]
async fn htmx_add_book_returns_collection_fragment() {
    let upstream = FakeBooks::ok(gatsby_json()).await;
    let (app, books) = test_app(&upstream).await;

    let (status, _, body) = send(&app, form_post("/add-book", "isbn=0-7432-7356-7", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<!DOCTYPE html>"));
    assert!(body.contains("book-card"));
    assert!(body.contains("The Great Gatsby"));
    assert!(body.contains("F. Scott Fitzgerald"));
    assert!(body.contains("Successfully added"));
    assert!(!body.contains("warning-message"));

    let stored = books.get_book_by_isbn(GATSBY_ISBN).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("The Great Gatsby"));
}

#[tokio::test]
async fn add_book_without_htmx_flashes_and_redirects() {
    let upstream = FakeBooks::ok(gatsby_json()).await;
    let (app, _) = test_app(&upstream).await;

    let (status, headers, _) =
        send(&app, form_post("/add-book", &format!("isbn={GATSBY_ISBN}"), false)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/");
    let cookie = headers
        .get(header::SET_COOKIE)
        .expect("flash cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let mut req = get("/", false);
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Successfully added"));
    assert!(body.contains("The Great Gatsby"));
}

#[tokio::test]
async fn api_outage_stores_fallback_with_warning() {
    let upstream =
        FakeBooks::spawn(vec![(StatusCode::SERVICE_UNAVAILABLE, "{}".into())]).await;
    let (app, _) = test_app(&upstream).await;

    let (status, _, body) = send(&app, form_post("/add-book", "isbn=9780743273565", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Book with ISBN 9780743273565"));
    assert!(body.contains("warning-message"));
    assert!(body.contains("Could not retrieve book information from Google Books API"));
}

#[tokio::test]
async fn duplicate_submission_is_rejected() {
    let upstream = FakeBooks::ok(gatsby_json()).await;
    let (app, books) = test_app(&upstream).await;
    books.add_book(GATSBY_ISBN).await.unwrap();

    let (status, _, body) = send(&app, form_post("/add-book", "isbn=0743273567", true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("already exists"));
    assert!(body.contains("error-message"));
    assert_eq!(upstream.hits(), 1, "duplicate must not trigger a lookup");
}

#[tokio::test]
async fn invalid_and_empty_isbns_are_rejected() {
    let upstream = FakeBooks::ok(gatsby_json()).await;
    let (app, _) = test_app(&upstream).await;

    let (status, _, body) = send(&app, form_post("/add-book", "isbn=invalid-isbn", true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid ISBN"));
    assert!(body.contains("error-message"));

    let (status, _, body) = send(&app, form_post("/add-book", "isbn=9780743273566", true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid ISBN-13 checksum"));

    let (status, _, body) = send(&app, form_post("/add-book", "isbn=", true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("enter an ISBN"));
    assert!(body.contains("error-message"));
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn detail_page_and_fragment() {
    let upstream = FakeBooks::ok(gatsby_json()).await;
    let (app, books) = test_app(&upstream).await;
    let id = books.add_book(GATSBY_ISBN).await.unwrap().book.id;

    let (status, _, body) = send(&app, get(&format!("/book/{id}"), true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("book-detail"));
    assert!(body.contains("Back to Collection"));
    assert!(body.contains("Scribner"));

    let (status, _, body) = send(&app, get(&format!("/book/{id}"), false)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<!DOCTYPE html>"));
    assert!(body.contains("F. Scott Fitzgerald"));

    let (status, _, body) = send(&app, get("/book/999", true)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Book not found"));
    assert!(body.contains("error-message"));
}

#[tokio::test]
async fn books_listing_is_newest_first() {
    let upstream = FakeBooks::ok(gatsby_json()).await;
    let (app, books) = test_app(&upstream).await;
    books.add_book("9780306406157").await.unwrap();
    books
        .update_metadata(
            1,
            BookMetadata {
                title: Some("Book 1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let second = books.add_book(GATSBY_ISBN).await.unwrap().book;

    let (status, _, body) = send(&app, get("/books", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("book-grid"));
    let newest = body.find(&format!("book-{}", second.id)).unwrap();
    let oldest = body.find("Book 1").unwrap();
    assert!(newest < oldest);
}

#[tokio::test]
async fn refresh_updates_metadata_or_warns() {
    let upstream = FakeBooks::spawn(vec![
        (StatusCode::OK, gatsby_json()),
        (StatusCode::OK, gatsby_json()),
        (StatusCode::SERVICE_UNAVAILABLE, "{}".into()),
    ])
    .await;
    let (app, books) = test_app(&upstream).await;
    let id = books.add_book(GATSBY_ISBN).await.unwrap().book.id;
    books
        .update_metadata(
            id,
            BookMetadata {
                title: Some("Old Title".into()),
                authors: vec!["Old Author".into()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let (status, _, body) = send(&app, form_post(&format!("/refresh-book/{id}"), "", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("book-detail"));
    assert!(body.contains("The Great Gatsby"));
    assert!(body.contains("F. Scott Fitzgerald"));

    let (status, _, body) = send(&app, form_post(&format!("/refresh-book/{id}"), "", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("warning-message"));
    assert!(body.contains("The Great Gatsby"), "fallback keeps stored title");

    let (status, _, body) = send(&app, form_post("/refresh-book/999", "", true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("not found"));
    assert!(body.contains("error-message"));
}

#[tokio::test]
async fn delete_removes_from_collection() {
    let upstream = FakeBooks::ok(gatsby_json()).await;
    let (app, books) = test_app(&upstream).await;
    let id = books.add_book(GATSBY_ISBN).await.unwrap().book.id;

    let (status, _, body) = send(&app, form_post(&format!("/delete-book/{id}"), "", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Removed"));
    assert!(body.contains("Your collection is empty"));

    let (status, headers, _) =
        send(&app, form_post(&format!("/delete-book/{id}"), "", false)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn unicode_metadata_round_trips_to_html() {
    let json = serde_json::json!({
        "totalItems": 1,
        "items": [{"volumeInfo": {
            "title": "こころ",
            "authors": ["夏目漱石"],
            "publisher": "新潮社"
        }}]
    })
    .to_string();
    let upstream = FakeBooks::ok(json).await;
    let (app, _) = test_app(&upstream).await;

    let (status, _, body) = send(&app, form_post("/add-book", "isbn=9780306406157", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("こころ"));
    assert!(body.contains("夏目漱石"));
}

#[tokio::test]
async fn health_reports_database() {
    let upstream = FakeBooks::ok(gatsby_json()).await;
    let (app, _) = test_app(&upstream).await;

    let (status, _, body) = send(&app, get("/health", false)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["message"], "Book Management Application is running");
    assert_eq!(json["database"], "ok");
}
