use crate::error::ShelfError;
use crate::middleware::{FlashLevel, HtmxRequest, push_flash, take_flashes};
use crate::server::router::ShelfState;
use crate::views;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct AddBookForm {
    #[serde(default)]
    pub isbn: String,
}

pub(crate) fn fragment(status: StatusCode, body: String) -> Response {
    (status, Html(body)).into_response()
}

/// Flash `text` and send a non-htmx client back to `to`.
pub(crate) fn flash_redirect(
    jar: PrivateCookieJar,
    level: FlashLevel,
    text: impl Into<String>,
    to: &str,
) -> Response {
    (push_flash(jar, level, text), Redirect::to(to)).into_response()
}

/// GET / -> index page, or just the collection for htmx.
pub async fn index(
    State(state): State<ShelfState>,
    HtmxRequest(htmx): HtmxRequest,
    jar: PrivateCookieJar,
) -> Result<Response, ShelfError> {
    let books = state.books.list_books().await?;
    if htmx {
        return Ok(Html(views::collection_fragment(&books, "")).into_response());
    }
    let (jar, flashes) = take_flashes(jar);
    Ok((jar, Html(views::index_page(&books, &flashes))).into_response())
}

/// GET /books
pub async fn list_books(
    State(state): State<ShelfState>,
    HtmxRequest(htmx): HtmxRequest,
    jar: PrivateCookieJar,
) -> Result<Response, ShelfError> {
    let books = state.books.list_books().await?;
    if htmx {
        return Ok(Html(views::collection_fragment(&books, "")).into_response());
    }
    let (jar, flashes) = take_flashes(jar);
    Ok((jar, Html(views::collection_page(&books, &flashes))).into_response())
}

/// POST /add-book
pub async fn add_book(
    State(state): State<ShelfState>,
    HtmxRequest(htmx): HtmxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<AddBookForm>,
) -> Result<Response, ShelfError> {
    if form.isbn.trim().is_empty() {
        let text = "Please enter an ISBN";
        if htmx {
            return Ok(fragment(
                StatusCode::BAD_REQUEST,
                views::error_fragment(text, false),
            ));
        }
        return Ok(flash_redirect(jar, FlashLevel::Error, text, "/"));
    }

    let added = match state.books.add_book(&form.isbn).await {
        Ok(added) => added,
        Err(e) => {
            info!(error = %e, "add book rejected");
            if htmx {
                return Ok(fragment(
                    e.status(),
                    views::error_fragment(&e.user_message(), false),
                ));
            }
            return Ok(flash_redirect(jar, FlashLevel::Error, e.user_message(), "/"));
        }
    };

    let success = format!(
        "Successfully added \"{}\" to your collection!",
        added.book.title_or_isbn()
    );

    if htmx {
        let mut notices = views::message(FlashLevel::Success, &success);
        if let Some(warning) = added.warning.as_deref() {
            notices.push_str(&views::warning_fragment(warning, added.retry_later));
        }
        let books = state.books.list_books().await?;
        return Ok(Html(views::collection_fragment(&books, &notices)).into_response());
    }

    let mut jar = push_flash(jar, FlashLevel::Success, success);
    if let Some(warning) = added.warning {
        jar = push_flash(
            jar,
            FlashLevel::Warning,
            format!("Book added with limited information: {warning}"),
        );
    }
    Ok((jar, Redirect::to("/")).into_response())
}

/// GET /book/{id}
pub async fn book_detail(
    State(state): State<ShelfState>,
    HtmxRequest(htmx): HtmxRequest,
    jar: PrivateCookieJar,
    Path(id): Path<i64>,
) -> Result<Response, ShelfError> {
    let book = match state.books.get_book(id).await {
        Ok(book) => book,
        Err(ShelfError::NotFound(_)) => {
            warn!(id, "book detail requested for missing book");
            let body = if htmx {
                views::error_fragment("Book not found", false)
            } else {
                views::not_found_page("Book not found")
            };
            return Ok(fragment(StatusCode::NOT_FOUND, body));
        }
        Err(e) => return Err(e),
    };

    if htmx {
        return Ok(Html(views::book_detail_fragment(&book, "")).into_response());
    }
    let (jar, flashes) = take_flashes(jar);
    Ok((jar, Html(views::book_detail_page(&book, &flashes))).into_response())
}

/// POST /refresh-book/{id}
pub async fn refresh_book(
    State(state): State<ShelfState>,
    HtmxRequest(htmx): HtmxRequest,
    jar: PrivateCookieJar,
    Path(id): Path<i64>,
) -> Response {
    match state.books.refresh_book(id).await {
        Ok(refreshed) => {
            let detail = format!("/book/{}", refreshed.book.id);
            match (htmx, refreshed.warning) {
                (true, Some(w)) => Html(views::book_detail_fragment(
                    &refreshed.book,
                    &views::warning_fragment(&w, true),
                ))
                .into_response(),
                (true, None) => Html(views::book_detail_fragment(
                    &refreshed.book,
                    &views::message(
                        FlashLevel::Success,
                        "Book information refreshed successfully",
                    ),
                ))
                .into_response(),
                (false, Some(w)) => flash_redirect(
                    jar,
                    FlashLevel::Warning,
                    format!("Book refreshed with limited data: {w}"),
                    &detail,
                ),
                (false, None) => flash_redirect(
                    jar,
                    FlashLevel::Success,
                    "Book information refreshed successfully",
                    &detail,
                ),
            }
        }
        Err(e) => {
            warn!(id, error = %e, "refresh failed");
            if htmx {
                fragment(
                    StatusCode::BAD_REQUEST,
                    views::error_fragment(&e.user_message(), false),
                )
            } else {
                flash_redirect(jar, FlashLevel::Error, e.user_message(), "/")
            }
        }
    }
}

/// POST /delete-book/{id}
pub async fn delete_book(
    State(state): State<ShelfState>,
    HtmxRequest(htmx): HtmxRequest,
    jar: PrivateCookieJar,
    Path(id): Path<i64>,
) -> Result<Response, ShelfError> {
    match state.books.delete_book(id).await {
        Ok(book) => {
            let text = format!("Removed \"{}\" from your collection", book.title_or_isbn());
            if htmx {
                let books = state.books.list_books().await?;
                let notices = views::message(FlashLevel::Success, &text);
                return Ok(Html(views::collection_fragment(&books, &notices)).into_response());
            }
            Ok(flash_redirect(jar, FlashLevel::Success, text, "/"))
        }
        Err(e) => {
            warn!(id, error = %e, "delete failed");
            if htmx {
                return Ok(fragment(
                    StatusCode::BAD_REQUEST,
                    views::error_fragment(&e.user_message(), false),
                ));
            }
            Ok(flash_redirect(jar, FlashLevel::Error, e.user_message(), "/"))
        }
    }
}
