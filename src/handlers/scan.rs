use crate::error::ShelfError;
use crate::handlers::books::{flash_redirect, fragment};
use crate::middleware::{FlashLevel, HtmxRequest, take_flashes};
use crate::server::router::ShelfState;
use crate::service::barcode::{
    ClientScanError, log_scanning_error, sample_error, validate_file_for_scanning,
};
use crate::types::{ScanError, ScanErrorSeverity, ScanErrorType, ScanType};
use crate::views;
use axum::{
    Form, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

#[derive(Debug, Deserialize)]
pub struct ScanForm {
    #[serde(default)]
    pub scanned_text: String,
    pub scan_type: Option<String>,
    pub error_data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveScanForm {
    pub book_id: Option<String>,
}

/// Render a scan failure: fragment for htmx, flash + back to the scanner otherwise.
fn scan_failure(
    htmx: bool,
    jar: PrivateCookieJar,
    status: StatusCode,
    err: &ScanError,
) -> Response {
    if htmx {
        fragment(status, views::scan_error_fragment(err))
    } else {
        flash_redirect(jar, FlashLevel::Error, err.user_message.clone(), "/scan")
    }
}

fn simple_scan_error(text: &str, action: &str) -> ScanError {
    ScanError::new(ScanErrorType::Validation, ScanErrorSeverity::Low, text)
        .with_user_message(text)
        .with_suggested_action(action)
        .with_retry(true)
}

/// GET /scan
pub async fn scanner(HtmxRequest(htmx): HtmxRequest, jar: PrivateCookieJar) -> Response {
    if htmx {
        return Html(views::scanner_fragment("")).into_response();
    }
    let (jar, flashes) = take_flashes(jar);
    (jar, Html(views::scanner_page(&flashes))).into_response()
}

/// POST /scan/process
pub async fn process_scan(
    State(state): State<ShelfState>,
    HtmxRequest(htmx): HtmxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<ScanForm>,
) -> Response {
    let scanned_text = form.scanned_text.trim();
    let scan_type = ScanType::from_form(form.scan_type.as_deref());

    // Errors raised by the browser-side scanner arrive instead of text.
    if scanned_text.is_empty()
        && let Some(raw) = form.error_data.as_deref().filter(|s| !s.trim().is_empty())
    {
        match serde_json::from_str::<ClientScanError>(raw) {
            Ok(report) => {
                let err = report.into_scan_error();
                log_scanning_error(scanned_text, scan_type, &err);
                return scan_failure(htmx, jar, StatusCode::BAD_REQUEST, &err);
            }
            Err(e) => debug!(error = %e, "ignoring malformed client error report"),
        }
    }

    if scanned_text.is_empty() {
        let err = simple_scan_error(
            "No barcode data received",
            "Please try scanning again or use the file upload option.",
        )
        .with_file_fallback(true);
        return scan_failure(htmx, jar, StatusCode::BAD_REQUEST, &err);
    }

    match state
        .scans
        .process_scanned_barcode(scanned_text, scan_type)
        .await
    {
        Ok(added) => {
            if htmx {
                return Html(views::scanned_book_confirmation(
                    &added.book,
                    scanned_text,
                    added.warning.as_deref(),
                    added.retry_later,
                ))
                .into_response();
            }
            let detail = format!("/book/{}", added.book.id);
            match added.warning {
                Some(w) => flash_redirect(
                    jar,
                    FlashLevel::Warning,
                    format!("Book found with limited information: {w}"),
                    &detail,
                ),
                None => flash_redirect(
                    jar,
                    FlashLevel::Success,
                    format!("Found book: \"{}\"", added.book.title_or_isbn()),
                    &detail,
                ),
            }
        }
        Err(err) => {
            log_scanning_error(scanned_text, scan_type, &err);
            scan_failure(htmx, jar, StatusCode::BAD_REQUEST, &err)
        }
    }
}

/// POST /scan/save: the book is stored by `/scan/process`; this confirms it.
pub async fn save_scan(
    State(state): State<ShelfState>,
    HtmxRequest(htmx): HtmxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<SaveScanForm>,
) -> Response {
    let Some(raw_id) = form.book_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        let err = simple_scan_error("No book ID provided", "Please try scanning again.");
        return scan_failure(htmx, jar, StatusCode::BAD_REQUEST, &err);
    };
    let Ok(id) = raw_id.parse::<i64>() else {
        let err = simple_scan_error("Invalid book ID format", "Please try scanning again.");
        return scan_failure(htmx, jar, StatusCode::BAD_REQUEST, &err);
    };

    let book = match state.books.get_book(id).await {
        Ok(book) => book,
        Err(ShelfError::NotFound(_)) => {
            let err = simple_scan_error(
                "Book not found in database",
                "The book may have been removed. Please try scanning again.",
            );
            return scan_failure(htmx, jar, StatusCode::NOT_FOUND, &err);
        }
        Err(e) => {
            error!(id, error = %e, "failed to load scanned book");
            let err = ScanError::new(
                ScanErrorType::Database,
                ScanErrorSeverity::High,
                e.to_string(),
            )
            .with_user_message("Database error while retrieving book")
            .with_suggested_action(
                "Please try again in a moment. If the problem persists, contact support.",
            )
            .with_retry(true);
            return scan_failure(htmx, jar, StatusCode::INTERNAL_SERVER_ERROR, &err);
        }
    };

    let text = format!(
        "Successfully added \"{}\" to your collection!",
        book.title_or_isbn()
    );
    if htmx {
        return Html(views::scanner_fragment(&views::message(
            FlashLevel::Success,
            &text,
        )))
        .into_response();
    }
    flash_redirect(jar, FlashLevel::Success, text, "/scan")
}

fn file_rejection(error: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "valid": false,
            "error": error,
            "error_type": ScanErrorType::FileFormat.as_str(),
        })),
    )
        .into_response()
}

/// POST /scan/validate-file (multipart `file`)
pub async fn validate_file(mut multipart: Multipart) -> Response {
    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return file_rejection("No file uploaded"),
            Err(e) => {
                warn!("Multipart read error: {}", e);
                return (
                    e.status(),
                    Json(json!({ "valid": false, "error": e.body_text() })),
                )
                    .into_response();
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        if field.file_name().is_none_or(str::is_empty) {
            return file_rejection("No file selected");
        }

        let content_type = field.content_type().map(str::to_string);
        let mut size: u64 = 0;
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => size += chunk.len() as u64,
                Ok(None) => break,
                Err(e) => {
                    warn!("Field read error: {}", e);
                    return (
                        e.status(),
                        Json(json!({ "valid": false, "error": e.body_text() })),
                    )
                        .into_response();
                }
            }
        }

        return match validate_file_for_scanning(content_type.as_deref(), size) {
            Ok(()) => Json(json!({
                "valid": true,
                "message": "File is valid for scanning",
            }))
            .into_response(),
            Err(err) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "valid": false,
                    "error": err.user_message,
                    "error_type": err.error_type,
                    "suggested_action": err.suggested_action,
                    "recovery_options": err.recovery_options(),
                })),
            )
                .into_response(),
        };
    }
}

/// GET /scan/error-info/{error_type}
pub async fn error_info(Path(error_type): Path<String>) -> Response {
    let Ok(parsed) = error_type.parse::<ScanErrorType>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid error type" })),
        )
            .into_response();
    };

    match sample_error(parsed) {
        Some(sample) => Json(json!({
            "error_type": parsed,
            "user_message": sample.user_message,
            "suggested_action": sample.suggested_action,
            "severity": sample.severity,
            "recovery_options": sample.recovery_options(),
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error_type": parsed,
                "message": "Error information not available",
            })),
        )
            .into_response(),
    }
}
