use crate::error::ShelfError;
use crate::isbn::Isbn;
use crate::service::book_service::{AddedBook, BookService};
use crate::types::{ScanError, ScanErrorSeverity, ScanErrorType, ScanType};
use serde::Deserialize;
use tracing::{error, info, warn};

pub const MAX_SCAN_FILE_BYTES: u64 = 10 * 1024 * 1024;
pub const SCAN_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

pub fn camera_permission_error(details: &str) -> ScanError {
    ScanError::new(
        ScanErrorType::CameraPermission,
        ScanErrorSeverity::Medium,
        format!("Camera permission denied: {details}"),
    )
    .with_file_fallback(true)
    .with_details(details)
}

pub fn camera_not_found_error(details: &str) -> ScanError {
    ScanError::new(
        ScanErrorType::CameraNotFound,
        ScanErrorSeverity::Medium,
        format!("No camera found: {details}"),
    )
    .with_file_fallback(true)
    .with_details(details)
}

pub fn network_error(details: &str, retryable: bool) -> ScanError {
    ScanError::new(
        ScanErrorType::Network,
        ScanErrorSeverity::Medium,
        format!("Network error: {details}"),
    )
    .with_retry(retryable)
    .with_details(details)
}

pub fn database_error(details: &str, retryable: bool) -> ScanError {
    ScanError::new(
        ScanErrorType::Database,
        ScanErrorSeverity::High,
        format!("Database error: {details}"),
    )
    .with_retry(retryable)
    .with_details(details)
}

/// Detection failures from the camera can fall back to a file upload.
pub fn barcode_detection_error(details: &str, scan_type: ScanType) -> ScanError {
    ScanError::new(
        ScanErrorType::BarcodeDetection,
        ScanErrorSeverity::Low,
        format!("Barcode detection failed ({scan_type}): {details}"),
    )
    .with_retry(true)
    .with_file_fallback(scan_type == ScanType::Camera)
    .with_details(details)
}

/// Representative error for a type, used to describe recovery options up front.
pub fn sample_error(error_type: ScanErrorType) -> Option<ScanError> {
    match error_type {
        ScanErrorType::CameraPermission => Some(camera_permission_error("Sample permission error")),
        ScanErrorType::CameraNotFound => Some(camera_not_found_error("Sample camera error")),
        ScanErrorType::Network => Some(network_error("Sample network error", true)),
        ScanErrorType::Database => Some(database_error("Sample database error", true)),
        ScanErrorType::BarcodeDetection => Some(barcode_detection_error(
            "Sample detection error",
            ScanType::Camera,
        )),
        _ => None,
    }
}

/// Check that scanned text is a usable ISBN.
pub fn validate_barcode_result(scanned_text: &str) -> Result<Isbn, ScanError> {
    if scanned_text.trim().is_empty() {
        return Err(ScanError::new(
            ScanErrorType::Validation,
            ScanErrorSeverity::Low,
            "Scanned text cannot be empty",
        )
        .with_user_message("No barcode data was received. Please try scanning again.")
        .with_retry(true));
    }

    match Isbn::parse(scanned_text) {
        Ok(isbn) => {
            info!(isbn = %isbn, "valid isbn scanned");
            Ok(isbn)
        }
        Err(e) => {
            warn!(error = %e, "invalid isbn scanned");
            Err(ScanError::new(
                ScanErrorType::Validation,
                ScanErrorSeverity::Low,
                format!("Invalid ISBN: {e}"),
            )
            .with_user_message(format!("The scanned barcode is not a valid ISBN: {e}"))
            .with_retry(true)
            .with_details(e.to_string()))
        }
    }
}

/// Map a pipeline failure onto the scan error the UI should show.
pub fn classify_processing_error(err: &ShelfError, retry_later: bool) -> ScanError {
    let message = err.to_string();
    match err {
        ShelfError::Duplicate(_) => {
            ScanError::new(ScanErrorType::Duplicate, ScanErrorSeverity::Low, message)
                .with_manual_entry(false)
        }
        ShelfError::Isbn(_) | ShelfError::BadRequest(_) => {
            ScanError::new(ScanErrorType::Validation, ScanErrorSeverity::Low, message)
                .with_retry(true)
        }
        ShelfError::Lookup(e) => network_error(&message, retry_later || e.should_retry_later()),
        ShelfError::Reqwest(_) => network_error(&message, true),
        ShelfError::Save(_) | ShelfError::Database(_) => database_error(&message, true),
        _ => ScanError::new(ScanErrorType::Unknown, ScanErrorSeverity::Medium, message)
            .with_retry(retry_later),
    }
}

/// Upload checks before a client tries to decode a barcode image.
pub fn validate_file_for_scanning(content_type: Option<&str>, size: u64) -> Result<(), ScanError> {
    let file_type = content_type.unwrap_or_default().trim().to_ascii_lowercase();
    if !SCAN_IMAGE_TYPES.contains(&file_type.as_str()) {
        return Err(ScanError::new(
            ScanErrorType::FileFormat,
            ScanErrorSeverity::Low,
            format!("Invalid file type: {file_type}"),
        )
        .with_retry(true)
        .with_details(format!(
            "Received type: {file_type}, Expected: {}",
            SCAN_IMAGE_TYPES.join(", ")
        )));
    }

    if size > MAX_SCAN_FILE_BYTES {
        return Err(ScanError::new(
            ScanErrorType::FileSize,
            ScanErrorSeverity::Low,
            format!("File too large: {size} bytes (max: {MAX_SCAN_FILE_BYTES})"),
        )
        .with_user_message(format!(
            "File size too large ({}MB). Please select an image smaller than 10MB.",
            size / (1024 * 1024)
        ))
        .with_retry(true)
        .with_details(format!(
            "File size: {size} bytes, Max allowed: {MAX_SCAN_FILE_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Keep only the first and last four characters of scanned text.
pub fn redact_scanned_text(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub fn log_scanning_error(scanned_text: &str, scan_type: ScanType, err: &ScanError) {
    error!(
        error_type = err.error_type.as_str(),
        severity = err.severity.as_str(),
        scan_type = scan_type.as_str(),
        text = %redact_scanned_text(scanned_text),
        technical = err.technical_details.as_deref().unwrap_or("None"),
        "barcode scanning error: {}",
        err.message
    );
}

/// Error reported by the browser-side scanner instead of scanned text.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientScanError {
    pub error_message: String,
    pub suggested_action: String,
    pub show_retry: bool,
    pub show_file_fallback: bool,
    pub show_manual_entry: bool,
    pub error_type: String,
    pub severity: String,
}

impl Default for ClientScanError {
    fn default() -> Self {
        Self {
            error_message: "An error occurred".to_string(),
            suggested_action: "Please try again".to_string(),
            show_retry: true,
            show_file_fallback: true,
            show_manual_entry: true,
            error_type: "unknown".to_string(),
            severity: "medium".to_string(),
        }
    }
}

impl ClientScanError {
    /// Convert to a structured error; unknown type or severity strings degrade gracefully.
    pub fn into_scan_error(self) -> ScanError {
        let error_type = self.error_type.parse().unwrap_or(ScanErrorType::Unknown);
        let severity = match self.severity.as_str() {
            "low" => ScanErrorSeverity::Low,
            "high" => ScanErrorSeverity::High,
            "critical" => ScanErrorSeverity::Critical,
            _ => ScanErrorSeverity::Medium,
        };
        ScanError::new(error_type, severity, self.error_message.clone())
            .with_user_message(self.error_message)
            .with_suggested_action(self.suggested_action)
            .with_retry(self.show_retry)
            .with_file_fallback(self.show_file_fallback)
            .with_manual_entry(self.show_manual_entry)
    }
}

/// Scanned-barcode entry point over the book pipeline.
#[derive(Clone)]
pub struct BarcodeService {
    books: BookService,
}

impl BarcodeService {
    pub fn new(books: BookService) -> Self {
        Self { books }
    }

    /// Validate the scan, then add the book through the regular pipeline.
    pub async fn process_scanned_barcode(
        &self,
        scanned_text: &str,
        scan_type: ScanType,
    ) -> Result<AddedBook, ScanError> {
        info!(
            scan_type = scan_type.as_str(),
            text = %redact_scanned_text(scanned_text),
            "processing scanned barcode"
        );
        let isbn = validate_barcode_result(scanned_text)?;

        match self.books.add_book(isbn.as_str()).await {
            Ok(added) => {
                info!(
                    isbn = %added.book.isbn,
                    id = added.book.id,
                    scan_type = scan_type.as_str(),
                    "scanned book stored"
                );
                Ok(added)
            }
            Err(e) => {
                error!(isbn = %isbn, scan_type = scan_type.as_str(), error = %e, "scanned book failed");
                Err(classify_processing_error(&e, false))
            }
        }
    }
}
