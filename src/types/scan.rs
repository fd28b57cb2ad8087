use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the barcode reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Camera,
    File,
    #[default]
    Unknown,
}

impl ScanType {
    /// Lenient parse: anything unrecognized becomes `Unknown`.
    pub fn from_form(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("camera") => Self::Camera,
            Some("file") => Self::File,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::File => "file",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorType {
    Validation,
    CameraPermission,
    CameraNotFound,
    CameraNotSupported,
    Network,
    Api,
    Database,
    BarcodeDetection,
    FileFormat,
    FileSize,
    Duplicate,
    Unknown,
}

impl ScanErrorType {
    pub const ALL: [ScanErrorType; 12] = [
        Self::Validation,
        Self::CameraPermission,
        Self::CameraNotFound,
        Self::CameraNotSupported,
        Self::Network,
        Self::Api,
        Self::Database,
        Self::BarcodeDetection,
        Self::FileFormat,
        Self::FileSize,
        Self::Duplicate,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::CameraPermission => "camera_permission",
            Self::CameraNotFound => "camera_not_found",
            Self::CameraNotSupported => "camera_not_supported",
            Self::Network => "network",
            Self::Api => "api",
            Self::Database => "database",
            Self::BarcodeDetection => "barcode_detection",
            Self::FileFormat => "file_format",
            Self::FileSize => "file_size",
            Self::Duplicate => "duplicate",
            Self::Unknown => "unknown",
        }
    }

    pub fn default_user_message(&self) -> &'static str {
        match self {
            Self::Validation => "The scanned barcode is not a valid ISBN.",
            Self::CameraPermission => {
                "Camera access is required to scan barcodes. Please allow camera access and try again."
            }
            Self::CameraNotFound => "No camera was found on this device.",
            Self::CameraNotSupported => "Camera scanning is not supported in this browser.",
            Self::Network => {
                "Unable to connect to the book information service. Please check your internet connection."
            }
            Self::Api => "The book information service is temporarily unavailable.",
            Self::Database => "Unable to save the book to your collection. Please try again.",
            Self::BarcodeDetection => {
                "Could not detect a barcode in the image. Please try a clearer image or better lighting."
            }
            Self::FileFormat => "Please select a valid image file (JPEG, PNG, or WebP).",
            Self::FileSize => {
                "The image file is too large. Please select an image smaller than 10MB."
            }
            Self::Duplicate => "This book is already in your collection.",
            Self::Unknown => "An unexpected error occurred while scanning.",
        }
    }

    pub fn default_suggested_action(&self) -> &'static str {
        match self {
            Self::Validation => "Please scan a valid book barcode or enter the ISBN manually.",
            Self::CameraPermission => {
                "Allow camera access in your browser settings, or use the file upload option."
            }
            Self::CameraNotFound => "Use the file upload option to scan an image of the barcode.",
            Self::CameraNotSupported => "Use the file upload option or enter the ISBN manually.",
            Self::Network => {
                "Check your internet connection and try again, or enter the ISBN manually."
            }
            Self::Api => {
                "Try again in a few minutes, or enter the ISBN manually for basic book information."
            }
            Self::Database => {
                "Try again in a moment. If the problem persists, please contact support."
            }
            Self::BarcodeDetection => {
                "Ensure good lighting and hold the barcode steady, or try uploading a clearer image."
            }
            Self::FileFormat => "Select a JPEG, PNG, or WebP image file.",
            Self::FileSize => "Reduce the image size or select a different image.",
            Self::Duplicate => {
                "This book is already in your collection. You can view it in your book list."
            }
            Self::Unknown => "Please try again or contact support if the problem persists.",
        }
    }
}

impl fmt::Display for ScanErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanErrorType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorSeverity {
    /// User can continue with alternative methods.
    Low,
    /// User should try again or use a fallback.
    Medium,
    /// User needs to take corrective action.
    High,
    Critical,
}

impl ScanErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Structured, user-facing description of a failed scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanError {
    pub error_type: ScanErrorType,
    pub severity: ScanErrorSeverity,
    /// Technical message for logs.
    pub message: String,
    pub user_message: String,
    pub suggested_action: String,
    pub show_retry: bool,
    pub show_file_fallback: bool,
    pub show_manual_entry: bool,
    pub technical_details: Option<String>,
}

impl ScanError {
    /// New error with the type's default wording; manual entry is offered unless turned off.
    pub fn new(
        error_type: ScanErrorType,
        severity: ScanErrorSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            severity,
            message: message.into(),
            user_message: error_type.default_user_message().to_string(),
            suggested_action: error_type.default_suggested_action().to_string(),
            show_retry: false,
            show_file_fallback: false,
            show_manual_entry: true,
            technical_details: None,
        }
    }

    pub fn with_user_message(mut self, msg: impl Into<String>) -> Self {
        self.user_message = msg.into();
        self
    }

    pub fn with_suggested_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = action.into();
        self
    }

    pub fn with_retry(mut self, show: bool) -> Self {
        self.show_retry = show;
        self
    }

    pub fn with_file_fallback(mut self, show: bool) -> Self {
        self.show_file_fallback = show;
        self
    }

    pub fn with_manual_entry(mut self, show: bool) -> Self {
        self.show_manual_entry = show;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.technical_details = Some(details.into());
        self
    }

    pub fn recovery_options(&self) -> RecoveryOptions {
        RecoveryOptions {
            show_retry_button: self.show_retry,
            show_file_fallback: self.show_file_fallback,
            show_manual_entry: self.show_manual_entry,
            suggested_action: self.suggested_action.clone(),
            user_message: self.user_message.clone(),
            severity: self.severity,
            error_type: self.error_type,
            can_continue: matches!(
                self.severity,
                ScanErrorSeverity::Low | ScanErrorSeverity::Medium
            ),
        }
    }
}

/// UI guidance derived from a [`ScanError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryOptions {
    pub show_retry_button: bool,
    pub show_file_fallback: bool,
    pub show_manual_entry: bool,
    pub suggested_action: String,
    pub user_message: String,
    pub severity: ScanErrorSeverity,
    pub error_type: ScanErrorType,
    pub can_continue: bool,
}
