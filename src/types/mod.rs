pub mod book;
pub mod google_books;
pub mod scan;

pub use book::{Book, BookMetadata};
pub use scan::{RecoveryOptions, ScanError, ScanErrorSeverity, ScanErrorType, ScanType};
