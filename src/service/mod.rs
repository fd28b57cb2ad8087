pub mod barcode;
pub mod book_service;
pub mod circuit_breaker;
pub mod metadata_client;

pub use barcode::BarcodeService;
pub use book_service::{AddedBook, BookService, RefreshedBook};
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use metadata_client::{FallbackInfo, MetadataClient, MetadataLookup};
