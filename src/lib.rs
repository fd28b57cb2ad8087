pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod isbn;
pub mod middleware;
pub mod server;
pub mod service;
pub mod types;
pub mod views;

pub use error::ShelfError;
pub use isbn::Isbn;
pub use service::{BookService, MetadataClient};
