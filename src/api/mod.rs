pub mod google_books;

pub use google_books::GoogleBooksApi;
