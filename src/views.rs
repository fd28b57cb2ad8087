//! Hand-written HTML pages and htmx fragments.

use crate::middleware::{Flash, FlashLevel};
use crate::types::{Book, ScanError};
use std::fmt::Write;

const HTMX_SRC: &str = "https://unpkg.com/htmx.org@1.9.12";

/// Escape text for HTML element content and quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flashes: &[Flash], body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - Book Management</title>
<script src="{HTMX_SRC}"></script>
</head>
<body>
<header><h1><a href="/">Book Management</a></h1><nav><a href="/">Collection</a> <a href="/scan">Scan Barcode</a></nav></header>
<main id="content">
{flashes}
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        flashes = messages(flashes),
    )
}

pub fn message(level: FlashLevel, text: &str) -> String {
    format!(
        r#"<div class="{}" role="alert">{}</div>"#,
        level.css_class(),
        escape(text)
    )
}

fn messages(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|f| message(f.level, &f.message))
        .collect()
}

pub fn error_fragment(text: &str, retry_later: bool) -> String {
    let mut out = format!(r#"<div class="error-message" role="alert"><p>{}</p>"#, escape(text));
    if retry_later {
        out.push_str(r#"<p class="retry-hint">The book service may recover shortly. Please try again later.</p>"#);
    }
    out.push_str("</div>");
    out
}

pub fn warning_fragment(text: &str, retry_later: bool) -> String {
    let mut out = format!(
        r#"<div class="warning-message" role="status"><p>Book added with limited information: {}</p>"#,
        escape(text)
    );
    if retry_later {
        out.push_str(r#"<p class="retry-hint">Use "Refresh" on the book later to fetch full details.</p>"#);
    }
    out.push_str("</div>");
    out
}

fn add_book_form() -> &'static str {
    r##"<section class="add-book">
<h2>Add a Book</h2>
<form action="/add-book" method="post" hx-post="/add-book" hx-target="#book-collection" hx-swap="outerHTML">
<label for="isbn">Enter ISBN</label>
<input id="isbn" name="isbn" type="text" placeholder="Enter ISBN (10 or 13 digits)" autocomplete="off">
<button type="submit">Add Book</button>
</form>
<p><a href="/scan" hx-get="/scan" hx-target="#content">Scan a barcode instead</a></p>
</section>"##
}

fn book_card(book: &Book) -> String {
    let mut card = format!(
        r##"<article class="book-card" id="book-{id}">
<a href="/book/{id}" hx-get="/book/{id}" hx-target="#content" hx-push-url="true">"##,
        id = book.id
    );
    if let Some(thumb) = book.thumbnail_url.as_deref() {
        let _ = write!(
            card,
            r#"<img class="book-thumbnail" src="{}" alt="Cover of {}" loading="lazy">"#,
            escape(thumb),
            escape(&book.title_or_isbn())
        );
    }
    let _ = write!(
        card,
        r#"<h3 class="book-title">{}</h3>"#,
        escape(&book.title_or_isbn())
    );
    if !book.authors.is_empty() {
        let _ = write!(
            card,
            r#"<p class="book-authors">{}</p>"#,
            escape(&book.authors_display())
        );
    }
    let _ = write!(
        card,
        r#"<p class="book-isbn">ISBN: {}</p></a></article>"#,
        book.isbn
    );
    card
}

/// The `#book-collection` block: status messages followed by the grid.
pub fn collection_fragment(books: &[Book], notices: &str) -> String {
    let mut out = String::from(r#"<section id="book-collection">"#);
    out.push_str(notices);
    let _ = write!(out, "<h2>Your Collection ({})</h2>", books.len());
    if books.is_empty() {
        out.push_str(
            r#"<div class="empty-collection"><p>Your collection is empty.</p><p>Add your first book by entering an ISBN above or scanning a barcode.</p></div>"#,
        );
    } else {
        out.push_str(r#"<div class="book-grid">"#);
        for book in books {
            out.push_str(&book_card(book));
        }
        out.push_str("</div>");
    }
    out.push_str("</section>");
    out
}

pub fn index_page(books: &[Book], flashes: &[Flash]) -> String {
    let body = format!("{}\n{}", add_book_form(), collection_fragment(books, ""));
    layout("My Books", flashes, &body)
}

pub fn collection_page(books: &[Book], flashes: &[Flash]) -> String {
    layout("Collection", flashes, &collection_fragment(books, ""))
}

pub fn book_detail_fragment(book: &Book, notices: &str) -> String {
    let mut out = format!(
        r#"<section class="book-detail" id="book-detail-{}">"#,
        book.id
    );
    out.push_str(notices);
    let _ = write!(
        out,
        r##"<a class="back-link" href="/" hx-get="/" hx-target="#content" hx-push-url="true">Back to Collection</a>
<h2>{}</h2>"##,
        escape(&book.title_or_isbn())
    );
    if let Some(cover) = book.cover_image_url.as_deref().or(book.thumbnail_url.as_deref()) {
        let _ = write!(
            out,
            r#"<img class="book-cover" src="{}" alt="Cover of {}">"#,
            escape(cover),
            escape(&book.title_or_isbn())
        );
    }
    out.push_str("<dl>");
    if !book.authors.is_empty() {
        let _ = write!(out, "<dt>Authors</dt><dd>{}</dd>", escape(&book.authors_display()));
    }
    let _ = write!(out, "<dt>ISBN</dt><dd>{}</dd>", book.isbn);
    if let Some(publisher) = book.publisher.as_deref() {
        let _ = write!(out, "<dt>Publisher</dt><dd>{}</dd>", escape(publisher));
    }
    if let Some(date) = book.published_date {
        let _ = write!(out, "<dt>Published</dt><dd>{}</dd>", date.format("%Y-%m-%d"));
    }
    let _ = write!(
        out,
        "<dt>Added</dt><dd>{}</dd></dl>",
        book.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(desc) = book.description.as_deref() {
        let _ = write!(out, r#"<div class="book-description">{}</div>"#, escape(desc));
    }
    let _ = write!(
        out,
        r##"<div class="book-actions">
<form action="/refresh-book/{id}" method="post" hx-post="/refresh-book/{id}" hx-target="closest .book-detail" hx-swap="outerHTML"><button type="submit">Refresh</button></form>
<form action="/delete-book/{id}" method="post" hx-post="/delete-book/{id}" hx-target="#content" hx-confirm="Remove this book from your collection?"><button type="submit">Delete</button></form>
</div></section>"##,
        id = book.id
    );
    out
}

pub fn not_found_page(text: &str) -> String {
    let body = format!(
        r#"{}<a class="back-link" href="/">Back to Collection</a>"#,
        error_fragment(text, false)
    );
    layout("Not Found", &[], &body)
}

pub fn book_detail_page(book: &Book, flashes: &[Flash]) -> String {
    layout(&book.title_or_isbn(), flashes, &book_detail_fragment(book, ""))
}

/// Scanner UI; the browser decodes barcodes and posts the text to `/scan/process`.
pub fn scanner_fragment(notices: &str) -> String {
    format!(
        r##"<section class="barcode-scanner" id="barcode-scanner">
{notices}
<h2>Scan a Barcode</h2>
<div id="scanner-viewport" class="scanner-viewport"></div>
<form action="/scan/process" method="post" hx-post="/scan/process" hx-target="#scan-result">
<input type="hidden" name="scan_type" value="camera">
<label for="scanned_text">Scanned ISBN</label>
<input id="scanned_text" name="scanned_text" type="text" placeholder="Enter ISBN" autocomplete="off">
<input type="hidden" name="error_data" value="">
<button type="submit">Look Up</button>
</form>
<form class="file-scan" hx-post="/scan/validate-file" hx-encoding="multipart/form-data" hx-target="#scan-result">
<input type="file" name="file" accept="image/jpeg,image/png,image/webp">
</form>
<div id="scan-result"></div>
<a class="back-link" href="/">Back to Collection</a>
</section>"##
    )
}

pub fn scanner_page(flashes: &[Flash]) -> String {
    layout("Scan Barcode", flashes, &scanner_fragment(""))
}

pub fn scan_error_fragment(err: &ScanError) -> String {
    let options = err.recovery_options();
    let mut out = format!(
        r#"<div class="error-message scan-error severity-{}" data-error-type="{}" data-can-continue="{}" role="alert">
<p class="error-text">{}</p>
<p class="suggested-action">{}</p>
<div class="recovery-actions">"#,
        err.severity.as_str(),
        err.error_type.as_str(),
        options.can_continue,
        escape(&err.user_message),
        escape(&err.suggested_action),
    );
    if options.show_retry_button {
        out.push_str(r#"<button type="button" class="retry-scan">Try Again</button>"#);
    }
    if options.show_file_fallback {
        out.push_str(r#"<button type="button" class="use-file-upload">Upload an Image</button>"#);
    }
    if options.show_manual_entry {
        out.push_str(r#"<a class="manual-entry" href="/">Enter ISBN Manually</a>"#);
    }
    out.push_str("</div></div>");
    out
}

pub fn scanned_book_confirmation(
    book: &Book,
    scanned_text: &str,
    warning: Option<&str>,
    retry_later: bool,
) -> String {
    let notices = warning
        .map(|w| warning_fragment(w, retry_later))
        .unwrap_or_default();
    format!(
        r##"<div class="scanned-book-confirmation">
{notices}
<p>Scanned: <code>{scanned}</code></p>
{card}
<form action="/scan/save" method="post" hx-post="/scan/save" hx-target="#barcode-scanner" hx-swap="outerHTML">
<input type="hidden" name="book_id" value="{id}">
<button type="submit">Confirm</button>
</form>
</div>"##,
        scanned = escape(scanned_text),
        card = book_card(book),
        id = book.id,
    )
}
