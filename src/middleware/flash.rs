use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::debug;

const FLASH_COOKIE: &str = "bookshelf_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success-message",
            FlashLevel::Info => "info-message",
            FlashLevel::Warning => "warning-message",
            FlashLevel::Error => "error-message",
        }
    }
}

/// One-shot message carried across a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

fn read_flashes(jar: &PrivateCookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| serde_json::from_str(c.value()).ok())
        .unwrap_or_default()
}

/// Queue a message for the next rendered page.
pub fn push_flash(
    jar: PrivateCookieJar,
    level: FlashLevel,
    message: impl Into<String>,
) -> PrivateCookieJar {
    let mut flashes = read_flashes(&jar);
    flashes.push(Flash::new(level, message));
    match serde_json::to_string(&flashes) {
        Ok(value) => jar.add(build_cookie(value)),
        Err(e) => {
            debug!(error = %e, "dropping unserializable flash");
            jar
        }
    }
}

/// Drain queued messages, clearing the cookie.
pub fn take_flashes(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<Flash>) {
    let flashes = read_flashes(&jar);
    if flashes.is_empty() {
        return (jar, flashes);
    }
    (jar.remove(clear_cookie()), flashes)
}

fn build_cookie(value: String) -> Cookie<'static> {
    Cookie::build(Cookie::new(FLASH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(5))
        .build()
}

fn clear_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(FLASH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    #[test]
    fn flashes_accumulate_then_drain() {
        let jar = PrivateCookieJar::new(Key::generate());
        let jar = push_flash(jar, FlashLevel::Success, "Successfully added \"Dune\"");
        let jar = push_flash(jar, FlashLevel::Warning, "limited information");

        let (jar, flashes) = take_flashes(jar);
        assert_eq!(
            flashes,
            vec![
                Flash::new(FlashLevel::Success, "Successfully added \"Dune\""),
                Flash::new(FlashLevel::Warning, "limited information"),
            ]
        );
        let (_, again) = take_flashes(jar);
        assert!(again.is_empty());
    }
}
