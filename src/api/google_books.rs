use crate::error::LookupError;
use crate::isbn::Isbn;
use crate::types::google_books::VolumesResponse;
use reqwest::StatusCode;
use tracing::{debug, error, warn};
use url::Url;

/// Stateless Google Books endpoint: one HTTP attempt, classified errors.
pub struct GoogleBooksApi;

impl GoogleBooksApi {
    pub async fn search_by_isbn(
        client: &reqwest::Client,
        base_url: &Url,
        api_key: Option<&str>,
        isbn: &Isbn,
    ) -> Result<VolumesResponse, LookupError> {
        let mut req = client
            .get(base_url.clone())
            .header("Accept", "application/json")
            .query(&[
                ("q", format!("isbn:{isbn}")),
                ("maxResults", "1".to_string()),
                ("printType", "books".to_string()),
            ]);
        if let Some(key) = api_key {
            req = req.query(&[("key", key)]);
        }

        let resp = req.send().await?;
        let status = resp.status();
        debug!(isbn = %isbn, status = %status, "google books responded");

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(isbn = %isbn, "google books rate limit hit");
                return Err(LookupError::RateLimited);
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                return Err(LookupError::Unavailable(
                    "Google Books API service unavailable".to_string(),
                ));
            }
            StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
                return Err(LookupError::Unavailable(
                    "Google Books API gateway error".to_string(),
                ));
            }
            s if s.is_server_error() => {
                return Err(LookupError::Unavailable(format!(
                    "Google Books API server error: {}",
                    s.as_u16()
                )));
            }
            s if s.is_client_error() => {
                let body = resp.text().await.unwrap_or_default();
                error!(isbn = %isbn, status = %s, body = %body, "google books request rejected");
                return Err(LookupError::Upstream(s));
            }
            _ => {}
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| LookupError::Decode(e.to_string()))
    }
}
