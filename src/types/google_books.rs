//! Wire types for the Google Books `volumes` endpoint.

use super::book::BookMetadata;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub image_links: ImageLinks,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

impl VolumesResponse {
    /// First matching volume, or `None` when the search came back empty.
    pub fn first_volume(self) -> Option<VolumeInfo> {
        if self.total_items == 0 {
            return None;
        }
        self.items.into_iter().next().map(|v| v.volume_info)
    }
}

impl From<VolumeInfo> for BookMetadata {
    fn from(info: VolumeInfo) -> Self {
        let published_date = info
            .published_date
            .as_deref()
            .and_then(|raw| {
                let parsed = parse_published_date(raw);
                if parsed.is_none() {
                    warn!(published_date = raw, "could not parse published date");
                }
                parsed
            });

        let ImageLinks {
            thumbnail,
            small,
            medium,
            large,
            ..
        } = info.image_links;
        let cover_image_url = large.or(medium).or(small).or_else(|| thumbnail.clone());

        BookMetadata {
            title: info.title,
            authors: info.authors,
            publisher: info.publisher,
            published_date,
            description: info.description,
            thumbnail_url: thumbnail,
            cover_image_url,
        }
    }
}

/// Google Books dates come as `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
/// Partial dates resolve to the first day of the year or month.
pub fn parse_published_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    match raw.len() {
        4 => {
            let year: i32 = raw.parse().ok()?;
            NaiveDate::from_ymd_opt(year, 1, 1)
        }
        7 => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok(),
        _ => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
    }
}
