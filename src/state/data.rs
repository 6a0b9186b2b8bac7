/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the persistence layer and the UI layer. Field names are
/// serialized in camelCase to match the stored JSON document.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a single photo inside an album
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Unique across every album
    pub id: String,
    /// Back-reference to the owning album
    pub album_id: String,
    /// Either a `data:` URI or a `blob:` object reference
    pub url: String,
    pub title: String,
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// A named, ordered collection of photos
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub title: String,
    /// Cached url of the cover photo (None when the album has no cover)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Insertion order is display order
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl Album {
    /// Look up a photo by id
    pub fn photo(&self, photo_id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == photo_id)
    }

    /// True when the cover is empty or points at a photo still in the album
    pub fn cover_is_valid(&self) -> bool {
        match &self.cover_url {
            None => true,
            Some(url) if url.is_empty() => true,
            Some(url) => self.photos.iter().any(|p| &p.url == url),
        }
    }
}

/// Presentation layout selector. Never affects stored data.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    Masonry,
    List,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Grid, ViewMode::Masonry, ViewMode::List];
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewMode::Grid => "Grid",
            ViewMode::Masonry => "Masonry",
            ViewMode::List => "List",
        };
        f.write_str(label)
    }
}

/// The whole persisted document: `{ albums, viewMode }`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub view_mode: ViewMode,
}

impl PersistedState {
    /// Convert to JSON string for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string (from storage)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Data supplied by the caller when adding a photo
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoInput {
    pub url: String,
    pub title: String,
}

impl PhotoInput {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Lenient ISO-8601 timestamps.
///
/// Written as RFC 3339 in UTC. Read back from RFC 3339, or from an
/// offset-less date-time or bare date, which are taken as UTC.
mod iso8601 {
    use super::*;
    use serde::de::{self, Deserializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_album() -> Album {
        let created_at = "2024-05-01T10:00:00Z".parse().unwrap();
        Album {
            id: "a1".to_string(),
            title: "Trip".to_string(),
            cover_url: Some("a.png".to_string()),
            photos: vec![Photo {
                id: "p1".to_string(),
                album_id: "a1".to_string(),
                url: "a.png".to_string(),
                title: "A".to_string(),
                created_at,
            }],
            created_at,
        }
    }

    #[test]
    fn test_document_uses_camel_case_fields() {
        let state = PersistedState {
            albums: vec![sample_album()],
            view_mode: ViewMode::Masonry,
        };

        let json = state.to_json().unwrap();

        assert!(json.contains("\"viewMode\":\"masonry\""));
        assert!(json.contains("\"coverUrl\":\"a.png\""));
        assert!(json.contains("\"albumId\":\"a1\""));
        assert!(json.contains("\"createdAt\":\"2024-05-01T10:00:00Z\""));
    }

    #[test]
    fn test_missing_cover_is_omitted_and_tolerated() {
        let mut album = sample_album();
        album.cover_url = None;
        let json = serde_json::to_string(&album).unwrap();
        assert!(!json.contains("coverUrl"));

        let restored: Album = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, album);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let state = PersistedState::from_json("{}").unwrap();
        assert!(state.albums.is_empty());
        assert_eq!(state.view_mode, ViewMode::Grid);
    }

    #[test]
    fn test_offset_less_timestamps_read_as_utc() {
        let json = r#"{"albums":[{"id":"a","title":"T","photos":[
            {"id":"p","albumId":"a","url":"u","title":"P","createdAt":"2024-05-01 10:00:00.250"}
        ],"createdAt":"2024-05-01T10:00:00"}],"viewMode":"grid"}"#;

        let state = PersistedState::from_json(json).unwrap();

        let album = &state.albums[0];
        assert_eq!(album.created_at, "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(
            album.photos[0].created_at,
            "2024-05-01T10:00:00.250Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_timestamp_forms() {
        let expected: DateTime<Utc> = "2024-05-01T08:00:00Z".parse().unwrap();
        assert_eq!(iso8601::parse("2024-05-01T10:00:00+02:00"), Some(expected));
        assert_eq!(iso8601::parse("2024-05-01T08:00:00.000Z"), Some(expected));
        assert_eq!(
            iso8601::parse("2024-05-01"),
            Some("2024-05-01T00:00:00Z".parse().unwrap())
        );
        assert_eq!(iso8601::parse("yesterday"), None);
    }

    #[test]
    fn test_cover_validity() {
        let mut album = sample_album();
        assert!(album.cover_is_valid());

        album.cover_url = Some("gone.png".to_string());
        assert!(!album.cover_is_valid());

        album.cover_url = Some(String::new());
        assert!(album.cover_is_valid());
    }
}
