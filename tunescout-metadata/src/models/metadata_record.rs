//! Track metadata record

use serde::{Deserialize, Serialize};
use std::fmt;

/// Descriptive metadata for one track
///
/// A valid record always has a non-empty title and at least one non-empty
/// artist. Artists are kept in credited order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Track title
    pub title: String,
    /// Credited artists, in credit order
    pub artists: Vec<String>,
    /// Album or release title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Track length in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Cover art reference (URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_url: Option<String>,
}

impl MetadataRecord {
    pub fn new<I, S>(title: impl Into<String>, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            artists: artists.into_iter().map(Into::into).collect(),
            album: None,
            duration_ms: None,
            art_url: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_art_url(mut self, art_url: impl Into<String>) -> Self {
        self.art_url = Some(art_url.into());
        self
    }

    /// Non-empty title and at least one artist, none of them blank
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.artists.is_empty()
            && self.artists.iter().all(|a| !a.trim().is_empty())
    }

    /// Clean up a record coming from an untrusted source
    ///
    /// Trims strings, drops blank and duplicate artists (first credit wins)
    /// and turns blank optional fields into `None`. Returns `None` when the
    /// result is not a valid record.
    pub fn normalized(self) -> Option<Self> {
        let title = self.title.trim().to_string();

        let mut artists: Vec<String> = Vec::with_capacity(self.artists.len());
        for artist in self.artists {
            let artist = artist.trim();
            if !artist.is_empty() && !artists.iter().any(|a| a == artist) {
                artists.push(artist.to_string());
            }
        }

        let record = Self {
            title,
            artists,
            album: non_blank(self.album),
            duration_ms: self.duration_ms.filter(|d| *d > 0),
            art_url: non_blank(self.art_url),
        };

        record.is_valid().then_some(record)
    }

    /// Artists joined for display, e.g. "Daft Punk, Pharrell Williams"
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl fmt::Display for MetadataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.artist_line())
    }
}

/// Trim a raw track identifier; `None` when nothing is left
pub fn normalize_track_id(raw: &str) -> Option<&str> {
    let id = raw.trim();
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_record() {
        let record = MetadataRecord::new("Blinding Lights", ["The Weeknd"]);
        assert!(record.is_valid());
        assert_eq!(record.to_string(), "Blinding Lights by The Weeknd");
    }

    #[test]
    fn test_invalid_without_artists_or_title() {
        assert!(!MetadataRecord::new("Title", Vec::<String>::new()).is_valid());
        assert!(!MetadataRecord::new("  ", ["Artist"]).is_valid());
        assert!(!MetadataRecord::new("Title", ["Artist", ""]).is_valid());
    }

    #[test]
    fn test_normalized_trims_and_dedups_artists() {
        let record = MetadataRecord::new(
            "  Get Lucky ",
            [" Daft Punk", "Pharrell Williams", "", "Daft Punk ", "Nile Rodgers"],
        )
        .with_album("   ")
        .with_art_url(" https://img.example/cover.jpg ");

        let normalized = record.normalized().unwrap();

        assert_eq!(normalized.title, "Get Lucky");
        assert_eq!(
            normalized.artists,
            vec!["Daft Punk", "Pharrell Williams", "Nile Rodgers"]
        );
        assert_eq!(normalized.album, None);
        assert_eq!(
            normalized.art_url.as_deref(),
            Some("https://img.example/cover.jpg")
        );
    }

    #[test]
    fn test_normalized_rejects_record_without_usable_artist() {
        let record = MetadataRecord::new("Orphan", ["  ", ""]);
        assert!(record.normalized().is_none());
    }

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let record = MetadataRecord::new("Heat Waves", ["Glass Animals"]);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"title": "Heat Waves", "artists": ["Glass Animals"]})
        );
    }

    #[test]
    fn test_normalize_track_id() {
        assert_eq!(normalize_track_id(" 0VjIjW4GlUZAMYd2vXMi3b\n"), Some("0VjIjW4GlUZAMYd2vXMi3b"));
        assert_eq!(normalize_track_id("   "), None);
    }
}
