use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use time::{Date, OffsetDateTime};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentStatus {
    Draft,
    Processing,
    Ready,
    TrailerOnly,
    NoSources,
    Failed,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "DRAFT",
            ContentStatus::Processing => "PROCESSING",
            ContentStatus::Ready => "READY",
            ContentStatus::TrailerOnly => "TRAILER_ONLY",
            ContentStatus::NoSources => "NO_SOURCES",
            ContentStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ContentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PROCESSING" => ContentStatus::Processing,
            "READY" => ContentStatus::Ready,
            "TRAILER_ONLY" => ContentStatus::TrailerOnly,
            "NO_SOURCES" => ContentStatus::NoSources,
            "FAILED" => ContentStatus::Failed,
            _ => ContentStatus::Draft,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "series" => Ok(MediaType::Series),
            other => Err(format!("Unknown media type: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Stream,
    Trailer,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Stream => "stream",
            SourceKind::Trailer => "trailer",
        }
    }
}

impl From<String> for SourceKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "trailer" => SourceKind::Trailer,
            _ => SourceKind::Stream,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Media {
    pub id: Uuid,
    pub media_type: MediaType,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub release_date: Option<Date>,
    pub rating: Option<f64>,
    pub kinopoisk_id: Option<String>,
    pub status: ContentStatus,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

impl Media {
    /// Released strictly after `today` counts as upcoming.
    pub fn is_upcoming(&self, today: Date) -> bool {
        self.release_date.is_some_and(|date| date > today)
    }
}

/// Row shape of `media`; enums are stored as text.
#[derive(Debug, FromRow)]
pub struct MediaRow {
    pub id: Uuid,
    pub media_type: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub release_date: Option<Date>,
    pub rating: Option<f64>,
    pub kinopoisk_id: Option<String>,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<MediaRow> for Media {
    fn from(row: MediaRow) -> Self {
        Self {
            id: row.id,
            media_type: row.media_type.parse().unwrap_or(MediaType::Movie),
            title: row.title,
            slug: row.slug,
            description: row.description,
            poster_url: row.poster_url,
            release_date: row.release_date,
            rating: row.rating,
            kinopoisk_id: row.kinopoisk_id,
            status: ContentStatus::from(row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct VideoSource {
    pub id: Uuid,
    pub media_id: Uuid,
    pub provider: String,
    pub kind: SourceKind,
    pub url: String,
    pub quality: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct VideoSourceRow {
    pub id: Uuid,
    pub media_id: Uuid,
    pub provider: String,
    pub kind: String,
    pub url: String,
    pub quality: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<VideoSourceRow> for VideoSource {
    fn from(row: VideoSourceRow) -> Self {
        Self {
            id: row.id,
            media_id: row.media_id,
            provider: row.provider,
            kind: SourceKind::from(row.kind),
            url: row.url,
            quality: row.quality,
            created_at: row.created_at,
        }
    }
}

/// A source resolved by a provider, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideoSource {
    pub provider: String,
    pub kind: SourceKind,
    pub url: String,
    pub quality: Option<String>,
}

impl NewVideoSource {
    pub fn stream(provider: &str, url: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            kind: SourceKind::Stream,
            url: url.into(),
            quality: None,
        }
    }

    pub fn trailer(provider: &str, url: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            kind: SourceKind::Trailer,
            url: url.into(),
            quality: None,
        }
    }
}
