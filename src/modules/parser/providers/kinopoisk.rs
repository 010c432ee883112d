use super::TrailerProvider;
use crate::modules::content::model::NewVideoSource;
use crate::modules::parser::model::ApiKeys;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const PROVIDER: &str = "kinopoisk";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Trailer lookups against the Kinopoisk unofficial API.
#[derive(Clone)]
pub struct KinopoiskClient {
    base_url: Url,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoItem {
    url: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    site: String,
}

impl VideoItem {
    fn is_youtube(&self) -> bool {
        self.site.eq_ignore_ascii_case("YOUTUBE")
    }

    fn to_source(&self) -> NewVideoSource {
        NewVideoSource::trailer(PROVIDER, self.url.clone())
    }

    fn is_trailer(&self) -> bool {
        let name = self.name.to_lowercase();
        name.contains("trailer") || name.contains("трейлер")
    }
}

impl KinopoiskClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid Kinopoisk base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Kinopoisk base URL cannot take a path: {}", base_url));
        }

        Ok(Self { base_url, client })
    }

    /// The film id is percent-encoded as a single path segment.
    fn videos_url(&self, film_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Kinopoisk base URL cannot take a path"))?
            .pop_if_empty()
            .extend(["api", "v2.2", "films", film_id, "videos"]);
        Ok(url)
    }
}

/// YouTube trailers first, then any YouTube video, then whatever is listed first.
fn pick_trailer(items: &[VideoItem]) -> Option<&VideoItem> {
    items
        .iter()
        .find(|item| item.is_youtube() && item.is_trailer())
        .or_else(|| items.iter().find(|item| item.is_youtube()))
        .or_else(|| items.first())
}

#[async_trait]
impl TrailerProvider for KinopoiskClient {
    async fn fetch_trailer(&self, external_id: &str, keys: &ApiKeys) -> Result<Option<NewVideoSource>> {
        let Some(api_key) = keys.kinopoisk.as_deref().filter(|k| !k.is_empty()) else {
            debug!("No Kinopoisk API key configured, skipping trailer for {}", external_id);
            return Ok(None);
        };

        let resp = self
            .client
            .get(self.videos_url(external_id)?)
            .header("X-API-KEY", api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Kinopoisk request failed for {}", external_id))?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(anyhow!("Kinopoisk returned HTTP {} for {}", status, external_id));
            }
            _ => {}
        }

        let videos: VideosResponse = resp
            .json()
            .await
            .with_context(|| format!("Invalid Kinopoisk videos payload for {}", external_id))?;

        let trailer = pick_trailer(&videos.items).map(VideoItem::to_source);

        if let Some(source) = &trailer {
            info!("Found trailer for {}: {}", external_id, source.url);
        }
        Ok(trailer)
    }
}
