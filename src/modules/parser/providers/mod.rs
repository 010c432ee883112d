//! External video lookups used by the [`VideoProcessor`](super::video_processor::VideoProcessor).

use crate::modules::content::model::{Media, NewVideoSource};
use crate::modules::parser::model::ApiKeys;
use anyhow::Result;
use async_trait::async_trait;

pub mod kinopoisk;
pub mod unsupported;

pub use kinopoisk::KinopoiskClient;
pub use unsupported::UnsupportedProvider;

/// Resolves playable sources for a media item.
#[async_trait]
pub trait VideoSourceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_sources(&self, media: &Media, external_id: &str, keys: &ApiKeys) -> Result<Vec<NewVideoSource>>;
}

/// Resolves a single trailer for a media item.
#[async_trait]
pub trait TrailerProvider: Send + Sync {
    async fn fetch_trailer(&self, external_id: &str, keys: &ApiKeys) -> Result<Option<NewVideoSource>>;
}
