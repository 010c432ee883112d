use super::model::ApiKeys;
use super::providers::{TrailerProvider, VideoSourceProvider};
use crate::modules::content::model::{ContentStatus, Media};
use crate::modules::content::repository::MediaStore;
use anyhow::{Result, anyhow};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Final state of one media item after source resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Number of playable sources saved.
    Sources(usize),
    TrailerOnly,
    NoSources,
}

impl Resolution {
    pub fn status(&self) -> ContentStatus {
        match self {
            Resolution::Sources(_) => ContentStatus::Ready,
            Resolution::TrailerOnly => ContentStatus::TrailerOnly,
            Resolution::NoSources => ContentStatus::NoSources,
        }
    }
}

/// Resolves and persists video sources for a single media item.
pub struct VideoProcessor {
    media: Arc<dyn MediaStore>,
    providers: Vec<Arc<dyn VideoSourceProvider>>,
    trailers: Arc<dyn TrailerProvider>,
}

impl VideoProcessor {
    pub fn new(
        media: Arc<dyn MediaStore>,
        providers: Vec<Arc<dyn VideoSourceProvider>>,
        trailers: Arc<dyn TrailerProvider>,
    ) -> Self {
        Self { media, providers, trailers }
    }

    pub async fn process_media_video(&self, media_id: Uuid, external_id: &str, keys: &ApiKeys) -> Result<Resolution> {
        let media = self
            .media
            .find_media(media_id)
            .await?
            .ok_or_else(|| anyhow!("Media {} not found", media_id))?;

        match self.resolve(&media, external_id, keys).await {
            Ok(resolution) => {
                info!(media_id = %media_id, "Processed '{}': {}", media.title, resolution.status());
                Ok(resolution)
            }
            Err(e) => {
                error!(media_id = %media_id, "Video processing failed for '{}': {:#}", media.title, e);
                if let Err(status_err) = self.media.set_status(media_id, ContentStatus::Failed).await {
                    warn!(media_id = %media_id, "Could not mark media as failed: {:#}", status_err);
                }
                Err(e)
            }
        }
    }

    async fn resolve(&self, media: &Media, external_id: &str, keys: &ApiKeys) -> Result<Resolution> {
        self.media.set_status(media.id, ContentStatus::Processing).await?;

        let today = OffsetDateTime::now_utc().date();
        if media.is_upcoming(today) {
            debug!(media_id = %media.id, "Not released yet, looking up trailer only");
            return self.apply_trailer(media, external_id, keys).await;
        }

        let mut sources = Vec::new();
        for provider in &self.providers {
            match provider.fetch_sources(media, external_id, keys).await {
                Ok(found) => {
                    debug!(provider = provider.name(), "Found {} sources", found.len());
                    sources.extend(found);
                }
                Err(e) => warn!(provider = provider.name(), media_id = %media.id, "Provider lookup failed: {:#}", e),
            }
        }

        if sources.is_empty() {
            return self.apply_trailer(media, external_id, keys).await;
        }

        self.media.replace_sources(media.id, &sources).await?;
        self.media.set_status(media.id, ContentStatus::Ready).await?;
        Ok(Resolution::Sources(sources.len()))
    }

    async fn apply_trailer(&self, media: &Media, external_id: &str, keys: &ApiKeys) -> Result<Resolution> {
        let resolution = match self.trailers.fetch_trailer(external_id, keys).await? {
            Some(trailer) => {
                self.media.replace_sources(media.id, &[trailer]).await?;
                Resolution::TrailerOnly
            }
            None => Resolution::NoSources,
        };

        self.media.set_status(media.id, resolution.status()).await?;
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::content::model::{NewVideoSource, SourceKind};
    use crate::modules::parser::testing::{MemoryMediaStore, StaticProvider, StaticTrailer, media};
    use std::sync::atomic::Ordering;
    use time::macros::date;

    struct Fixture {
        store: Arc<MemoryMediaStore>,
        vk: Arc<StaticProvider>,
        rutube: Arc<StaticProvider>,
        trailer: Arc<StaticTrailer>,
        processor: VideoProcessor,
    }

    fn fixture(items: Vec<Media>, vk: StaticProvider, rutube: StaticProvider, trailer: StaticTrailer) -> Fixture {
        let store = Arc::new(MemoryMediaStore::with(items));
        let vk = Arc::new(vk);
        let rutube = Arc::new(rutube);
        let trailer = Arc::new(trailer);
        let processor = VideoProcessor::new(
            store.clone(),
            vec![
                vk.clone() as Arc<dyn VideoSourceProvider>,
                rutube.clone() as Arc<dyn VideoSourceProvider>,
            ],
            trailer.clone(),
        );
        Fixture { store, vk, rutube, trailer, processor }
    }

    fn keys() -> ApiKeys {
        ApiKeys { kinopoisk: Some("key".into()), ..Default::default() }
    }

    #[tokio::test]
    async fn upcoming_release_only_looks_up_trailer() {
        let item = media("Future Film", Some(date!(2999 - 01 - 01)));
        let id = item.id;
        let f = fixture(
            vec![item],
            StaticProvider::returning("vk", vec![NewVideoSource::stream("vk", "https://vk/1")]),
            StaticProvider::returning("rutube", vec![]),
            StaticTrailer::found("https://youtu.be/t"),
        );

        let resolution = f.processor.process_media_video(id, "326", &keys()).await.unwrap();

        assert_eq!(resolution, Resolution::TrailerOnly);
        assert_eq!(f.vk.calls(), 0);
        assert_eq!(f.rutube.calls(), 0);
        assert_eq!(f.trailer.calls(), 1);
        assert_eq!(f.store.status_of(id), Some(ContentStatus::TrailerOnly));
        let sources = f.store.sources_of(id);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].kind, SourceKind::Trailer);
    }

    #[tokio::test]
    async fn upcoming_release_without_trailer_has_no_sources() {
        let item = media("Future Film", Some(date!(2999 - 01 - 01)));
        let id = item.id;
        let f = fixture(
            vec![item],
            StaticProvider::returning("vk", vec![]),
            StaticProvider::returning("rutube", vec![]),
            StaticTrailer::missing(),
        );

        let resolution = f.processor.process_media_video(id, "326", &keys()).await.unwrap();

        assert_eq!(resolution, Resolution::NoSources);
        assert_eq!(f.vk.calls(), 0);
        assert_eq!(f.store.status_of(id), Some(ContentStatus::NoSources));
    }

    #[tokio::test]
    async fn released_title_without_sources_falls_back_to_trailer_once() {
        let item = media("Old Film", Some(date!(1999 - 03 - 31)));
        let id = item.id;
        let f = fixture(
            vec![item],
            StaticProvider::returning("vk", vec![]),
            StaticProvider::returning("rutube", vec![]),
            StaticTrailer::found("https://youtu.be/t"),
        );

        let resolution = f.processor.process_media_video(id, "326", &keys()).await.unwrap();

        assert_eq!(resolution, Resolution::TrailerOnly);
        assert_eq!(f.vk.calls(), 1);
        assert_eq!(f.rutube.calls(), 1);
        assert_eq!(f.trailer.calls(), 1);
    }

    #[tokio::test]
    async fn found_sources_skip_the_trailer() {
        let item = media("Old Film", None);
        let id = item.id;
        let f = fixture(
            vec![item],
            StaticProvider::returning("vk", vec![NewVideoSource::stream("vk", "https://vk/1")]),
            StaticProvider::returning("rutube", vec![NewVideoSource::stream("rutube", "https://rutube/1")]),
            StaticTrailer::found("https://youtu.be/t"),
        );

        let resolution = f.processor.process_media_video(id, "326", &keys()).await.unwrap();

        assert_eq!(resolution, Resolution::Sources(2));
        assert_eq!(f.trailer.calls(), 0);
        assert_eq!(f.store.status_of(id), Some(ContentStatus::Ready));
        assert_eq!(f.store.sources_of(id).len(), 2);
    }

    #[tokio::test]
    async fn one_failing_provider_does_not_stop_the_others() {
        let item = media("Old Film", None);
        let id = item.id;
        let f = fixture(
            vec![item],
            StaticProvider::failing("vk"),
            StaticProvider::returning("rutube", vec![NewVideoSource::stream("rutube", "https://rutube/1")]),
            StaticTrailer::missing(),
        );

        let resolution = f.processor.process_media_video(id, "326", &keys()).await.unwrap();

        assert_eq!(resolution, Resolution::Sources(1));
        assert_eq!(f.vk.calls(), 1);
        assert_eq!(f.rutube.calls(), 1);
    }

    #[tokio::test]
    async fn store_failure_marks_media_failed() {
        let item = media("Old Film", None);
        let id = item.id;
        let f = fixture(
            vec![item],
            StaticProvider::returning("vk", vec![NewVideoSource::stream("vk", "https://vk/1")]),
            StaticProvider::returning("rutube", vec![]),
            StaticTrailer::missing(),
        );
        f.store.fail_writes.store(true, Ordering::SeqCst);

        let result = f.processor.process_media_video(id, "326", &keys()).await;

        assert!(result.is_err());
        assert_eq!(f.store.status_of(id), Some(ContentStatus::Failed));
    }

    #[tokio::test]
    async fn trailer_failure_marks_media_failed() {
        let item = media("Future Film", Some(date!(2999 - 01 - 01)));
        let id = item.id;
        let f = fixture(
            vec![item],
            StaticProvider::returning("vk", vec![]),
            StaticProvider::returning("rutube", vec![]),
            StaticTrailer::failing(),
        );

        assert!(f.processor.process_media_video(id, "326", &keys()).await.is_err());
        assert_eq!(f.store.status_of(id), Some(ContentStatus::Failed));
    }

    #[tokio::test]
    async fn unknown_media_is_an_error() {
        let f = fixture(
            vec![],
            StaticProvider::returning("vk", vec![]),
            StaticProvider::returning("rutube", vec![]),
            StaticTrailer::missing(),
        );

        assert!(f.processor.process_media_video(Uuid::new_v4(), "326", &keys()).await.is_err());
        assert_eq!(f.trailer.calls(), 0);
    }
}
