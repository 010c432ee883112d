use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::redis::client::RedisService;
use crate::infrastructure::storage::s3::StorageService;
use crate::modules::auth::token::TokenIssuer;
use crate::modules::content::repository::ContentRepository;
use crate::modules::parser::providers::{KinopoiskClient, UnsupportedProvider, VideoSourceProvider};
use crate::modules::parser::repository::PgParserStore;
use crate::modules::parser::service::ParserOrchestrator;
use crate::modules::parser::video_processor::VideoProcessor;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub redis: RedisService,
    pub storage: StorageService,
    pub tokens: TokenIssuer,
    pub parser: ParserOrchestrator,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        redis: RedisService,
        storage: StorageService,
    ) -> anyhow::Result<Self> {
        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            config.access_token_ttl_secs,
            config.refresh_window_secs,
        );

        let media = Arc::new(ContentRepository::new(db.clone()));
        let providers = UnsupportedProvider::defaults()
            .into_iter()
            .map(|p| Arc::new(p) as Arc<dyn VideoSourceProvider>)
            .collect();
        let trailers = Arc::new(KinopoiskClient::new(&config.kinopoisk_api_url)?);
        let processor = VideoProcessor::new(media.clone(), providers, trailers);

        let parser = ParserOrchestrator::new(
            Arc::new(PgParserStore::new(db.clone())),
            media,
            processor,
            config.parser_stale_after(),
            config.parser_cache_ttl(),
        );

        Ok(Self {
            config,
            db,
            redis,
            storage,
            tokens,
            parser,
        })
    }
}
