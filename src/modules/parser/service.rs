use super::dto::ParserOverview;
use super::model::{
    ApiKeys, HistoryAction, LogLevel, ParserHistory, ParserLog, ParserSettings, ParserState, ParserStatus,
};
use super::repository::ParserStore;
use super::video_processor::VideoProcessor;
use crate::common::cache::TtlCache;
use crate::common::error::{AppError, AppResult};
use crate::modules::content::repository::MediaStore;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Upper bound on items picked up by a single run.
pub const PENDING_BATCH_LIMIT: i64 = 500;

enum RunOutcome {
    Completed(i32),
    Cancelled(i32),
}

struct RunSlot {
    id: Uuid,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

struct Inner {
    store: Arc<dyn ParserStore>,
    media: Arc<dyn MediaStore>,
    processor: VideoProcessor,
    stale_after: Duration,
    cache: TtlCache<Uuid, ParserOverview>,
    current: Mutex<Option<RunSlot>>,
}

/// Owns the parser lifecycle: start/stop transitions, the background run and
/// the cached admin overview.
#[derive(Clone)]
pub struct ParserOrchestrator {
    inner: Arc<Inner>,
}

impl ParserOrchestrator {
    pub fn new(
        store: Arc<dyn ParserStore>,
        media: Arc<dyn MediaStore>,
        processor: VideoProcessor,
        stale_after: Duration,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                media,
                processor,
                stale_after,
                cache: TtlCache::new(cache_ttl),
                current: Mutex::new(None),
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<RunSlot>> {
        self.inner.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Settings and status, cached per requesting user.
    pub async fn overview(&self, user_id: Uuid) -> AppResult<ParserOverview> {
        if let Some(cached) = self.inner.cache.get(&user_id).await {
            return Ok(cached);
        }

        let overview = ParserOverview {
            settings: self.inner.store.settings().await?,
            status: self.inner.store.status().await?,
        };
        self.inner.cache.insert(user_id, overview.clone()).await;
        Ok(overview)
    }

    pub async fn status(&self) -> AppResult<ParserStatus> {
        Ok(self.inner.store.status().await?)
    }

    pub async fn settings(&self) -> AppResult<ParserSettings> {
        Ok(self.inner.store.settings().await?)
    }

    pub async fn update_settings(&self, settings: ParserSettings) -> AppResult<ParserSettings> {
        settings.validate()?;

        let saved = self.inner.store.save_settings(&settings).await?;
        self.inner.cache.invalidate_all().await;

        info!(
            "Parser settings updated: interval {}h, auto_update {}",
            saved.update_interval, saved.auto_update
        );
        Ok(saved)
    }

    pub async fn logs(&self, limit: i64) -> AppResult<Vec<ParserLog>> {
        Ok(self.inner.store.recent_logs(limit).await?)
    }

    pub async fn history(&self, limit: i64) -> AppResult<Vec<ParserHistory>> {
        Ok(self.inner.store.recent_history(limit).await?)
    }

    /// Starts a background run. Keys present in `overrides` replace the stored
    /// ones for this run only.
    pub async fn start(&self, overrides: &ApiKeys) -> AppResult<ParserStatus> {
        let store = &self.inner.store;
        let current = store.status().await?;

        if current.status == ParserState::Active {
            let now = OffsetDateTime::now_utc();
            if !current.is_stale(now, self.inner.stale_after) {
                return Err(AppError::conflict("Parser is already running"));
            }
            self.reset_stale(&current, now).await?;
        }

        let mut settings = store.settings().await?;
        settings.api_keys.merge(overrides);

        let run_id = Uuid::new_v4();
        let started = store
            .transition(&[ParserState::Inactive, ParserState::Error], ParserState::Active, Some(run_id))
            .await?
            .ok_or_else(|| AppError::conflict("Parser is already running"))?;
        self.inner.cache.invalidate_all().await;

        let announced = async {
            store.append_log(LogLevel::Info, "Parser started").await?;
            store.append_history(HistoryAction::Started, 0, None).await
        };
        if let Err(e) = announced.await {
            self.fail(run_id, &e).await;
            self.inner.cache.invalidate_all().await;
            return Err(e.into());
        }

        info!("Parser started");
        self.spawn_run(run_id, settings);
        Ok(started)
    }

    async fn reset_stale(&self, current: &ParserStatus, now: OffsetDateTime) -> AppResult<()> {
        let cutoff = now - self.inner.stale_after;
        if !self.inner.store.reset_if_stale(cutoff).await? {
            // Another request already reset or restarted it.
            return Ok(());
        }

        let last_run = current
            .last_run
            .map(|t| t.to_string())
            .unwrap_or_else(|| "never".to_string());
        warn!("Resetting stale parser run (last run: {})", last_run);

        if let Some(slot) = self.slot().take() {
            slot.cancel.cancel();
        }
        self.inner
            .store
            .append_history(
                HistoryAction::StaleReset,
                current.processed_items,
                Some(&format!("last run {}", last_run)),
            )
            .await?;
        self.inner.cache.invalidate_all().await;
        Ok(())
    }

    pub async fn stop(&self) -> AppResult<ParserStatus> {
        let store = &self.inner.store;
        let stopped = store
            .transition(&[ParserState::Active], ParserState::Inactive, None)
            .await?
            .ok_or_else(|| AppError::conflict("Parser is not running"))?;

        if let Some(slot) = self.slot().take() {
            slot.cancel.cancel();
        }
        self.inner.cache.invalidate_all().await;

        store.append_log(LogLevel::Info, "Parser stopped").await?;
        store
            .append_history(HistoryAction::Stopped, stopped.processed_items, None)
            .await?;

        info!("Parser stopped after {} items", stopped.processed_items);
        Ok(stopped)
    }

    fn spawn_run(&self, run_id: Uuid, settings: ParserSettings) {
        let cancel = CancellationToken::new();

        let mut slot = self.slot();
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
        }

        let this = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { this.run(run_id, settings, token).await });

        *slot = Some(RunSlot {
            id: run_id,
            cancel,
            handle: Some(handle),
        });
    }

    /// Waits for the current background run, if any, to finish.
    pub async fn wait_for_run(&self) {
        let handle = self.slot().as_mut().and_then(|slot| slot.handle.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Parser run task failed: {}", e);
            }
        }
    }

    async fn run(self, run_id: Uuid, settings: ParserSettings, cancel: CancellationToken) {
        match self.process_pending(run_id, &settings, &cancel).await {
            Ok(RunOutcome::Completed(processed)) => {
                if let Err(e) = self.complete(run_id, processed).await {
                    self.fail(run_id, &e).await;
                }
            }
            Ok(RunOutcome::Cancelled(processed)) => {
                info!("Parser run cancelled after {} items", processed);
            }
            Err(_) if cancel.is_cancelled() => {
                debug!("Ignoring error from a cancelled parser run");
            }
            Err(e) => self.fail(run_id, &e).await,
        }

        self.inner.cache.invalidate_all().await;

        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|s| s.id == run_id) {
            slot.take();
        }
    }

    async fn process_pending(
        &self,
        run_id: Uuid,
        settings: &ParserSettings,
        cancel: &CancellationToken,
    ) -> anyhow::Result<RunOutcome> {
        let store = &self.inner.store;
        let pending = self
            .inner
            .media
            .pending_media(&settings.content_types, PENDING_BATCH_LIMIT)
            .await?;
        info!("Parser run picked up {} items", pending.len());

        let mut processed = 0;
        for item in pending {
            if cancel.is_cancelled() {
                return Ok(RunOutcome::Cancelled(processed));
            }

            let Some(external_id) = item.kinopoisk_id.as_deref() else {
                debug!(media_id = %item.id, "Skipping media without Kinopoisk id");
                continue;
            };

            let result = self
                .inner
                .processor
                .process_media_video(item.id, external_id, &settings.api_keys)
                .await;

            // A stop or restart may have landed while the item was in flight.
            if cancel.is_cancelled() {
                return Ok(RunOutcome::Cancelled(processed));
            }

            if let Err(e) = result {
                let message = format!("{}: {:#}", item.title, e);
                warn!(media_id = %item.id, "Parser item failed: {}", message);
                if !store.push_error(run_id, &message).await? {
                    return Ok(RunOutcome::Cancelled(processed));
                }
                store.append_log(LogLevel::Error, &message).await?;
            }

            if !store.increment_processed(run_id).await? {
                return Ok(RunOutcome::Cancelled(processed));
            }
            processed += 1;
        }

        Ok(RunOutcome::Completed(processed))
    }

    async fn complete(&self, run_id: Uuid, processed: i32) -> anyhow::Result<()> {
        let store = &self.inner.store;
        if store.finish_run(run_id).await?.is_none() {
            debug!("Parser was stopped before the run completed");
            return Ok(());
        }

        store
            .append_log(LogLevel::Info, &format!("Parser finished: {} items processed", processed))
            .await?;
        store.append_history(HistoryAction::Completed, processed, None).await?;
        info!("Parser finished: {} items processed", processed);
        Ok(())
    }

    async fn fail(&self, run_id: Uuid, err: &anyhow::Error) {
        let store = &self.inner.store;
        let message = format!("{:#}", err);
        error!("Parser run failed: {}", message);

        let processed = match store.mark_failed(run_id, &message).await {
            Ok(Some(status)) => status.processed_items,
            Ok(None) => {
                debug!("Parser run {} no longer owns the status; failure not recorded", run_id);
                return;
            }
            Err(e) => {
                error!("Could not record parser failure: {:#}", e);
                store.status().await.map(|s| s.processed_items).unwrap_or_default()
            }
        };
        if let Err(e) = store
            .append_log(LogLevel::Error, &format!("Parser failed: {}", message))
            .await
        {
            error!("Could not write parser log: {:#}", e);
        }

        if let Err(e) = store
            .append_history(HistoryAction::Failed, processed, Some(&message))
            .await
        {
            error!("Could not write parser history: {:#}", e);
        }
    }
}
