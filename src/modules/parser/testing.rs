//! In-memory stores and providers for exercising the parser without Postgres or HTTP.

use super::model::{
    ApiKeys, HistoryAction, LogLevel, ParserHistory, ParserLog, ParserSettings, ParserState, ParserStatus,
};
use super::providers::{TrailerProvider, VideoSourceProvider};
use super::repository::ParserStore;
use crate::modules::content::model::{ContentStatus, Media, MediaType, NewVideoSource};
use crate::modules::content::repository::MediaStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub fn media(title: &str, release_date: Option<Date>) -> Media {
    let now = OffsetDateTime::now_utc();
    Media {
        id: Uuid::new_v4(),
        media_type: MediaType::Movie,
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        description: None,
        poster_url: None,
        release_date,
        rating: None,
        kinopoisk_id: Some("326".to_string()),
        status: ContentStatus::Draft,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct MemoryMediaStore {
    media: Mutex<HashMap<Uuid, Media>>,
    sources: Mutex<HashMap<Uuid, Vec<NewVideoSource>>>,
    pub fail_writes: AtomicBool,
    pub fail_listing: AtomicBool,
}

impl MemoryMediaStore {
    pub fn with(items: Vec<Media>) -> Self {
        let store = Self::default();
        {
            let mut media = store.media.lock().unwrap();
            for item in items {
                media.insert(item.id, item);
            }
        }
        store
    }

    pub fn status_of(&self, id: Uuid) -> Option<ContentStatus> {
        self.media.lock().unwrap().get(&id).map(|m| m.status)
    }

    pub fn sources_of(&self, id: Uuid) -> Vec<NewVideoSource> {
        self.sources.lock().unwrap().get(&id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn find_media(&self, id: Uuid) -> Result<Option<Media>> {
        Ok(self.media.lock().unwrap().get(&id).cloned())
    }

    async fn set_status(&self, id: Uuid, status: ContentStatus) -> Result<()> {
        if let Some(item) = self.media.lock().unwrap().get_mut(&id) {
            item.status = status;
        }
        Ok(())
    }

    async fn replace_sources(&self, media_id: Uuid, sources: &[NewVideoSource]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("write rejected"));
        }
        self.sources.lock().unwrap().insert(media_id, sources.to_vec());
        Ok(())
    }

    async fn pending_media(&self, media_types: &[MediaType], limit: i64) -> Result<Vec<Media>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(anyhow!("listing failed"));
        }
        let mut items: Vec<Media> = self
            .media
            .lock()
            .unwrap()
            .values()
            .filter(|m| matches!(m.status, ContentStatus::Draft | ContentStatus::NoSources))
            .filter(|m| m.kinopoisk_id.is_some() && media_types.contains(&m.media_type))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.title.cmp(&b.title));
        items.truncate(limit as usize);
        Ok(items)
    }
}

pub struct StaticProvider {
    name: &'static str,
    result: std::result::Result<Vec<NewVideoSource>, String>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StaticProvider {
    pub fn returning(name: &'static str, sources: Vec<NewVideoSource>) -> Self {
        Self { name, result: Ok(sources), delay: None, calls: AtomicUsize::new(0) }
    }

    /// Each lookup sleeps for `delay` before answering.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(name: &'static str) -> Self {
        Self { name, result: Err(format!("{} is down", name)), delay: None, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSourceProvider for StaticProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_sources(&self, _media: &Media, _external_id: &str, _keys: &ApiKeys) -> Result<Vec<NewVideoSource>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone().map_err(|e| anyhow!(e))
    }
}

pub struct StaticTrailer {
    trailer: Option<NewVideoSource>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl StaticTrailer {
    pub fn found(url: &str) -> Self {
        Self { trailer: Some(NewVideoSource::trailer("kinopoisk", url)), fail: false, calls: AtomicUsize::new(0) }
    }

    pub fn missing() -> Self {
        Self { trailer: None, fail: false, calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { trailer: None, fail: true, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrailerProvider for StaticTrailer {
    async fn fetch_trailer(&self, _external_id: &str, _keys: &ApiKeys) -> Result<Option<NewVideoSource>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("trailer lookup failed"));
        }
        Ok(self.trailer.clone())
    }
}

struct ParserData {
    status: ParserStatus,
    settings: ParserSettings,
    logs: Vec<ParserLog>,
    history: Vec<ParserHistory>,
    next_id: i64,
}

/// Mutex-guarded store; conditional transitions are atomic under the lock.
pub struct MemoryParserStore {
    data: Mutex<ParserData>,
}

impl Default for MemoryParserStore {
    fn default() -> Self {
        Self {
            data: Mutex::new(ParserData {
                status: ParserStatus::idle(OffsetDateTime::now_utc()),
                settings: ParserSettings::default(),
                logs: Vec::new(),
                history: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl MemoryParserStore {
    pub fn with_status(status: ParserStatus) -> Self {
        let store = Self::default();
        store.data.lock().unwrap().status = status;
        store
    }

    pub fn snapshot(&self) -> ParserStatus {
        self.data.lock().unwrap().status.clone()
    }

    pub fn logs(&self) -> Vec<ParserLog> {
        self.data.lock().unwrap().logs.clone()
    }

    pub fn history_actions(&self) -> Vec<HistoryAction> {
        self.data.lock().unwrap().history.iter().map(|h| h.action).collect()
    }
}

#[async_trait]
impl ParserStore for MemoryParserStore {
    async fn status(&self) -> Result<ParserStatus> {
        Ok(self.snapshot())
    }

    async fn transition(
        &self,
        expected: &[ParserState],
        next: ParserState,
        begin_run: Option<Uuid>,
    ) -> Result<Option<ParserStatus>> {
        let mut data = self.data.lock().unwrap();
        if !expected.contains(&data.status.status) {
            return Ok(None);
        }
        let now = OffsetDateTime::now_utc();
        data.status.status = next;
        data.status.updated_at = now;
        if let Some(run_id) = begin_run {
            data.status.run_id = Some(run_id);
            data.status.last_run = Some(now);
            data.status.processed_items = 0;
            data.status.errors.clear();
        }
        Ok(Some(data.status.clone()))
    }

    async fn reset_if_stale(&self, cutoff: OffsetDateTime) -> Result<bool> {
        let mut data = self.data.lock().unwrap();
        let stale = data.status.status == ParserState::Active
            && data.status.last_run.is_none_or(|last_run| last_run < cutoff);
        if stale {
            data.status.status = ParserState::Inactive;
            data.status.updated_at = OffsetDateTime::now_utc();
        }
        Ok(stale)
    }

    async fn increment_processed(&self, run_id: Uuid) -> Result<bool> {
        let mut data = self.data.lock().unwrap();
        let owned = data.status.owned_by(run_id);
        if owned {
            data.status.processed_items += 1;
        }
        Ok(owned)
    }

    async fn push_error(&self, run_id: Uuid, message: &str) -> Result<bool> {
        let mut data = self.data.lock().unwrap();
        let owned = data.status.owned_by(run_id);
        if owned {
            data.status.errors.push(message.to_string());
        }
        Ok(owned)
    }

    async fn finish_run(&self, run_id: Uuid) -> Result<Option<ParserStatus>> {
        let mut data = self.data.lock().unwrap();
        if !data.status.owned_by(run_id) {
            return Ok(None);
        }
        data.status.status = ParserState::Inactive;
        data.status.updated_at = OffsetDateTime::now_utc();
        Ok(Some(data.status.clone()))
    }

    async fn mark_failed(&self, run_id: Uuid, message: &str) -> Result<Option<ParserStatus>> {
        let mut data = self.data.lock().unwrap();
        if !data.status.owned_by(run_id) {
            return Ok(None);
        }
        data.status.status = ParserState::Error;
        data.status.errors.push(message.to_string());
        data.status.updated_at = OffsetDateTime::now_utc();
        Ok(Some(data.status.clone()))
    }

    async fn settings(&self) -> Result<ParserSettings> {
        Ok(self.data.lock().unwrap().settings.clone())
    }

    async fn save_settings(&self, settings: &ParserSettings) -> Result<ParserSettings> {
        self.data.lock().unwrap().settings = settings.clone();
        Ok(settings.clone())
    }

    async fn append_log(&self, level: LogLevel, message: &str) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id;
        data.next_id += 1;
        data.logs.push(ParserLog {
            id,
            level,
            message: message.to_string(),
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(())
    }

    async fn recent_logs(&self, limit: i64) -> Result<Vec<ParserLog>> {
        let data = self.data.lock().unwrap();
        Ok(data.logs.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn append_history(&self, action: HistoryAction, processed_items: i32, details: Option<&str>) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id;
        data.next_id += 1;
        data.history.push(ParserHistory {
            id,
            action,
            processed_items,
            details: details.map(str::to_string),
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(())
    }

    async fn recent_history(&self, limit: i64) -> Result<Vec<ParserHistory>> {
        let data = self.data.lock().unwrap();
        Ok(data.history.iter().rev().take(limit as usize).cloned().collect())
    }
}
