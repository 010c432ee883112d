use crate::common::error::{AppError, AppResult};
use crate::modules::parser::model::{ApiKeys, ParserSettings, ParserStatus};
use crate::modules::parser::service::ParserOrchestrator;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How often the worker re-reads the parser settings.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub async fn start_auto_update_worker(parser: ParserOrchestrator, cancel: CancellationToken) {
    info!("⏱️ Starting parser auto-update worker");

    let mut ticker = tokio::time::interval(CHECK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let Err(e) = tick(&parser, OffsetDateTime::now_utc()).await {
            warn!("Auto-update check failed: {}", e);
        }
    }

    info!("⏱️ Parser auto-update worker stopped");
}

/// Auto-update is on and the configured interval has passed since the last run.
pub(crate) fn is_due(settings: &ParserSettings, status: &ParserStatus, now: OffsetDateTime) -> bool {
    settings.auto_update
        && status
            .last_run
            .is_none_or(|last_run| now - last_run >= settings.update_period())
}

/// Starts a run when one is due; returns whether a run was started.
pub(crate) async fn tick(parser: &ParserOrchestrator, now: OffsetDateTime) -> AppResult<bool> {
    let settings = parser.settings().await?;
    let status = parser.status().await?;

    if !is_due(&settings, &status, now) {
        debug!("Auto-update not due");
        return Ok(false);
    }

    info!("🔄 Auto-update due, starting parser");
    match parser.start(&ApiKeys::default()).await {
        Ok(_) => Ok(true),
        Err(AppError::Conflict(reason)) => {
            debug!("Auto-update skipped: {}", reason);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
