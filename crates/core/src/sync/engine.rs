//! Synchronization engine implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use regex_lite::Regex;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::download_client::{DownloadClient, DownloadClientError, SubmitHandle, SubmitOptions};
use crate::listing::{ListingError, ListingSource, TorrentRecord};
use crate::matcher::EpisodeMatcher;
use crate::metrics::{LISTING_REQUESTS, TORRENT_SUBMISSIONS};
use crate::operation::{OperationRecorder, OperationResult, OperationType, ResponseCode};
use crate::titles::{TitleRecord, TitleStore};

use super::{
    AddReleaseRequest, CodenameGuard, CodenameLocks, SyncError, SyncRequest, UpdateReleaseRequest,
};

/// Everything the engine needs, passed in explicitly.
#[derive(Clone)]
pub struct SyncContext {
    pub config: SyncConfig,
    pub titles: Arc<dyn TitleStore>,
    pub listing: Arc<dyn ListingSource>,
    pub client: Arc<dyn DownloadClient>,
}

/// Per-title tally of one update pass.
#[derive(Debug, Default, Clone, Copy)]
struct BatchSummary {
    submitted: usize,
    failed: usize,
    skipped: usize,
    deferred: usize,
}

impl BatchSummary {
    fn outcome(&self, codename: &str) -> (ResponseCode, String) {
        match (self.submitted, self.failed) {
            (0, 0) => (
                ResponseCode::NoNewContent,
                format!("No new episodes for {} ({} skipped)", codename, self.skipped),
            ),
            (0, _) => (
                ResponseCode::ClientError,
                format!("Download client refused new episodes of {}", codename),
            ),
            (submitted, _) if self.failed > 0 => (
                ResponseCode::PartialSuccess,
                format!(
                    "Submitted {} episode(s) of {}, {} deferred after a client failure",
                    submitted, codename, self.deferred
                ),
            ),
            (submitted, _) => (
                ResponseCode::Success,
                format!("Submitted {} new episode(s) of {}", submitted, codename),
            ),
        }
    }
}

/// Lowercase, alphanumerics kept, everything else collapsed to `_`.
fn slugify(title: &str) -> String {
    let mapped: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '_'
            }
        })
        .collect();

    let collapsed = match Regex::new(r"_{2,}").ok() {
        Some(re) => re.replace_all(&mapped, "_").into_owned(),
        None => mapped,
    };

    let slug = collapsed.trim_matches('_');
    if slug.is_empty() {
        "title".to_string()
    } else {
        slug.to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Release synchronization engine.
///
/// Owns no global state: the store, listing source and download client all
/// come from the [`SyncContext`]. Public operations that return an
/// [`OperationResult`] never fail; the outcome is in its response code.
pub struct SyncEngine {
    ctx: SyncContext,
    matcher: EpisodeMatcher,
    locks: CodenameLocks,
}

impl SyncEngine {
    pub fn new(ctx: SyncContext) -> Self {
        let matcher = EpisodeMatcher::new(ctx.config.episode_ceiling);
        Self {
            ctx,
            matcher,
            locks: CodenameLocks::new(),
        }
    }

    /// Dispatch a tagged request.
    pub async fn execute(&self, request: SyncRequest) -> OperationResult {
        match request {
            SyncRequest::AddRelease(req) => self.add_release_by_url(req).await,
            SyncRequest::UpdateRelease(req) => self.update_release_by_name(req).await,
            SyncRequest::UpdateAll => self.update_releases().await,
            SyncRequest::Search { query } => self.search_operation(&query).await,
            SyncRequest::AddTorrent { id } => self.add_torrent(&id).await,
        }
    }

    // =========================================================================
    // Add
    // =========================================================================

    /// Bind a title to the torrent at `request.url` and submit that torrent.
    pub async fn add_release_by_url(&self, request: AddReleaseRequest) -> OperationResult {
        let mut recorder = OperationRecorder::start(OperationType::AddRelease);

        match self.add_release(&request, &mut recorder).await {
            Ok(codename) => recorder.finish(
                ResponseCode::Success,
                format!("Release {} added from {}", codename, request.url),
            ),
            Err(e) => {
                warn!(url = %request.url, error = %e, "Failed to add release");
                recorder.log_step(format!("Add failed: {}", e));
                recorder.finish(e.response_code(), e.to_string())
            }
        }
    }

    async fn add_release(
        &self,
        request: &AddReleaseRequest,
        recorder: &mut OperationRecorder,
    ) -> Result<String, SyncError> {
        // Search key for every later update.
        let display_title = request.title.trim();
        if display_title.is_empty() {
            return Err(SyncError::InvalidRequest(
                "a display title is required".to_string(),
            ));
        }

        recorder.log_step(format!("Fetching {}", request.url));
        let torrent = self.fetch(&request.url).await?;
        recorder.log_step(format!("Fetched {} ({})", torrent.guid, torrent.raw_title));

        let local = self.matcher.match_episode(request.index, request.correction)?;
        recorder.log_step(format!(
            "Episode {} with correction {} maps to local episode {}",
            request.index, request.correction, local
        ));

        let (codename, _guard) = self.lock_codename(request, display_title).await?;
        recorder.touch_title(&codename);

        let mut record = TitleRecord::new(
            &codename,
            display_title,
            request.season,
            request.correction,
            &request.url,
        )
        .with_episode_index(request.index);
        if let Some(existing) = self.ctx.titles.get(&codename)? {
            record.download_dir = existing.download_dir;
            record.release_group = existing.release_group;
        }
        if let Some(group) = non_blank(request.release_group.as_deref()) {
            record.release_group = Some(group.to_string());
        }
        if let Some(dir) = non_blank(request.download_dir.as_deref()) {
            record.download_dir = Some(dir.to_string());
        }

        recorder.touch_torrent(&torrent.guid);
        let handle = self.submit(&torrent, &self.submit_options(&record)).await?;
        recorder.log_step(format!("Submitted {} as {}", torrent.guid, handle.id));

        record.accept(&torrent, local);
        self.ctx.titles.put(&record)?;
        recorder.log_step(format!("Stored title {}", codename));

        info!(codename = %codename, guid = %torrent.guid, "Release added");
        Ok(codename)
    }

    /// Resolve the codename and take its lock. Resolution is repeated under
    /// the lock until it is stable, so a concurrent add cannot grab the same
    /// free slug in between.
    async fn lock_codename(
        &self,
        request: &AddReleaseRequest,
        display_title: &str,
    ) -> Result<(String, CodenameGuard), SyncError> {
        let mut codename = self.resolve_codename(request, display_title)?;
        loop {
            let guard = self.locks.acquire(&codename).await;
            let current = self.resolve_codename(request, display_title)?;
            if current == codename {
                return Ok((codename, guard));
            }
            codename = current;
        }
    }

    /// Supplied codename, else the one already bound to the URL, else a
    /// free slug of the display title.
    fn resolve_codename(
        &self,
        request: &AddReleaseRequest,
        display_title: &str,
    ) -> Result<String, SyncError> {
        if let Some(codename) = non_blank(request.codename.as_deref()) {
            return Ok(codename.to_string());
        }

        if let Some(bound) = self.ctx.titles.resolve_by_url(&request.url)? {
            return Ok(bound);
        }

        let base = slugify(display_title);
        if self.ctx.titles.get(&base)?.is_none() {
            return Ok(base);
        }

        let seasoned = format!("{}_s{}", base, request.season);
        if self.ctx.titles.get(&seasoned)?.is_none() {
            return Ok(seasoned);
        }

        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", seasoned, n);
            if self.ctx.titles.get(&candidate)?.is_none() {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Submit every new episode of one title, oldest first.
    pub async fn update_release_by_name(&self, request: UpdateReleaseRequest) -> OperationResult {
        let mut recorder = OperationRecorder::start(OperationType::UpdateOne);
        recorder.touch_title(&request.codename);

        let _guard = self.locks.acquire(&request.codename).await;

        match self.update_title(&request, &mut recorder).await {
            Ok(summary) => {
                let (code, message) = summary.outcome(&request.codename);
                recorder.finish(code, message)
            }
            Err(e) => {
                warn!(codename = %request.codename, error = %e, "Title update failed");
                recorder.log_step(format!("Update failed: {}", e));
                recorder.finish(e.response_code(), e.to_string())
            }
        }
    }

    async fn update_title(
        &self,
        request: &UpdateReleaseRequest,
        recorder: &mut OperationRecorder,
    ) -> Result<BatchSummary, SyncError> {
        let mut record = self
            .ctx
            .titles
            .get(&request.codename)?
            .ok_or_else(|| SyncError::TitleNotFound(request.codename.clone()))?;

        recorder.log_step(format!("Searching for '{}'", record.search_query()));
        let found = self.search(record.search_query()).await?;
        recorder.log_step(format!("Listing source returned {} result(s)", found.len()));

        let mut candidates: Vec<TorrentRecord> = found
            .into_iter()
            .filter(|t| {
                let keep = record.matches(t);
                if !keep {
                    recorder.log_step(format!(
                        "Ignoring {}: '{}' does not match '{}'",
                        t.guid, t.raw_title, record.display_title
                    ));
                }
                keep
            })
            .collect();
        candidates.sort_by_key(|t| t.publish_date);

        let mut summary = BatchSummary::default();
        let newest = candidates.len().checked_sub(1);
        let mut qualifying = Vec::new();

        // Newness is judged against the state before this pass, so episodes
        // published together all qualify.
        for (i, torrent) in candidates.iter().enumerate() {
            let forced = request.force && Some(i) == newest;
            if !forced && !record.is_new(torrent) {
                recorder.log_step(format!("Skipping {}: already seen", torrent.guid));
                summary.skipped += 1;
                continue;
            }
            if forced {
                recorder.log_step(format!("Forcing resubmission of {}", torrent.guid));
            }

            match self
                .matcher
                .match_episode(torrent.published_episode, record.correction)
            {
                Ok(local) => qualifying.push((torrent, local)),
                Err(e) => {
                    recorder.log_step(format!("Skipping {}: {}", torrent.guid, e));
                    summary.skipped += 1;
                }
            }
        }

        let options = self.submit_options(&record);
        let mut pending = qualifying.into_iter();
        while let Some((torrent, local)) = pending.next() {
            recorder.touch_torrent(&torrent.guid);
            match self.submit(torrent, &options).await {
                Ok(handle) => {
                    record.accept(torrent, local);
                    self.ctx.titles.put(&record)?;
                    summary.submitted += 1;
                    recorder.log_step(format!(
                        "Submitted {} (episode {}) as {}",
                        torrent.guid, local, handle.id
                    ));
                }
                Err(e) => {
                    summary.failed += 1;
                    recorder.log_step(format!("Submit of {} failed: {}", torrent.guid, e));
                    for (rest, _) in pending.by_ref() {
                        summary.deferred += 1;
                        recorder.log_step(format!("Deferred {} to the next run", rest.guid));
                    }
                    break;
                }
            }
        }

        Ok(summary)
    }

    /// Update every tracked title.
    pub async fn update_releases(&self) -> OperationResult {
        let mut recorder = OperationRecorder::start(OperationType::UpdateAll);

        let titles = match self.ctx.titles.list_all() {
            Ok(titles) => titles,
            Err(e) => {
                let e = SyncError::from(e);
                recorder.log_step(format!("Cannot list titles: {}", e));
                return recorder.finish(e.response_code(), e.to_string());
            }
        };

        if titles.is_empty() {
            return recorder.finish(ResponseCode::NoNewContent, "No titles are tracked");
        }

        let total = titles.len();
        let concurrency = self.ctx.config.max_concurrent_titles.max(1);
        let results: Vec<(String, OperationResult)> =
            stream::iter(titles.into_iter().map(|t| t.codename))
                .map(move |codename| async move {
                    let result = self
                        .update_release_by_name(UpdateReleaseRequest::new(codename.clone()))
                        .await;
                    (codename, result)
                })
                .buffered(concurrency)
                .collect()
                .await;

        let mut failed = 0;
        let mut partial = 0;
        let mut succeeded = 0;
        for (codename, result) in &results {
            recorder.absorb(codename, result);
            match result.response_code {
                code if code.is_failure() => {
                    failed += 1;
                    recorder.log_step(format!(
                        "{} failed ({}): {}",
                        codename,
                        code.as_str(),
                        result.status_message
                    ));
                }
                ResponseCode::PartialSuccess => partial += 1,
                ResponseCode::Success => succeeded += 1,
                _ => {}
            }
        }

        let code = if failed == total {
            ResponseCode::ClientError
        } else if failed > 0 || partial > 0 {
            ResponseCode::PartialSuccess
        } else if succeeded > 0 {
            ResponseCode::Success
        } else {
            ResponseCode::NoNewContent
        };

        recorder.finish(
            code,
            format!(
                "Updated {} title(s): {} with new episodes, {} partial, {} failed",
                total, succeeded, partial, failed
            ),
        )
    }

    // =========================================================================
    // Passthrough
    // =========================================================================

    pub async fn search_torrents(&self, query: &str) -> Result<Vec<TorrentRecord>, SyncError> {
        Ok(self.search(query).await?)
    }

    pub async fn get_torrent(&self, id: &str) -> Result<TorrentRecord, SyncError> {
        Ok(self.fetch(id).await?)
    }

    /// Submit one torrent by listing-source id, outside any tracked title.
    pub async fn add_torrent(&self, id: &str) -> OperationResult {
        let mut recorder = OperationRecorder::start(OperationType::AddTorrent);

        match self.fetch_and_submit(id, &mut recorder).await {
            Ok(handle) => {
                recorder.log_step(format!("Submitted {} as {}", id, handle.id));
                recorder.finish(ResponseCode::Success, format!("Torrent {} added", id))
            }
            Err(e) => {
                recorder.log_step(format!("Add of {} failed: {}", id, e));
                let code = match &e {
                    SyncError::Source(ListingError::NotFound(_)) => ResponseCode::NotFound,
                    _ => e.response_code(),
                };
                recorder.finish(code, e.to_string())
            }
        }
    }

    async fn fetch_and_submit(
        &self,
        id: &str,
        recorder: &mut OperationRecorder,
    ) -> Result<SubmitHandle, SyncError> {
        let torrent = self.fetch(id).await?;
        recorder.touch_torrent(&torrent.guid);
        let options = SubmitOptions {
            download_dir: None,
            category: self.ctx.config.category.clone(),
        };
        Ok(self.submit(&torrent, &options).await?)
    }

    pub async fn list_downloads(&self) -> Result<Vec<SubmitHandle>, SyncError> {
        let result = self
            .bounded(self.ctx.client.list())
            .await
            .unwrap_or(Err(DownloadClientError::Timeout));
        Ok(result?)
    }

    pub async fn list_titles(&self) -> Result<Vec<TitleRecord>, SyncError> {
        Ok(self.ctx.titles.list_all()?)
    }

    async fn search_operation(&self, query: &str) -> OperationResult {
        let mut recorder = OperationRecorder::start(OperationType::Search);
        recorder.log_step(format!("Searching for '{}'", query));

        match self.search(query).await {
            Ok(found) if found.is_empty() => {
                recorder.finish(ResponseCode::NoNewContent, format!("Nothing found for '{}'", query))
            }
            Ok(found) => {
                for torrent in &found {
                    recorder.touch_torrent(&torrent.guid);
                }
                recorder.finish(
                    ResponseCode::Success,
                    format!("Found {} torrent(s) for '{}'", found.len(), query),
                )
            }
            Err(e) => {
                let e = SyncError::from(e);
                recorder.log_step(format!("Search failed: {}", e));
                recorder.finish(e.response_code(), e.to_string())
            }
        }
    }

    // =========================================================================
    // Bounded external calls
    // =========================================================================

    fn submit_options(&self, record: &TitleRecord) -> SubmitOptions {
        SubmitOptions {
            download_dir: record.download_dir.clone(),
            category: self.ctx.config.category.clone(),
        }
    }

    async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, tokio::time::error::Elapsed> {
        tokio::time::timeout(Duration::from_millis(self.ctx.config.call_timeout_ms), fut).await
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentRecord>, ListingError> {
        let result = self
            .bounded(self.ctx.listing.search(query))
            .await
            .unwrap_or(Err(ListingError::Timeout));
        record_listing("search", &result);
        result
    }

    async fn fetch(&self, id: &str) -> Result<TorrentRecord, ListingError> {
        let result = self
            .bounded(self.ctx.listing.fetch(id))
            .await
            .unwrap_or(Err(ListingError::Timeout));
        record_listing("fetch", &result);
        result
    }

    async fn submit(
        &self,
        torrent: &TorrentRecord,
        options: &SubmitOptions,
    ) -> Result<SubmitHandle, DownloadClientError> {
        let result = self
            .bounded(self.ctx.client.submit(torrent, options))
            .await
            .unwrap_or(Err(DownloadClientError::Timeout));

        let label = match &result {
            Ok(_) => "success",
            Err(DownloadClientError::Timeout) => "timeout",
            Err(_) => "failed",
        };
        TORRENT_SUBMISSIONS
            .with_label_values(&[self.ctx.client.name(), label])
            .inc();
        result
    }
}

fn record_listing<T>(operation: &str, result: &Result<T, ListingError>) {
    let label = match result {
        Ok(_) => "success",
        Err(ListingError::Timeout) => "timeout",
        Err(_) => "failed",
    };
    LISTING_REQUESTS.with_label_values(&[operation, label]).inc();
}
