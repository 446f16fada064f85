use foundation::Handle;
use foundation::time::Time;
use tracing::trace;

use crate::cache::{CompletionOutcome, TileCache};
use crate::protocol::StreamingConfig;
use crate::queue::{DownloadScheduler, TileFetcher};
use crate::request::FetchRequest;
use crate::residency::ResidencyState;

/// What the renderer can do with a tile right now.
#[derive(Debug)]
pub enum TileStatus<'a, I> {
    /// Never requested, or evicted.
    Missing,
    Loading,
    Ready { image: &'a I, alpha: f64 },
    Failed,
}

impl<I> TileStatus<'_, I> {
    pub fn is_ready(&self) -> bool {
        matches!(self, TileStatus::Ready { .. })
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub loaded: usize,
    pub failed: usize,
    pub stale: usize,
}

impl PollSummary {
    pub fn changed(&self) -> bool {
        self.loaded + self.failed > 0
    }
}

/// Tile cache plus download scheduler.
pub struct TilePipeline<F: TileFetcher> {
    config: StreamingConfig,
    cache: TileCache<F::Image>,
    scheduler: DownloadScheduler<F>,
}

impl<F: TileFetcher> TilePipeline<F> {
    pub fn new(config: StreamingConfig, fetcher: F) -> Self {
        Self {
            cache: TileCache::new(config.cache_capacity),
            scheduler: DownloadScheduler::new(fetcher, config.max_concurrent_downloads),
            config,
        }
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn cache(&self) -> &TileCache<F::Image> {
        &self.cache
    }

    pub fn scheduler(&self) -> &DownloadScheduler<F> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut DownloadScheduler<F> {
        &mut self.scheduler
    }

    pub fn status(&self, identifier: &str, now: Time) -> TileStatus<'_, F::Image> {
        let Some(entry) = self.cache.entry(identifier) else {
            return TileStatus::Missing;
        };
        match (entry.state(), entry.image()) {
            (ResidencyState::Resident, Some(image)) => TileStatus::Ready {
                image,
                alpha: entry.alpha_at(now),
            },
            (ResidencyState::Failed, _) => TileStatus::Failed,
            _ => TileStatus::Loading,
        }
    }

    pub fn is_fading(&self, identifier: &str, now: Time) -> bool {
        self.cache
            .entry(identifier)
            .is_some_and(|entry| entry.is_fading(now))
    }

    /// Ensures `identifier` is cached or on its way. Failed tiles are not retried.
    pub fn request(&mut self, identifier: &str, credentialed: bool) -> Handle {
        if let Some(handle) = self.cache.lookup(identifier) {
            return handle;
        }
        let handle = self.cache.insert(identifier);
        self.scheduler.request_fetch(FetchRequest {
            handle,
            identifier: identifier.to_owned(),
            credentialed,
        });
        handle
    }

    /// Applies finished downloads to the cache.
    pub fn poll(&mut self, now: Time) -> PollSummary {
        let mut summary = PollSummary::default();
        let fade_ms = self.config.fade_duration_ms;
        for completion in self.scheduler.drain_completions() {
            // A tile evicted and re-requested while its first download was in flight is
            // still waiting on that download; hand the result to the new entry.
            let handle = if self.cache.is_current(completion.handle) {
                Some(completion.handle)
            } else {
                self.cache.lookup(&completion.identifier).filter(|h| {
                    self.cache
                        .get(*h)
                        .is_some_and(|e| e.state() == ResidencyState::Requested)
                })
            };
            let Some(handle) = handle else {
                trace!(identifier = %completion.identifier, "dropping stale completion");
                summary.stale += 1;
                continue;
            };
            match self.cache.complete(handle, completion.result, now, fade_ms) {
                CompletionOutcome::Loaded => summary.loaded += 1,
                CompletionOutcome::Failed => summary.failed += 1,
                CompletionOutcome::Stale => summary.stale += 1,
            }
        }
        summary
    }
}
