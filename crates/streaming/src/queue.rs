use std::collections::{BTreeSet, VecDeque};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::request::{Completion, FetchRequest};

pub type CompletionSender<I> = mpsc::UnboundedSender<Completion<I>>;

/// Something that can download and decode tiles.
///
/// `fetch` must not block; the result is posted on `done` exactly once, from any thread.
pub trait TileFetcher {
    type Image;

    fn fetch(&mut self, request: FetchRequest, done: CompletionSender<Self::Image>);
}

/// FIFO download queue with a concurrency cap and identifier dedup.
///
/// Completions come back over a channel and are applied when the owner calls
/// [`DownloadScheduler::drain_completions`], so all state changes happen on the
/// owner's thread.
pub struct DownloadScheduler<F: TileFetcher> {
    fetcher: F,
    max_concurrent: usize,
    in_flight: usize,
    queue: VecDeque<FetchRequest>,
    pending: BTreeSet<String>,
    tx: CompletionSender<F::Image>,
    rx: mpsc::UnboundedReceiver<Completion<F::Image>>,
}

impl<F: TileFetcher> DownloadScheduler<F> {
    pub fn new(fetcher: F, max_concurrent: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
            in_flight: 0,
            queue: VecDeque::new(),
            pending: BTreeSet::new(),
            tx,
            rx,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Queued or in flight.
    pub fn is_pending(&self, identifier: &str) -> bool {
        self.pending.contains(identifier)
    }

    /// Enqueues `request` unless its identifier is already queued or in flight.
    /// Returns whether it was accepted.
    pub fn request_fetch(&mut self, request: FetchRequest) -> bool {
        if self.pending.contains(&request.identifier) {
            trace!(identifier = %request.identifier, "fetch already pending");
            return false;
        }
        self.pending.insert(request.identifier.clone());
        self.queue.push_back(request);
        self.pump();
        true
    }

    /// Collects finished downloads, freeing their slots for queued requests.
    pub fn drain_completions(&mut self) -> Vec<Completion<F::Image>> {
        let mut done = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.pending.remove(&completion.identifier);
            done.push(completion);
        }
        if !done.is_empty() {
            self.pump();
        }
        done
    }

    fn pump(&mut self) {
        while self.in_flight < self.max_concurrent {
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            self.in_flight += 1;
            debug!(identifier = %request.identifier, in_flight = self.in_flight, "starting fetch");
            self.fetcher.fetch(request, self.tx.clone());
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::request::FetchError;
    use foundation::Handle;
    use pretty_assertions::assert_eq;

    /// Fetcher that parks requests until the test resolves them.
    #[derive(Default)]
    pub(crate) struct ManualFetcher {
        pub started: Vec<(FetchRequest, CompletionSender<u32>)>,
    }

    impl ManualFetcher {
        pub fn started_ids(&self) -> Vec<String> {
            self.started.iter().map(|(r, _)| r.identifier.clone()).collect()
        }

        /// Resolves the `n`-th started request.
        pub fn resolve(&mut self, n: usize, result: Result<u32, FetchError>) {
            let (request, done) = &self.started[n];
            done.send(Completion::for_request(request, result)).unwrap();
        }
    }

    impl TileFetcher for ManualFetcher {
        type Image = u32;

        fn fetch(&mut self, request: FetchRequest, done: CompletionSender<u32>) {
            self.started.push((request, done));
        }
    }

    fn req(id: &str) -> FetchRequest {
        FetchRequest {
            handle: Handle::new(0, 0),
            identifier: id.to_owned(),
            credentialed: false,
        }
    }

    #[test]
    fn caps_concurrency_and_runs_fifo() {
        let mut s = DownloadScheduler::new(ManualFetcher::default(), 4);
        for id in ["a", "b", "c", "d", "e", "f"] {
            assert!(s.request_fetch(req(id)));
        }
        assert_eq!(s.in_flight(), 4);
        assert_eq!(s.queued(), 2);
        assert_eq!(s.fetcher().started_ids(), vec!["a", "b", "c", "d"]);

        s.fetcher_mut().resolve(1, Ok(1));
        let done = s.drain_completions();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].identifier, "b");
        assert_eq!(s.in_flight(), 4);
        assert_eq!(s.fetcher().started_ids(), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn duplicate_identifiers_are_ignored_until_done() {
        let mut s = DownloadScheduler::new(ManualFetcher::default(), 1);
        assert!(s.request_fetch(req("a")));
        assert!(s.request_fetch(req("b")));
        assert!(!s.request_fetch(req("a")));
        assert!(!s.request_fetch(req("b")));
        assert!(s.is_pending("b"));

        s.fetcher_mut().resolve(0, Err(FetchError::Network("reset".into())));
        s.drain_completions();
        assert!(!s.is_pending("a"));
        assert!(s.request_fetch(req("a")));
    }

    #[test]
    fn failure_also_frees_the_slot() {
        let mut s = DownloadScheduler::new(ManualFetcher::default(), 1);
        s.request_fetch(req("a"));
        s.request_fetch(req("b"));
        assert_eq!(s.fetcher().started.len(), 1);
        s.fetcher_mut().resolve(0, Err(FetchError::NotFound("a".into())));
        let done = s.drain_completions();
        assert!(done[0].result.is_err());
        assert_eq!(s.fetcher().started_ids(), vec!["a", "b"]);
    }
}
