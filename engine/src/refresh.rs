//! Background feature refresh with last-request-wins semantics.
//!
//! DESIGN
//! ======
//! Each viewport change calls `request`, which aborts the fetch still in
//! flight (if any) and spawns a new one tagged with the next generation.
//! Completed fetches report through an unbounded channel; only the result
//! for the newest generation is installed into the `FeatureIndex`, so a slow
//! response for an old viewport can never overwrite a newer one.
//!
//! The index itself is only touched by the caller's thread, inside
//! `install_ready` or `settle`. Drawing never waits on a fetch.

#[cfg(test)]
#[path = "refresh_test.rs"]
mod refresh_test;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::features::{BuildingFeature, FeatureIndex, Fetcher, RefreshOutcome, SourceError};
use crate::viewport::Bounds;

struct Completed {
    generation: u64,
    bounds: Bounds,
    result: Result<Vec<BuildingFeature>, SourceError>,
}

pub struct ViewportRefresher {
    fetcher: Fetcher,
    generation: u64,
    inflight: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<Completed>,
    rx: mpsc::UnboundedReceiver<Completed>,
}

impl ViewportRefresher {
    /// Create a refresher that fetches through `index`'s source.
    #[must_use]
    pub fn new(index: &FeatureIndex) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { fetcher: index.fetcher(), generation: 0, inflight: None, tx, rx }
    }

    /// Generation of the newest request.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a fetch for the newest request is still running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inflight.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start fetching `bounds`, cancelling any earlier fetch.
    ///
    /// Returns `false` when the installed snapshot already covers `bounds`
    /// and no fetch was started. Must be called inside a Tokio runtime.
    pub fn request(&mut self, bounds: Bounds, index: &FeatureIndex) -> bool {
        if let Some(handle) = self.inflight.take() {
            if !handle.is_finished() {
                debug!(generation = self.generation, "cancelling superseded feature fetch");
            }
            handle.abort();
        }
        self.generation += 1;

        if !index.needs_fetch(&bounds) {
            debug!(generation = self.generation, "viewport covered; no fetch needed");
            return false;
        }

        let generation = self.generation;
        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();
        self.inflight = Some(tokio::spawn(async move {
            let result = fetcher.fetch(bounds).await;
            if tx.send(Completed { generation, bounds, result }).is_err() {
                debug!(generation, "refresher dropped before fetch completed");
            }
        }));
        true
    }

    /// Install the newest completed fetch, if any, without waiting.
    ///
    /// Results from superseded requests are discarded.
    pub fn install_ready(&mut self, index: &mut FeatureIndex) -> Option<RefreshOutcome> {
        let mut outcome = None;
        while let Ok(done) = self.rx.try_recv() {
            if let Some(o) = self.accept(done, index) {
                outcome = Some(o);
            }
        }
        outcome
    }

    /// Wait for the newest request to complete and install it.
    ///
    /// Returns `None` when nothing newer than the installed snapshot arrived.
    pub async fn settle(&mut self, index: &mut FeatureIndex) -> Option<RefreshOutcome> {
        if let Some(handle) = self.inflight.take() {
            if let Err(e) = handle.await {
                debug!(error = %e, generation = self.generation, "feature fetch task ended without a result");
            }
        }
        self.install_ready(index)
    }

    fn accept(&mut self, done: Completed, index: &mut FeatureIndex) -> Option<RefreshOutcome> {
        if done.generation != self.generation {
            debug!(stale = done.generation, current = self.generation, "discarding superseded fetch result");
            return None;
        }
        self.inflight = None;
        Some(index.install(done.bounds, done.result))
    }
}
