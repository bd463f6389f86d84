//! Background refresh.
//!
//! [`RefreshWorker`] moves a [`ThumbnailCache`] onto its own thread so a
//! presentation loop can keep drawing while thumbnails are generated.
//! Requests are queued and served one at a time, so two refreshes never
//! write into the cache root concurrently.

use crate::cache::{CacheError, RefreshOutcome, ThumbnailCache};
use crate::types::SourceImage;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::debug;

type Reply = Result<RefreshOutcome, CacheError>;

struct Job {
    sources: Vec<SourceImage>,
    reply: Sender<Reply>,
}

/// Handle to a refresh that may still be running.
pub struct PendingRefresh {
    rx: Receiver<Reply>,
}

impl PendingRefresh {
    /// Block until the refresh finishes.
    pub fn wait(self) -> Reply {
        self.rx.recv().map_err(|_| CacheError::WorkerStopped)?
    }

    /// Take the result if it is ready, without blocking.
    ///
    /// `None` means the refresh is still running. Once a result has been
    /// taken, later calls report [`CacheError::WorkerStopped`].
    pub fn try_take(&self) -> Option<Reply> {
        match self.rx.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(CacheError::WorkerStopped)),
        }
    }
}

/// Owns a cache on a dedicated thread.
pub struct RefreshWorker {
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshWorker {
    pub fn spawn(mut cache: ThumbnailCache) -> Self {
        let (jobs, queue) = mpsc::channel::<Job>();
        let handle = thread::spawn(move || {
            for job in queue {
                debug!(sources = job.sources.len(), "background refresh");
                let result = cache.refresh(&job.sources);
                // The requester may have given up; that is fine.
                let _ = job.reply.send(result);
            }
        });
        Self {
            jobs: Some(jobs),
            handle: Some(handle),
        }
    }

    /// Queue a refresh of `sources`.
    pub fn submit(&self, sources: Vec<SourceImage>) -> PendingRefresh {
        let (reply, rx) = mpsc::channel();
        if let Some(jobs) = &self.jobs {
            // A send failure drops `reply`, which `wait` reports as stopped.
            let _ = jobs.send(Job { sources, reply });
        }
        PendingRefresh { rx }
    }
}

impl Drop for RefreshWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
