//! Background fetches for cache misses.
//!
//! [`EntityCache::read_one`](crate::cache::EntityCache::read_one) never
//! blocks: a miss hands a [`FetchRequest`] to the registered
//! [`FetchDispatcher`] and returns a placeholder. [`QueuedFetchDispatcher`]
//! forwards requests over an unbounded channel to a [`FetchQueue`], which runs
//! each fetch as its own task and releases the cache's coalescing guard when
//! the fetch settles.
//!
//! [`FetchWorker::stop`] closes the queue. Requests still waiting in it are
//! dropped and their guards released, so later reads dispatch them again.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::entity::EntityType;
use crate::error::{LibraryError, Result};
use crate::fetcher::EntityFetcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub entity_type: EntityType,
    pub id: String,
}

impl FetchRequest {
    pub fn new(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self {
            entity_type,
            id: id.into(),
        }
    }
}

/// Accepts fetch requests on behalf of the cache.
///
/// `dispatch` is called from synchronous reads and must not block.
pub trait FetchDispatcher: Send + Sync {
    fn dispatch(&self, request: FetchRequest) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct QueuedFetchDispatcher {
    sender: mpsc::UnboundedSender<FetchRequest>,
}

impl QueuedFetchDispatcher {
    /// Create a dispatcher and the queue that drains it.
    pub fn channel(fetcher: Arc<EntityFetcher>) -> (Self, FetchQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, FetchQueue { receiver, fetcher })
    }
}

impl FetchDispatcher for QueuedFetchDispatcher {
    fn dispatch(&self, request: FetchRequest) -> Result<()> {
        self.sender
            .send(request)
            .map_err(|_| LibraryError::QueueClosed)
    }
}

pub struct FetchQueue {
    receiver: mpsc::UnboundedReceiver<FetchRequest>,
    fetcher: Arc<EntityFetcher>,
}

impl FetchQueue {
    /// Run the queue on the current tokio runtime.
    pub fn spawn(self) -> FetchWorker {
        let (stop, stopped) = oneshot::channel();
        FetchWorker {
            stop,
            handle: tokio::spawn(self.run(stopped)),
        }
    }

    /// Serve requests until every dispatcher is dropped or `stopped` fires.
    /// A dropped stop sender leaves the queue running.
    pub async fn run(mut self, mut stopped: oneshot::Receiver<()>) {
        let mut listening = true;
        loop {
            tokio::select! {
                biased;
                signal = &mut stopped, if listening => match signal {
                    Ok(()) => break,
                    Err(_) => listening = false,
                },
                request = self.receiver.recv() => match request {
                    Some(request) => self.start(request),
                    None => break,
                },
            }
        }

        self.receiver.close();
        let mut dropped = 0usize;
        while let Ok(FetchRequest { entity_type, id }) = self.receiver.try_recv() {
            self.fetcher.cache().complete_fetch(entity_type, &id);
            dropped += 1;
        }
        debug!(dropped, "Fetch queue closed");
    }

    fn start(&self, request: FetchRequest) {
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move {
            let FetchRequest { entity_type, id } = request;
            match fetcher.fetch_entity(entity_type, &id).await {
                Ok(_) => debug!(%entity_type, %id, "Background fetch completed"),
                Err(e) => warn!(%entity_type, %id, error = %e, "Background fetch failed"),
            }
            fetcher.cache().complete_fetch(entity_type, &id);
        });
    }
}

/// Handle to a spawned [`FetchQueue`].
#[derive(Debug)]
pub struct FetchWorker {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl FetchWorker {
    /// Close the queue. Fetches already started run to completion; queued
    /// ones are dropped. Await the returned handle to wait for the drain.
    pub fn stop(self) -> JoinHandle<()> {
        self.stop.send(()).ok();
        self.handle
    }
}

impl std::fmt::Debug for FetchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchQueue").finish_non_exhaustive()
    }
}
