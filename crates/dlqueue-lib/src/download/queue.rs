use super::error::DownloadError;
use super::session::{SessionResult, TransferSession};
use super::types::DownloadRequest;
use crate::engine::{DownloadEngine, PlatformServices};
use crate::queue::Queue;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

struct QueuedDownload {
    request: DownloadRequest,
    completion: oneshot::Sender<SessionResult>,
}

/// Serializes downloads: one transfer is active at a time, in request order.
#[derive(Clone)]
pub struct DownloadQueue {
    queue: Queue<QueuedDownload, DownloadError>,
}

impl DownloadQueue {
    pub fn new(engine: Arc<dyn DownloadEngine>, platform: PlatformServices) -> Self {
        let queue = Queue::new(move |queued: QueuedDownload| {
            let session = TransferSession::new(queued.request, engine.clone(), platform.clone());
            async move {
                let result = session.run().await;
                let report = result.as_ref().map(|_| ()).map_err(Clone::clone);
                // The caller may have stopped waiting.
                let _ = queued.completion.send(result);
                report
            }
        });

        Self { queue }
    }

    /// Appends the request to the queue. The returned handle settles once the
    /// transfer does.
    pub fn enqueue_download_item(&self, request: DownloadRequest) -> DownloadHandle {
        let (completion, receiver) = oneshot::channel();
        let url = request.url.to_string();
        debug!(url = %url, pending = self.queue.len(), "Enqueuing download");
        self.queue.enqueue(QueuedDownload {
            request,
            completion,
        });
        DownloadHandle { url, receiver }
    }

    /// Removes the oldest request that hasn't started yet. Its handle settles
    /// with [`DownloadError::Dequeued`].
    pub fn dequeue_download_item(&self) -> Option<DownloadRequest> {
        let queued = self.queue.dequeue()?;
        let url = queued.request.url.to_string();
        debug!(url = %url, "Dequeued download before it started");
        let _ = queued.completion.send(Err(DownloadError::Dequeued { url }));
        Some(queued.request)
    }

    /// Requests waiting behind the active transfer.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        !self.queue.is_processing()
    }
}

/// Completion handle for one enqueued download.
#[derive(Debug)]
pub struct DownloadHandle {
    url: String,
    receiver: oneshot::Receiver<SessionResult>,
}

impl DownloadHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn wait(self) -> SessionResult {
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => Err(DownloadError::Abandoned { url: self.url }),
        }
    }
}
