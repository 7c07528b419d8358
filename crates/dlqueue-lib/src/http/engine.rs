use super::filename::{self, FALLBACK_FILENAME, FALLBACK_MIME_TYPE};
use super::item::{Directive, HttpTransferItem, SharedSavePath};
use crate::engine::{
    DownloadEngine, OriginId, TransferEvent, TransferEvents, TransferItem, TransferListener,
    TransferSink, TransferState,
};
use crate::error::DlQueueError;
use eyre::{Result, WrapErr};
use reqwest::Response;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderName};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

type Listeners = Arc<Mutex<HashMap<OriginId, Vec<TransferSink>>>>;

pub const DEFAULT_USER_AGENT: &str = concat!("dlqueue/", env!("CARGO_PKG_VERSION"));

/// [`DownloadEngine`] that performs plain HTTP GETs with `reqwest` and
/// writes the body to the assigned save path.
#[derive(Clone)]
pub struct HttpEngine {
    client: reqwest::Client,
    listeners: Listeners,
}

impl HttpEngine {
    pub fn new(user_agent: Option<&str>) -> Result<Self, DlQueueError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            listeners: Listeners::default(),
        }
    }
}

impl DownloadEngine for HttpEngine {
    fn watch_transfers(&self, origin: &OriginId) -> TransferListener {
        let (sink, listener) = TransferListener::channel();
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        prune_closed(&mut listeners);
        listeners.entry(origin.clone()).or_default().push(sink);
        listener
    }

    fn download_url(&self, origin: &OriginId, url: &Url) {
        tokio::spawn(run_transfer(
            self.client.clone(),
            self.listeners.clone(),
            origin.clone(),
            url.clone(),
        ));
    }
}

/// Drops closed sinks and origins left without any.
fn prune_closed(listeners: &mut HashMap<OriginId, Vec<TransferSink>>) {
    listeners.retain(|_, sinks| {
        sinks.retain(|sink| !sink.is_closed());
        !sinks.is_empty()
    });
}

/// Hands the item to the oldest listener of `origin` that is still alive.
fn deliver(listeners: &Listeners, origin: &OriginId, mut item: Box<dyn TransferItem>) -> bool {
    let mut listeners = listeners.lock().unwrap_or_else(PoisonError::into_inner);
    prune_closed(&mut listeners);
    let Some(sinks) = listeners.get(origin) else {
        return false;
    };

    for sink in sinks {
        match sink.deliver(item) {
            Ok(()) => return true,
            Err(returned) => item = returned,
        }
    }
    false
}

async fn run_transfer(client: reqwest::Client, listeners: Listeners, origin: OriginId, url: Url) {
    debug!(url = %url, "Sending request");
    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(Response::error_for_status);

    let (name, mime_type) = match &response {
        Ok(response) => describe(response, &url),
        Err(_) => (
            filename::from_url(&url).unwrap_or_else(|| FALLBACK_FILENAME.to_string()),
            FALLBACK_MIME_TYPE.to_string(),
        ),
    };

    let (directives_tx, directives) = mpsc::unbounded_channel();
    let (events, item_events) = TransferEvents::channel();
    let save_path = SharedSavePath::default();
    let item = HttpTransferItem::new(
        name.clone(),
        mime_type,
        save_path.clone(),
        directives_tx,
        item_events,
    );

    if !deliver(&listeners, &origin, Box::new(item)) {
        warn!(origin = %origin, url = %url, "No listener for transfer, dropping it");
        return;
    }

    let transfer = ActiveTransfer {
        url,
        filename: name,
        save_path,
        directives,
        events,
    };
    transfer.run(response.map_err(eyre::Report::from)).await;
}

fn describe(response: &Response, url: &Url) -> (String, String) {
    let header = move |name: HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    };

    let name = header(CONTENT_DISPOSITION)
        .and_then(filename::from_content_disposition)
        .or_else(|| filename::from_url(url))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
    let mime_type = header(CONTENT_TYPE)
        .and_then(filename::mime_essence)
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());
    (name, mime_type)
}

enum Streamed {
    Completed,
    Cancelled,
}

struct ActiveTransfer {
    url: Url,
    filename: String,
    save_path: SharedSavePath,
    directives: mpsc::UnboundedReceiver<Directive>,
    events: mpsc::UnboundedSender<TransferEvent>,
}

impl ActiveTransfer {
    async fn run(mut self, response: Result<Response>) {
        let Some(target) = self.await_target().await else {
            debug!(url = %self.url, "Transfer cancelled before it started");
            self.emit(TransferEvent::Done(TransferState::Cancelled));
            return;
        };

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %self.url, "Request failed: {:#}", err);
                self.interrupt();
                return;
            }
        };

        match self.stream_to(response, &target).await {
            Ok(Streamed::Completed) => {
                info!(url = %self.url, path = %target.display(), "Saved");
                self.emit(TransferEvent::Done(TransferState::Completed));
            }
            Ok(Streamed::Cancelled) => {
                remove_partial(&target).await;
                self.emit(TransferEvent::Done(TransferState::Cancelled));
            }
            Err(err) => {
                warn!(url = %self.url, path = %target.display(), "Transfer failed: {:#}", err);
                remove_partial(&target).await;
                self.interrupt();
            }
        }
    }

    /// Waits until the holder decides where the body goes. `None` means the
    /// transfer should not proceed.
    async fn await_target(&mut self) -> Option<PathBuf> {
        match self.directives.recv().await? {
            Directive::SavePath(path) => Some(path),
            Directive::SaveAs(options) => {
                // There is no one to ask; accept the proposed location.
                let path = options.default_path?;
                *self.save_path.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(path.clone());
                Some(path)
            }
            Directive::Cancel => None,
        }
    }

    async fn stream_to(&mut self, mut response: Response, target: &Path) -> Result<Streamed> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut file = tokio::fs::File::create(target)
            .await
            .wrap_err_with(|| format!("Failed to create {}", target.display()))?;

        loop {
            tokio::select! {
                biased;
                directive = self.directives.recv() => match directive {
                    Some(Directive::Cancel) | None => return Ok(Streamed::Cancelled),
                    Some(directive) => {
                        debug!(url = %self.url, ?directive, "Ignoring directive for running transfer");
                    }
                },
                chunk = response.chunk() => {
                    match chunk.wrap_err_with(|| format!("Failed to read body of {}", self.url))? {
                        Some(bytes) => {
                            file.write_all(&bytes)
                                .await
                                .wrap_err_with(|| format!("Failed to write {}", target.display()))?;
                            self.emit(TransferEvent::Updated(TransferState::Progressing));
                        }
                        None => break,
                    }
                }
            }
        }

        file.flush()
            .await
            .wrap_err_with(|| format!("Failed to flush {}", target.display()))?;
        Ok(Streamed::Completed)
    }

    fn interrupt(&self) {
        debug!(url = %self.url, filename = %self.filename, "Transfer interrupted");
        self.emit(TransferEvent::Updated(TransferState::Interrupted));
        self.emit(TransferEvent::Done(TransferState::Interrupted));
    }

    fn emit(&self, event: TransferEvent) {
        // Observers may already be detached.
        let _ = self.events.send(event);
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial file"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), "Failed to remove partial file: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_item() -> Box<dyn TransferItem> {
        let (directives_tx, _directives) = mpsc::unbounded_channel();
        let (_events_tx, events) = TransferEvents::channel();
        Box::new(HttpTransferItem::new(
            "a.bin".to_string(),
            FALLBACK_MIME_TYPE.to_string(),
            SharedSavePath::default(),
            directives_tx,
            events,
        ))
    }

    #[tokio::test]
    async fn test_delivery_goes_to_oldest_live_listener() {
        let engine = HttpEngine::new(None).unwrap();
        let origin = OriginId::new("window-1");

        let stale = engine.watch_transfers(&origin);
        let mut live = engine.watch_transfers(&origin);
        let mut later = engine.watch_transfers(&origin);
        drop(stale);

        assert!(deliver(&engine.listeners, &origin, fake_item()));
        let item = live.next().await.expect("oldest live listener should get the item");
        assert_eq!(item.filename(), "a.bin");

        drop(live);
        assert!(deliver(&engine.listeners, &origin, fake_item()));
        assert!(later.next().await.is_some());
    }

    #[tokio::test]
    async fn test_closed_listeners_are_pruned_on_watch() {
        let engine = HttpEngine::new(None).unwrap();
        let first = OriginId::new("window-1");
        let second = OriginId::new("window-2");

        drop(engine.watch_transfers(&first));
        drop(engine.watch_transfers(&first));
        let _live = engine.watch_transfers(&second);

        let listeners = engine.listeners.lock().unwrap();
        assert!(!listeners.contains_key(&first));
        assert_eq!(listeners.get(&second).map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_delivery_without_listener_fails() {
        let engine = HttpEngine::new(None).unwrap();
        let origin = OriginId::new("window-1");
        assert!(!deliver(&engine.listeners, &origin, fake_item()));

        drop(engine.watch_transfers(&origin));
        assert!(!deliver(&engine.listeners, &origin, fake_item()));
        assert!(engine.listeners.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_as_without_default_path_cancels() {
        let (directives_tx, directives) = mpsc::unbounded_channel();
        let (events, mut item_events) = TransferEvents::channel();
        let transfer = ActiveTransfer {
            url: Url::parse("http://127.0.0.1:9/a.bin").unwrap(),
            filename: "a.bin".to_string(),
            save_path: SharedSavePath::default(),
            directives,
            events,
        };

        directives_tx
            .send(Directive::SaveAs(Default::default()))
            .unwrap();
        transfer.run(Err(eyre::eyre!("unreachable"))).await;

        assert_eq!(
            item_events.next().await,
            Some(TransferEvent::Done(TransferState::Cancelled))
        );
    }

    #[tokio::test]
    async fn test_failed_request_interrupts_once_a_path_is_assigned() {
        let (directives_tx, directives) = mpsc::unbounded_channel();
        let (events, mut item_events) = TransferEvents::channel();
        let transfer = ActiveTransfer {
            url: Url::parse("http://127.0.0.1:9/a.bin").unwrap(),
            filename: "a.bin".to_string(),
            save_path: SharedSavePath::default(),
            directives,
            events,
        };

        directives_tx
            .send(Directive::SavePath(PathBuf::from("/nonexistent/a.bin")))
            .unwrap();
        transfer.run(Err(eyre::eyre!("connection refused"))).await;

        assert_eq!(
            item_events.next().await,
            Some(TransferEvent::Updated(TransferState::Interrupted))
        );
        assert_eq!(
            item_events.next().await,
            Some(TransferEvent::Done(TransferState::Interrupted))
        );
    }
}
