//! In-memory engine driven by tests.

use super::{
    CompletionNotifier, DownloadEngine, OriginContext, OriginEvent, OriginId, SaveDialogOptions,
    TransferEvent, TransferEvents, TransferItem, TransferListener, TransferSink,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use url::Url;

#[derive(Default)]
struct Registry {
    listeners: HashMap<OriginId, Vec<TransferSink>>,
}

#[derive(Clone)]
pub(crate) struct FakeEngine {
    registry: Arc<Mutex<Registry>>,
    requests_tx: mpsc::UnboundedSender<(OriginId, Url)>,
    requests_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<(OriginId, Url)>>>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        Self {
            registry: Arc::default(),
            requests_tx,
            requests_rx: Arc::new(tokio::sync::Mutex::new(requests_rx)),
        }
    }

    pub(crate) async fn next_request(&self) -> (OriginId, Url) {
        self.requests_rx
            .lock()
            .await
            .recv()
            .await
            .expect("engine request channel closed")
    }

    pub(crate) fn try_next_request(&self) -> Option<(OriginId, Url)> {
        self.requests_rx.try_lock().ok()?.try_recv().ok()
    }

    pub(crate) fn live_listeners(&self, origin: &OriginId) -> usize {
        let registry = self.registry.lock().unwrap();
        registry
            .listeners
            .get(origin)
            .map(|sinks| sinks.iter().filter(|sink| !sink.is_closed()).count())
            .unwrap_or(0)
    }

    /// Delivers a new transfer to the oldest live listener of `origin`.
    pub(crate) fn discover(&self, origin: &OriginId, filename: &str, mime: &str) -> FakeTransfer {
        let (item, transfer) = FakeTransferItem::new(filename, mime);
        let mut registry = self.registry.lock().unwrap();
        let sinks = registry.listeners.entry(origin.clone()).or_default();
        sinks.retain(|sink| !sink.is_closed());
        let sink = sinks.first().expect("no listener registered for origin");
        if sink.deliver(Box::new(item)).is_err() {
            panic!("listener closed during delivery");
        }
        transfer
    }

    /// Drops every discovery listener, as an engine shutting down would.
    pub(crate) fn shutdown_listeners(&self) {
        self.registry.lock().unwrap().listeners.clear();
    }
}

impl DownloadEngine for FakeEngine {
    fn watch_transfers(&self, origin: &OriginId) -> TransferListener {
        let (sink, listener) = TransferListener::channel();
        self.registry
            .lock()
            .unwrap()
            .listeners
            .entry(origin.clone())
            .or_default()
            .push(sink);
        listener
    }

    fn download_url(&self, origin: &OriginId, url: &Url) {
        let _ = self.requests_tx.send((origin.clone(), url.clone()));
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeItemState {
    pub(crate) save_path: Option<PathBuf>,
    pub(crate) dialog_options: Option<SaveDialogOptions>,
    pub(crate) cancel_calls: usize,
    pub(crate) save_path_calls: usize,
}

pub(crate) struct FakeTransferItem {
    filename: String,
    mime: String,
    state: Arc<Mutex<FakeItemState>>,
    events: Option<TransferEvents>,
}

impl FakeTransferItem {
    pub(crate) fn new(filename: &str, mime: &str) -> (Self, FakeTransfer) {
        let (events_tx, events) = TransferEvents::channel();
        let state = Arc::new(Mutex::new(FakeItemState::default()));
        let item = Self {
            filename: filename.to_string(),
            mime: mime.to_string(),
            state: state.clone(),
            events: Some(events),
        };
        (item, FakeTransfer { state, events_tx })
    }
}

impl TransferItem for FakeTransferItem {
    fn filename(&self) -> String {
        self.filename.clone()
    }

    fn mime_type(&self) -> String {
        self.mime.clone()
    }

    fn save_path(&self) -> Option<PathBuf> {
        let state = self.state.lock().unwrap();
        state
            .save_path
            .clone()
            .or_else(|| state.dialog_options.as_ref()?.default_path.clone())
    }

    fn set_save_path(&mut self, path: PathBuf) {
        let mut state = self.state.lock().unwrap();
        state.save_path = Some(path);
        state.save_path_calls += 1;
    }

    fn set_save_dialog_options(&mut self, options: SaveDialogOptions) {
        self.state.lock().unwrap().dialog_options = Some(options);
    }

    fn cancel(&mut self) {
        self.state.lock().unwrap().cancel_calls += 1;
    }

    fn take_events(&mut self) -> Option<TransferEvents> {
        self.events.take()
    }
}

/// Test-side control of a discovered transfer.
pub(crate) struct FakeTransfer {
    state: Arc<Mutex<FakeItemState>>,
    events_tx: mpsc::UnboundedSender<TransferEvent>,
}

impl FakeTransfer {
    /// Returns false once the session has detached its observers.
    pub(crate) fn emit(&self, event: TransferEvent) -> bool {
        self.events_tx.send(event).is_ok()
    }

    pub(crate) fn observers_attached(&self) -> bool {
        !self.events_tx.is_closed()
    }

    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&FakeItemState) -> R) -> R {
        f(&self.state.lock().unwrap())
    }
}

#[derive(Default)]
pub(crate) struct RecordingOrigin {
    id: String,
    events: Mutex<Vec<OriginEvent>>,
}

impl RecordingOrigin {
    pub(crate) fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            events: Mutex::default(),
        })
    }

    pub(crate) fn events(&self) -> Vec<OriginEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl OriginContext for RecordingOrigin {
    fn id(&self) -> OriginId {
        OriginId::new(&self.id)
    }

    fn notify(&self, event: OriginEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) fail: bool,
    finished: Mutex<Vec<PathBuf>>,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn finished(&self) -> Vec<PathBuf> {
        self.finished.lock().unwrap().clone()
    }
}

impl CompletionNotifier for RecordingNotifier {
    fn download_finished(&self, save_path: &Path) -> eyre::Result<()> {
        self.finished.lock().unwrap().push(save_path.to_path_buf());
        if self.fail {
            eyre::bail!("dock is unavailable");
        }
        Ok(())
    }
}
