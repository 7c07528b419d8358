use super::error::DownloadError;
use super::types::{DownloadOutcome, DownloadRequest};
use crate::engine::{
    DownloadEngine, OriginEvent, PlatformServices, SaveDialogOptions, TransferEvent,
    TransferEvents, TransferItem, TransferState,
};
use crate::path::resolve_save_path;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type SessionResult = Result<DownloadOutcome, DownloadError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the engine to report the transfer.
    Pending,
    /// Save target assigned, observing lifecycle events.
    Discovered,
    Settled,
}

/// Binds one [`DownloadRequest`] to one engine transfer and produces exactly
/// one result for it.
pub struct TransferSession {
    request: DownloadRequest,
    engine: Arc<dyn DownloadEngine>,
    platform: PlatformServices,
    state: SessionState,
    item: Option<Box<dyn TransferItem>>,
    events: Option<TransferEvents>,
    filename: String,
}

impl TransferSession {
    pub fn new(
        request: DownloadRequest,
        engine: Arc<dyn DownloadEngine>,
        platform: PlatformServices,
    ) -> Self {
        Self {
            request,
            engine,
            platform,
            state: SessionState::Pending,
            item: None,
            events: None,
            filename: String::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drives the transfer until the engine reports a terminal event.
    pub async fn run(mut self) -> SessionResult {
        let origin = self.request.origin.id();
        let mut listener = self.engine.watch_transfers(&origin);
        debug!(origin = %origin, url = %self.request.url, "Requesting transfer");
        self.engine.download_url(&origin, &self.request.url);

        let Some(item) = listener.next().await else {
            return self.settle(Err(self.engine_disconnected()));
        };
        // Discovery is one-shot.
        drop(listener);

        if let Err(err) = self.on_transfer_discovered(item) {
            return self.settle(Err(err));
        }

        loop {
            let event = match self.events.as_mut() {
                Some(events) => events.next().await,
                None => None,
            };

            let settled = match event {
                Some(TransferEvent::Updated(state)) => self.on_updated(state),
                Some(TransferEvent::Done(state)) => Some(self.on_done(state)),
                None => {
                    self.cleanup();
                    Some(self.settle(Err(self.engine_disconnected())))
                }
            };

            if let Some(result) = settled {
                return result;
            }
        }
    }

    fn on_transfer_discovered(&mut self, mut item: Box<dyn TransferItem>) -> Result<(), DownloadError> {
        self.state = SessionState::Discovered;
        self.filename = item.filename();
        let options = &self.request.options;

        // Nothing has been assigned yet; the engine transfer is cancelled so
        // it doesn't keep running without a target.
        if let Err(err) = options.validate() {
            item.cancel();
            return Err(err);
        }

        let directory = match &options.directory {
            Some(directory) => directory.clone(),
            None => match self.platform.directories.download_dir() {
                Ok(directory) => directory,
                Err(err) => {
                    item.cancel();
                    return Err(err);
                }
            },
        };

        let save_path = resolve_save_path(
            options.filename.as_deref(),
            &self.filename,
            &item.mime_type(),
            &directory,
            options.overwrite,
        );

        if options.save_as {
            let dialog = SaveDialogOptions::with_default_path(save_path.clone())
                .merged_with(options.dialog_options.as_ref());
            debug!(url = %self.request.url, default_path = %save_path.display(), "Asking for save location");
            item.set_save_dialog_options(dialog);
        } else {
            debug!(url = %self.request.url, path = %save_path.display(), "Assigning save path");
            item.set_save_path(save_path);
        }

        self.events = item.take_events();
        self.item = Some(item);

        self.request.origin.notify(OriginEvent::DownloadStarted {
            url: self.request.url.clone(),
        });
        Ok(())
    }

    fn on_updated(&mut self, state: TransferState) -> Option<SessionResult> {
        if state != TransferState::Interrupted {
            return None;
        }

        self.cleanup();
        let result = self.settle(Err(self.interrupted()));
        if let Some(item) = self.item.as_mut() {
            item.cancel();
        }
        Some(result)
    }

    fn on_done(&mut self, state: TransferState) -> SessionResult {
        self.cleanup();
        match state {
            TransferState::Cancelled => self.settle(Ok(DownloadOutcome::Cancelled)),
            TransferState::Interrupted => self.settle(Err(self.interrupted())),
            TransferState::Completed => {
                let save_path = self.item.as_ref().and_then(|item| item.save_path());
                if let Some(path) = &save_path {
                    self.notify_finished(path);
                }
                self.settle(Ok(DownloadOutcome::Completed { save_path }))
            }
            TransferState::Progressing => {
                self.settle(Err(DownloadError::UnexpectedTerminalState {
                    filename: self.filename.clone(),
                    state,
                }))
            }
        }
    }

    fn notify_finished(&self, path: &Path) {
        if let Err(err) = self.platform.completion.download_finished(path) {
            warn!(path = %path.display(), "Completion notification failed: {:#}", err);
        }
    }

    /// Detaches the lifecycle observers. Safe to call more than once.
    fn cleanup(&mut self) {
        if self.events.take().is_some() {
            debug!(url = %self.request.url, "Detached transfer observers");
        }
    }

    fn settle(&mut self, result: SessionResult) -> SessionResult {
        debug_assert_ne!(self.state, SessionState::Settled, "session settled twice");
        self.state = SessionState::Settled;
        match &result {
            Ok(outcome) => info!(url = %self.request.url, ?outcome, "Transfer settled"),
            Err(err) => debug!(url = %self.request.url, "Transfer failed: {}", err),
        }
        result
    }

    fn interrupted(&self) -> DownloadError {
        DownloadError::Interrupted {
            filename: self.filename.clone(),
        }
    }

    fn engine_disconnected(&self) -> DownloadError {
        DownloadError::EngineDisconnected {
            url: self.request.url.to_string(),
        }
    }
}
