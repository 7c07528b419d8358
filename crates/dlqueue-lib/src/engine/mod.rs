//! Seams to the external download engine and the platform around it.
//!
//! The core never moves bytes itself. It asks a [`DownloadEngine`] to start a
//! transfer, waits for the engine to hand back the matching [`TransferItem`],
//! and then reacts to the item's lifecycle events.

mod origin;
mod platform;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use origin::{LoggingOrigin, OriginContext, OriginEvent, OriginId};
pub use platform::{
    CompletionNotifier, DownloadDirectoryProvider, FixedDirectory, NoopCompletionNotifier,
    PlatformServices, UserDownloadsDirectory,
};
pub use types::{
    FileFilter, SaveDialogOptions, TransferEvent, TransferEvents, TransferState,
};

use std::path::PathBuf;
use tokio::sync::mpsc;
use url::Url;

/// Engine-level handle for a single transfer.
pub trait TransferItem: Send {
    fn filename(&self) -> String;

    fn mime_type(&self) -> String;

    /// Path the engine is writing to, once one has been assigned.
    fn save_path(&self) -> Option<PathBuf>;

    fn set_save_path(&mut self, path: PathBuf);

    /// Lets the user pick the destination, starting from the given options.
    fn set_save_dialog_options(&mut self, options: SaveDialogOptions);

    fn cancel(&mut self);

    /// Attaches to the item's `updated` / `done` events. Returns `None` once
    /// the events have already been taken.
    fn take_events(&mut self) -> Option<TransferEvents>;
}

pub trait DownloadEngine: Send + Sync + 'static {
    /// Registers a listener for transfers the engine discovers on behalf of
    /// `origin`. Dropping the listener removes it.
    fn watch_transfers(&self, origin: &OriginId) -> TransferListener;

    /// Starts a transfer for `url`. The resulting item is delivered to a
    /// listener registered for the same origin.
    fn download_url(&self, origin: &OriginId, url: &Url);
}

/// Receiving side of a transfer-discovery subscription.
pub struct TransferListener {
    receiver: mpsc::UnboundedReceiver<Box<dyn TransferItem>>,
}

/// Engine-side end of a [`TransferListener`].
#[derive(Clone)]
pub struct TransferSink {
    sender: mpsc::UnboundedSender<Box<dyn TransferItem>>,
}

impl TransferListener {
    pub fn channel() -> (TransferSink, TransferListener) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (TransferSink { sender }, TransferListener { receiver })
    }

    /// Waits for the next discovered transfer. `None` means the engine went away.
    pub async fn next(&mut self) -> Option<Box<dyn TransferItem>> {
        self.receiver.recv().await
    }
}

impl TransferSink {
    /// Hands the item to the listener, giving it back if the listener is gone.
    pub fn deliver(&self, item: Box<dyn TransferItem>) -> Result<(), Box<dyn TransferItem>> {
        self.sender.send(item).map_err(|err| err.0)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
