use crate::engine::{SaveDialogOptions, TransferEvents, TransferItem};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Instruction from the item holder to the task running the transfer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Directive {
    SavePath(PathBuf),
    SaveAs(SaveDialogOptions),
    Cancel,
}

pub(crate) type SharedSavePath = Arc<Mutex<Option<PathBuf>>>;

/// Handle to a transfer running inside [`super::HttpEngine`].
pub struct HttpTransferItem {
    filename: String,
    mime_type: String,
    save_path: SharedSavePath,
    directives: mpsc::UnboundedSender<Directive>,
    events: Option<TransferEvents>,
}

impl HttpTransferItem {
    pub(crate) fn new(
        filename: String,
        mime_type: String,
        save_path: SharedSavePath,
        directives: mpsc::UnboundedSender<Directive>,
        events: TransferEvents,
    ) -> Self {
        Self {
            filename,
            mime_type,
            save_path,
            directives,
            events: Some(events),
        }
    }

    fn send(&self, directive: Directive) {
        if self.directives.send(directive).is_err() {
            tracing::debug!(filename = %self.filename, "Transfer already finished, directive dropped");
        }
    }
}

impl TransferItem for HttpTransferItem {
    fn filename(&self) -> String {
        self.filename.clone()
    }

    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    fn save_path(&self) -> Option<PathBuf> {
        self.save_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_save_path(&mut self, path: PathBuf) {
        *self
            .save_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(path.clone());
        self.send(Directive::SavePath(path));
    }

    fn set_save_dialog_options(&mut self, options: SaveDialogOptions) {
        self.send(Directive::SaveAs(options));
    }

    fn cancel(&mut self) {
        self.send(Directive::Cancel);
    }

    fn take_events(&mut self) -> Option<TransferEvents> {
        self.events.take()
    }
}
