use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Lifecycle state reported by the engine with `updated` and `done` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferState {
    /// Any in-flight state the core does not react to.
    Progressing,
    Interrupted,
    Cancelled,
    Completed,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::Progressing => "progressing",
            TransferState::Interrupted => "interrupted",
            TransferState::Cancelled => "cancelled",
            TransferState::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    Updated(TransferState),
    Done(TransferState),
}

/// File type filter shown by a save-as dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

/// Options handed to the engine's save-as dialog. Unknown keys are passed
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDialogOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FileFilter>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SaveDialogOptions {
    pub fn with_default_path(path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Overlays `overrides` on top of `self`. Every field set in `overrides`
    /// wins, including `default_path`.
    pub fn merged_with(mut self, overrides: Option<&SaveDialogOptions>) -> Self {
        let Some(overrides) = overrides else {
            return self;
        };

        if overrides.title.is_some() {
            self.title = overrides.title.clone();
        }
        if overrides.default_path.is_some() {
            self.default_path = overrides.default_path.clone();
        }
        if overrides.button_label.is_some() {
            self.button_label = overrides.button_label.clone();
        }
        if overrides.message.is_some() {
            self.message = overrides.message.clone();
        }
        if !overrides.filters.is_empty() {
            self.filters = overrides.filters.clone();
        }
        self.extra.extend(
            overrides
                .extra
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        self
    }
}

/// Stream of lifecycle events for a single transfer.
///
/// Dropping it detaches the observers; the engine sees a closed channel.
#[derive(Debug)]
pub struct TransferEvents {
    receiver: mpsc::UnboundedReceiver<TransferEvent>,
}

impl TransferEvents {
    pub fn channel() -> (mpsc::UnboundedSender<TransferEvent>, TransferEvents) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, TransferEvents { receiver })
    }

    pub async fn next(&mut self) -> Option<TransferEvent> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_without_overrides_keeps_default_path() {
        let merged = SaveDialogOptions::with_default_path("/tmp/out/a.pdf").merged_with(None);
        assert_eq!(merged.default_path, Some(PathBuf::from("/tmp/out/a.pdf")));
    }

    #[test]
    fn test_caller_options_override_resolved_path() {
        let caller = SaveDialogOptions {
            title: Some("Save report".to_string()),
            default_path: Some(PathBuf::from("/srv/elsewhere.pdf")),
            ..SaveDialogOptions::default()
        };

        let merged = SaveDialogOptions::with_default_path("/tmp/out/a.pdf").merged_with(Some(&caller));

        assert_eq!(merged.title.as_deref(), Some("Save report"));
        assert_eq!(merged.default_path, Some(PathBuf::from("/srv/elsewhere.pdf")));
    }

    #[test]
    fn test_unknown_dialog_keys_pass_through() {
        let caller: SaveDialogOptions = serde_json::from_value(serde_json::json!({
            "buttonLabel": "Keep",
            "showsTagField": false
        }))
        .expect("dialog options should deserialize");

        let merged = SaveDialogOptions::with_default_path("/tmp/a").merged_with(Some(&caller));

        assert_eq!(merged.button_label.as_deref(), Some("Keep"));
        assert_eq!(
            merged.extra.get("showsTagField"),
            Some(&serde_json::Value::Bool(false))
        );
        assert_eq!(merged.default_path, Some(PathBuf::from("/tmp/a")));
    }

    #[test]
    fn test_transfer_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransferState::Interrupted).unwrap(),
            "\"interrupted\""
        );
        assert_eq!(TransferState::Completed.to_string(), "completed");
    }
}
