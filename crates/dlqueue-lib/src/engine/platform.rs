use crate::download::DownloadError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Supplies the directory used when a request doesn't name one.
pub trait DownloadDirectoryProvider: Send + Sync {
    /// Must return an absolute path.
    fn download_dir(&self) -> Result<PathBuf, DownloadError>;
}

/// Platform-level "download finished" indication. Best effort only.
pub trait CompletionNotifier: Send + Sync {
    fn download_finished(&self, save_path: &Path) -> eyre::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FixedDirectory(PathBuf);

impl FixedDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl DownloadDirectoryProvider for FixedDirectory {
    fn download_dir(&self) -> Result<PathBuf, DownloadError> {
        if !self.0.is_absolute() {
            return Err(DownloadError::DefaultDirectory {
                reason: format!("{} is not an absolute path", self.0.display()),
            });
        }
        Ok(self.0.clone())
    }
}

/// `$XDG_DOWNLOAD_DIR`, falling back to `$HOME/Downloads`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserDownloadsDirectory;

impl DownloadDirectoryProvider for UserDownloadsDirectory {
    fn download_dir(&self) -> Result<PathBuf, DownloadError> {
        let from_env = |name: &str| {
            std::env::var_os(name)
                .map(PathBuf::from)
                .filter(|path| path.is_absolute())
        };

        from_env("XDG_DOWNLOAD_DIR")
            .or_else(|| from_env("HOME").map(|home| home.join("Downloads")))
            .ok_or_else(|| DownloadError::DefaultDirectory {
                reason: "neither XDG_DOWNLOAD_DIR nor HOME is set to an absolute path"
                    .to_string(),
            })
    }
}

/// For platforms without a finished-download indicator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompletionNotifier;

impl CompletionNotifier for NoopCompletionNotifier {
    fn download_finished(&self, _save_path: &Path) -> eyre::Result<()> {
        Ok(())
    }
}

/// Collaborators a transfer session calls into besides the engine.
#[derive(Clone)]
pub struct PlatformServices {
    pub directories: Arc<dyn DownloadDirectoryProvider>,
    pub completion: Arc<dyn CompletionNotifier>,
}

impl PlatformServices {
    pub fn new(directories: Arc<dyn DownloadDirectoryProvider>) -> Self {
        Self {
            directories,
            completion: Arc::new(NoopCompletionNotifier),
        }
    }

    pub fn with_completion_notifier(mut self, completion: Arc<dyn CompletionNotifier>) -> Self {
        self.completion = completion;
        self
    }
}

impl Default for PlatformServices {
    fn default() -> Self {
        Self::new(Arc::new(UserDownloadsDirectory))
    }
}
