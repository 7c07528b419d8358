use crate::cli::params::FetchParams;
use crate::download::{DownloadOutcome, DownloadQueue, DownloadRequest};
use crate::engine::{
    DownloadDirectoryProvider, FixedDirectory, LoggingOrigin, OriginContext, PlatformServices,
    UserDownloadsDirectory,
};
use crate::error::DlQueueError;
use crate::http::HttpEngine;
use std::sync::Arc;
use tracing;

pub const CLI_ORIGIN: &str = "cli";

pub async fn run_fetch(params: FetchParams) -> Result<(), DlQueueError> {
    let engine = HttpEngine::new(params.user_agent.as_deref())?;
    let directories: Arc<dyn DownloadDirectoryProvider> = match params.default_directory {
        Some(directory) => Arc::new(FixedDirectory::new(directory)),
        None => Arc::new(UserDownloadsDirectory),
    };
    let queue = DownloadQueue::new(Arc::new(engine), PlatformServices::new(directories));
    let origin: Arc<dyn OriginContext> = Arc::new(LoggingOrigin::new(CLI_ORIGIN));

    tracing::info!("Queuing {} downloads", params.urls.len());
    let handles = params
        .urls
        .into_iter()
        .map(|url| {
            queue.enqueue_download_item(DownloadRequest::new(
                origin.clone(),
                url,
                params.options.clone(),
            ))
        })
        .collect::<Vec<_>>();

    let total = handles.len();
    let mut failed = 0;
    for handle in handles {
        let url = handle.url().to_string();
        match handle.wait().await {
            Ok(DownloadOutcome::Completed { save_path }) => match save_path {
                Some(save_path) => {
                    tracing::info!(url = %url, path = %save_path.display(), "Download completed")
                }
                None => tracing::info!(url = %url, "Download completed"),
            },
            Ok(DownloadOutcome::Cancelled) => tracing::warn!(url = %url, "Download cancelled"),
            Err(err) => {
                tracing::error!(url = %url, "{}", err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(DlQueueError::DownloadsFailed { failed, total });
    }

    tracing::info!("All {} downloads finished", total);
    Ok(())
}
