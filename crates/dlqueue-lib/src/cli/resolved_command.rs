use crate::cli::args::Command;
use crate::cli::params::FetchParams;
use crate::config::load_config;
use crate::download::DownloadOptions;
use crate::error::DlQueueError;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Fetch(FetchParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, DlQueueError> {
    match command {
        Command::Fetch {
            config_path,
            directory,
            filename,
            overwrite,
            save_as,
            urls,
        } => {
            if urls.is_empty() {
                return Err(DlQueueError::CliArgumentValidation {
                    details: "No URLs provided.".to_string(),
                });
            }
            if filename.is_some() && urls.len() > 1 {
                return Err(DlQueueError::CliArgumentValidation {
                    details: "--filename can only be used with a single URL.".to_string(),
                });
            }
            if filename.as_deref().is_some_and(|name| name.trim().is_empty()) {
                return Err(DlQueueError::CliArgumentValidation {
                    details: "--filename must not be empty.".to_string(),
                });
            }

            let urls = urls
                .iter()
                .map(|url| {
                    Url::parse(url).map_err(|e| DlQueueError::InvalidUrl {
                        url: url.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let app_config = load_config(config_path.as_deref())?;

            let default_directory = app_config.downloads.directory;
            if let Some(default_directory) = &default_directory
                && !default_directory.is_absolute()
            {
                return Err(DlQueueError::CliArgumentValidation {
                    details: format!(
                        "downloads.directory must be an absolute path, got {}.",
                        default_directory.display()
                    ),
                });
            }

            let mut options = DownloadOptions::default().with_overwrite(overwrite);
            if let Some(directory) = directory {
                options = options.with_directory(std::path::absolute(PathBuf::from(directory))?);
            }
            if let Some(filename) = filename {
                options = options.with_filename(filename);
            }
            if save_as {
                options = options.with_save_as(None);
            }

            Ok(ResolvedCommand::Fetch(FetchParams {
                urls,
                options,
                default_directory,
                user_agent: app_config.downloads.user_agent,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn fetch(urls: &[&str]) -> Command {
        Command::Fetch {
            config_path: None,
            directory: None,
            filename: None,
            overwrite: false,
            save_as: false,
            urls: urls.iter().map(|url| url.to_string()).collect(),
        }
    }

    fn resolve(command: Command) -> Result<FetchParams, DlQueueError> {
        resolve_command(command).map(|ResolvedCommand::Fetch(params)| params)
    }

    #[test]
    fn test_relative_directory_flag_is_made_absolute() {
        let mut command = fetch(&["https://x/a.bin"]);
        if let Command::Fetch { directory, .. } = &mut command {
            *directory = Some("out".to_string());
        }

        let params = resolve(command).unwrap();

        let directory = params.options.directory.unwrap();
        assert!(directory.is_absolute());
        assert!(directory.ends_with("out"));
    }

    #[test]
    fn test_filename_requires_single_url() {
        let mut command = fetch(&["https://x/a.bin", "https://x/b.bin"]);
        if let Command::Fetch { filename, .. } = &mut command {
            *filename = Some("custom.zip".to_string());
        }

        assert!(matches!(
            resolve(command),
            Err(DlQueueError::CliArgumentValidation { .. })
        ));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(
            resolve(fetch(&["not a url"])),
            Err(DlQueueError::InvalidUrl { url, .. }) if url == "not a url"
        ));
    }

    #[test]
    fn test_config_supplies_default_directory_and_user_agent() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[downloads]\ndirectory = \"/srv/downloads\"\nuser_agent = \"tester/1.0\"\n")
            .unwrap();
        let mut command = fetch(&["https://x/a.bin"]);
        if let Command::Fetch {
            config_path,
            save_as,
            ..
        } = &mut command
        {
            *config_path = file.path().to_str().map(str::to_string);
            *save_as = true;
        }

        let params = resolve(command).unwrap();

        assert_eq!(params.default_directory.as_deref(), Some(Path::new("/srv/downloads")));
        assert_eq!(params.user_agent.as_deref(), Some("tester/1.0"));
        assert!(params.options.directory.is_none());
        assert!(params.options.save_as);
    }

    #[test]
    fn test_relative_config_directory_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[downloads]\ndirectory = \"downloads\"\n").unwrap();
        let mut command = fetch(&["https://x/a.bin"]);
        if let Command::Fetch { config_path, .. } = &mut command {
            *config_path = file.path().to_str().map(str::to_string);
        }

        assert!(matches!(
            resolve(command),
            Err(DlQueueError::CliArgumentValidation { .. })
        ));
    }
}
