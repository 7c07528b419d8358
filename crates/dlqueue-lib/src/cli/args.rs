use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch {
        config_path: Option<String>,
        directory: Option<String>,
        filename: Option<String>,
        overwrite: bool,
        save_as: bool,
        urls: Vec<String>,
    },
}

pub struct Args {
    pub command: Command,
}

#[derive(Debug, Parser)]
#[command(
    name = "dlqueue",
    version,
    author = "Nick Guletskii",
    about = "Download files one at a time through a serialized queue"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Queue the given URLs and download them in order
    Fetch {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Optional config file (toml, yaml or json)"
        )]
        config: Option<String>,

        #[arg(
            short = 'd',
            long = "directory",
            value_name = "DIR",
            help = "Target directory (default: downloads.directory, then the user's Downloads folder)"
        )]
        directory: Option<String>,

        #[arg(
            short = 'f',
            long = "filename",
            value_name = "NAME",
            help = "Save under this name instead of the server-supplied one (single URL only)"
        )]
        filename: Option<String>,

        #[arg(long = "overwrite", help = "Replace existing files")]
        overwrite: bool,

        #[arg(
            long = "save-as",
            help = "Route the resolved path through the engine's save-as flow"
        )]
        save_as: bool,

        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn into_command(command: CliCommand) -> Command {
    match command {
        CliCommand::Fetch {
            config,
            directory,
            filename,
            overwrite,
            save_as,
            urls,
        } => Command::Fetch {
            config_path: config,
            directory,
            filename,
            overwrite,
            save_as,
            urls,
        },
    }
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();
    let log_level = log_level(cli.verbose);

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    Args {
        command: into_command(cli.command),
    }
}
