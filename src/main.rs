use clap::{ArgAction, Parser, Subcommand};
use pkgimage::core::ImageError;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod cli;

/// Exit code of an operation interrupted with Ctrl-C
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "pkgimage")]
#[command(about = "Reproducible deployment of package images")]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Package cache directory (overrides the config file)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Installer executable (overrides the config file)
    #[arg(long, global = true)]
    installer: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the content-addressed id of an image
    Id {
        /// Image file (YAML)
        image: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bring every package of an image into the local cache
    Cache {
        /// Image file (YAML)
        image: PathBuf,
    },
    /// Deploy an image onto a target directory
    Deploy {
        /// Image file (YAML)
        image: PathBuf,
        /// Installation directory to reconcile with the image
        #[arg(short, long)]
        target: PathBuf,
    },
    /// List the packages installed in a target directory
    Installed {
        /// Installation directory
        target: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let overrides = cli::ConfigOverrides {
        cache_dir: cli.cache_dir,
        installer: cli.installer,
    };

    let result = match cli.command {
        Commands::Id { image, json } => cli::id::run(&image, json),
        Commands::Cache { image } => cli::cache::run(&image, &overrides, &cancel).await,
        Commands::Deploy { image, target } => {
            cli::deploy::run(&image, &target, &overrides, &cancel).await
        }
        Commands::Installed { target } => cli::installed::run(&target),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ ImageError::Cancelled(_)) => {
            eprintln!("{}", e);
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
