//! CLI mode for gdrive-dl: mirror one Drive folder into a local directory.

mod progress;

use std::path::PathBuf;

use crate::{
    AppConfig, DriveClient, Downloader, RunSummary, access_token, build_http_client, sync_folder,
};

pub use progress::{ConsoleProgress, plan_lines, summary_lines};

/// Every transferable item is present locally.
pub const EXIT_OK: i32 = 0;
/// The run could not start or the listing failed.
pub const EXIT_FATAL: i32 = 1;
/// Some items permanently failed; running again retries them.
pub const EXIT_INCOMPLETE: i32 = 2;

/// Positional arguments of a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Remote folder identifier.
    pub folder_id: String,
    /// Local target directory.
    pub target_dir: PathBuf,
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print usage and exit.
    Help,
    /// Run a sync.
    Sync(CliArgs),
}

fn print_usage() {
    eprintln!("Usage: gdrive-dl <FOLDER_ID> <LOCAL_DIR>");
    eprintln!();
    eprintln!("Downloads every file of a Google Drive folder that is missing from LOCAL_DIR.");
    eprintln!("Run it again to retry items that failed.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GDRIVE_ACCESS_TOKEN  access token to use instead of token.json");
    eprintln!("  GDRIVE_DL_CONFIG     config file (default: <config dir>/gdrive-dl/config.toml)");
    eprintln!("  RUST_LOG             log filter (default: warn)");
}

/// Parses the arguments that follow the program name.
///
/// # Errors
///
/// Returns a message describing the problem when the arguments do not match
/// the usage.
pub fn parse_args(args: &[String]) -> std::result::Result<Command, String> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(Command::Help);
    }
    if let Some(flag) = args.iter().find(|a| a.starts_with('-')) {
        return Err(format!("unknown option: {flag}"));
    }
    match args {
        [folder_id, target_dir] => Ok(Command::Sync(CliArgs {
            folder_id: folder_id.clone(),
            target_dir: PathBuf::from(target_dir),
        })),
        _ => Err(format!("expected 2 arguments, got {}", args.len())),
    }
}

/// Maps a finished run to a process exit code.
#[must_use]
pub fn exit_code(summary: &RunSummary) -> i32 {
    if summary.is_success() {
        EXIT_OK
    } else {
        EXIT_INCOMPLETE
    }
}

/// Authenticates and runs one sync with console reporting.
///
/// # Errors
///
/// Returns an error if credentials are unusable or the run fails to set up.
pub async fn run_sync(config: AppConfig, args: &CliArgs) -> crate::Result<RunSummary> {
    let http = build_http_client(config.sync.network_timeout())?;
    let token = access_token(&http, &config.auth).await?;
    let client = DriveClient::new(http, token);

    println!("--- Fetching file list from Drive... ---");
    let downloader = Downloader::new(client, config.sync);
    sync_folder(&downloader, &args.folder_id, &args.target_dir, &ConsoleProgress::new()).await
}

/// Runs the CLI with the given arguments and returns the exit code.
pub async fn run(args: Vec<String>) -> i32 {
    let cli_args = match parse_args(&args) {
        Ok(Command::Sync(cli_args)) => cli_args,
        Ok(Command::Help) => {
            print_usage();
            return EXIT_OK;
        }
        Err(msg) => {
            eprintln!("Error: {msg}");
            eprintln!();
            print_usage();
            return EXIT_FATAL;
        }
    };

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FATAL;
        }
    };
    if config.sync.commit_mode == crate::CommitMode::InPlace {
        log::warn!("in-place commit: files left by failed transfers will be skipped on later runs");
    }

    match run_sync(config, &cli_args).await {
        Ok(summary) => exit_code(&summary),
        Err(e) => {
            log::error!("Sync aborted: {e}");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    }
}
