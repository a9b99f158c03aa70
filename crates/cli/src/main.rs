// commentbank CLI - bulk comment uploads from CSV files

mod exit_codes;
mod store;
mod upload;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commentbank_config::Settings;
use commentbank_core::ActingUser;
use commentbank_io::csv::Delimiter;
use commentbank_io::{SqliteStore, StoreError};
use commentbank_upload::{UploadError, UploadOptions};

use exit_codes::{upload_exit_code, EXIT_STORE, EXIT_SUCCESS, EXIT_UPLOAD_UNKNOWN_HANDLE, EXIT_USAGE};
use store::StoreCommands;

#[derive(Parser)]
#[command(name = "cbank")]
#[command(about = "Bulk comment bank uploads from CSV files")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// Settings file [default: ~/.config/commentbank/settings.json]
    #[arg(long, global = true, env = "COMMENTBANK_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database holding the comment bank
    #[arg(long, global = true, env = "COMMENTBANK_DB")]
    db: Option<PathBuf>,

    /// Directory where uploads wait between preview and commit
    #[arg(long, global = true, env = "COMMENTBANK_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Id of the user uploading (stamped as comment author)
    #[arg(long, global = true, env = "COMMENTBANK_USER")]
    user: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a CSV file and preview its first rows
    #[command(after_help = "\
The file needs a header row with at least three columns. Recognised
columns (any case): id, comment, contextlevel, contextid.

Examples:
  cbank upload comments.csv
  cbank upload comments.csv --delimiter semicolon --encoding windows-1252
  cbank upload comments.csv --previewrows 50 --json")]
    Upload {
        /// CSV file to upload
        file: PathBuf,

        /// Encoding label (UTF-8, windows-1252, ISO-8859-1, ... or auto)
        #[arg(long)]
        encoding: Option<String>,

        /// comma, semicolon, colon, tab or auto
        #[arg(long)]
        delimiter: Option<String>,

        /// Number of rows to preview
        #[arg(long)]
        previewrows: Option<usize>,

        /// Print the preview as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },

    /// Preview a stored upload again
    #[command(after_help = "\
Examples:
  cbank preview 1b4e28ba-2fa1-4d3b-a3f5-ef19b5a7633b --previewrows 20")]
    Preview {
        /// Import id printed by `cbank upload`
        iid: String,

        /// Number of rows to preview
        #[arg(long)]
        previewrows: Option<usize>,

        /// Print the preview as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },

    /// Add every row of a stored upload to the comment bank
    #[command(after_help = "\
Rows are inserted as read. Problems shown by the preview are not re-checked.

Examples:
  cbank commit 1b4e28ba-2fa1-4d3b-a3f5-ef19b5a7633b
  cbank commit 1b4e28ba-2fa1-4d3b-a3f5-ef19b5a7633b --json")]
    Commit {
        /// Import id printed by `cbank upload`
        iid: String,

        /// Print a JSON summary instead of the results table
        #[arg(long)]
        json: bool,
    },

    /// Discard stored uploads without adding anything
    Cancel {
        /// Import id printed by `cbank upload`
        iid: String,
    },

    /// Comment bank database
    #[command(subcommand)]
    Store(StoreCommands),
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: cbank <command> [options]");
            eprintln!("       cbank --help for more information");
            Ok(())
        }
        Some(command) => {
            let env = Env::from_args(&cli.global);
            match command {
                Commands::Upload { file, encoding, delimiter, previewrows, json } => {
                    upload::cmd_upload(&env, file, encoding, delimiter, previewrows, json)
                }
                Commands::Preview { iid, previewrows, json } => upload::cmd_preview(&env, &iid, previewrows, json),
                Commands::Commit { iid, json } => upload::cmd_commit(&env, &iid, json),
                Commands::Cancel { iid } => upload::cmd_cancel(&env, &iid),
                Commands::Store(cmd) => store::cmd_store(&env, cmd),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Settings merged with command-line overrides.
pub struct Env {
    pub settings: Settings,
    pub db_path: PathBuf,
    pub temp_dir: PathBuf,
    user: Option<i64>,
}

impl Env {
    fn from_args(args: &GlobalArgs) -> Self {
        let settings = match &args.config {
            Some(path) => Settings::load_from(path),
            None => Settings::load(),
        };
        let db_path = args.db.clone().unwrap_or_else(|| settings.effective_store_path());
        let temp_dir = args.temp_dir.clone().unwrap_or_else(|| settings.effective_temp_dir());
        let user = args.user.or(settings.user_id);
        log::debug!("store {}, uploads under {}", db_path.display(), temp_dir.display());
        Self { settings, db_path, temp_dir, user }
    }

    pub fn user(&self) -> Result<ActingUser, CliError> {
        self.user
            .map(ActingUser::new)
            .ok_or_else(|| {
                CliError::args("no acting user")
                    .with_hint("pass --user ID or set \"user.id\" in the settings file")
            })
    }

    /// Upload options from settings, with any flags given taking precedence.
    pub fn upload_options(
        &self,
        encoding: Option<String>,
        delimiter: Option<String>,
        preview_rows: Option<usize>,
    ) -> Result<UploadOptions, CliError> {
        let delimiter_name = delimiter.unwrap_or_else(|| self.settings.delimiter.clone());
        let delimiter: Delimiter = delimiter_name
            .parse()
            .map_err(|e: commentbank_io::ImportError| CliError::upload(e.into()))?;

        Ok(UploadOptions {
            encoding: encoding.unwrap_or_else(|| self.settings.encoding.clone()),
            delimiter,
            preview_rows: preview_rows.unwrap_or(self.settings.preview_rows),
        })
    }

    /// Open the comment bank, creating the file and tables if needed.
    pub fn open_store(&self) -> Result<SqliteStore, CliError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CliError::store(StoreError::Sqlite(format!("cannot create {}: {}", parent.display(), e)))
            })?;
        }
        let store = SqliteStore::open(&self.db_path).map_err(CliError::store)?;
        store.init_schema().map_err(CliError::store)?;
        Ok(store)
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn store(err: StoreError) -> Self {
        Self { code: EXIT_STORE, message: err.to_string(), hint: None }
    }

    /// Create error from upload error with proper exit code.
    pub fn upload(err: UploadError) -> Self {
        let code = upload_exit_code(&err);
        let hint = match &err {
            UploadError::FewColumns { .. } => Some("check the --delimiter setting".to_string()),
            _ if code == EXIT_UPLOAD_UNKNOWN_HANDLE => {
                Some("import ids come from `cbank upload` and are removed by commit or cancel".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
