//! rusty-drive-sheet: read spreadsheets from a cloud drive in the terminal
//!
//! ```bash
//! # Interactive menu
//! rusty-drive-sheet
//!
//! # One-shot commands
//! rusty-drive-sheet files
//! rusty-drive-sheet --sheets 'Sales*' read 01ABCDEF
//! rusty-drive-sheet range 01ABCDEF Sheet1 A1:C3
//!
//! # With debug logging
//! RUST_LOG=debug rusty-drive-sheet
//! ```
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use rusty_drive_sheet::config::Settings;
use rusty_drive_sheet::console;
use rusty_drive_sheet::console::menu;
use rusty_drive_sheet::console::Command;
use rusty_drive_sheet::console::ConsoleOptions;
use rusty_drive_sheet::graph::auth::DeviceCodeAuth;
use rusty_drive_sheet::graph::client::GraphClient;
use rusty_drive_sheet::spreadsheet::criteria::Criteria;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rusty-drive-sheet")]
#[command(author, version, about = "Read spreadsheets from a cloud drive", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./appsettings.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only read worksheets whose name matches one of these globs
    #[arg(long, global = true, value_delimiter = ',')]
    sheets: Vec<String>,

    /// Stop after this many worksheets
    #[arg(long, global = true)]
    sheet_limit: Option<usize>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Print the access token
    Token,
    /// Show drive information
    Drive,
    /// List the items at the drive root
    Contents,
    /// List spreadsheet files and their worksheets
    Files,
    /// Read every worksheet of a file
    Read { file_id: String },
    /// Read a range of a worksheet
    Range {
        file_id: String,
        worksheet: String,
        address: String,
    },
    /// Read the first cell of a range
    Cell {
        file_id: String,
        worksheet: String,
        address: String,
    },
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Token => Command::Token,
            CliCommand::Drive => Command::Drive,
            CliCommand::Contents => Command::Contents,
            CliCommand::Files => Command::Files,
            CliCommand::Read { file_id } => Command::Read { file_id },
            CliCommand::Range {
                file_id,
                worksheet,
                address,
            } => Command::Range {
                file_id,
                worksheet,
                address,
            },
            CliCommand::Cell {
                file_id,
                worksheet,
                address,
            } => Command::Cell {
                file_id,
                worksheet,
                address,
            },
        }
    }
}

/// `RUST_LOG` when set, else `warn`; `-v` adds debug output for this crate on top.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> Result<EnvFilter> {
    let filter = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    if verbose {
        return Ok(filter.add_directive("rusty_drive_sheet=debug".parse()?));
    }
    Ok(filter)
}

fn init_logging(verbose: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), verbose)?)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let settings = Settings::load(cli.config.as_deref()).context("Missing or invalid settings")?;
    let mut criteria = Criteria::with_patterns(&cli.sheets).context("Invalid --sheets pattern")?;
    criteria.sheet_limit = cli.sheet_limit;

    let auth = DeviceCodeAuth::new(&settings).context("Failed to prepare sign-in")?;
    let token = auth
        .authenticate(|code| eprintln!("{}", code.message))
        .context("Sign-in failed")?;
    let client = GraphClient::new(&settings.graph_url, token, settings.timeout())
        .context("Failed to create drive client")?;
    if let Ok(user) = client.me() {
        info!(user = user.display_name.as_deref().unwrap_or(&user.id), "Connected");
    }

    let options = ConsoleOptions {
        access_token: client.token().secret().to_owned(),
        file_pattern: settings.file_pattern()?,
        column_width: settings.column_width,
        criteria,
    };
    match cli.command {
        Some(command) => {
            let text = console::execute(&client, &options, &command.into())?;
            print!("{text}");
        }
        None => {
            println!("Reading spreadsheets from your drive.");
            menu::run(&client, &options, io::stdin().lock(), io::stdout().lock())?;
        }
    }
    Ok(())
}
