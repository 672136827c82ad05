//! # Console
//!
//! Commands shared by the interactive menu and the command line, executed
//! against any session that can browse the drive and read workbooks.
use crate::console::render::format_drive;
use crate::console::render::format_extraction;
use crate::console::render::format_items;
use crate::console::render::format_range;
use crate::console::render::format_spreadsheet_files;
use crate::error::DriveSheetError;
use crate::error::ResultMessage;
use crate::graph::model::DriveItem;
use crate::graph::DriveBrowser;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Worksheet;
use crate::spreadsheet::Extractor;
use crate::spreadsheet::WorkbookSource;
use glob::Pattern;
use tracing::warn;

pub mod menu;
pub mod render;

/// Rendering and filtering options for every command.
#[derive(Clone, Debug)]
pub struct ConsoleOptions {
    /// Shown by [`Command::Token`]
    pub access_token: String,
    /// Selects spreadsheet files among the drive's root items
    pub file_pattern: Pattern,
    /// Minimum width of each rendered cell
    pub column_width: usize,
    /// Worksheet filter for whole-document reads
    pub criteria: Criteria,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Token,
    Drive,
    Contents,
    Files,
    Read {
        file_id: String,
    },
    Range {
        file_id: String,
        worksheet: String,
        address: String,
    },
    Cell {
        file_id: String,
        worksheet: String,
        address: String,
    },
}

/// A spreadsheet file of the drive root and its worksheets.
#[derive(Clone, Debug)]
pub struct SpreadsheetFile {
    pub item: DriveItem,
    pub worksheets: Vec<Worksheet>,
}

/// Root files matching `pattern`, each with its worksheets.
///
/// A file whose worksheets cannot be listed is reported with none.
pub fn spreadsheet_files<S>(session: &S, pattern: &Pattern) -> Result<Vec<SpreadsheetFile>, DriveSheetError>
where
    S: DriveBrowser + WorkbookSource,
{
    let files = session.spreadsheet_files(pattern)?;
    Ok(files
        .into_iter()
        .map(|item| {
            let worksheets = session.list_worksheets(&item.id).unwrap_or_else(|error| {
                warn!(file = %item.name, %error, "Listing worksheets failed");
                Vec::new()
            });
            SpreadsheetFile { item, worksheets }
        })
        .collect())
}

/// Runs one command and returns its printable output.
pub fn execute<S>(session: &S, options: &ConsoleOptions, command: &Command) -> Result<String, DriveSheetError>
where
    S: DriveBrowser + WorkbookSource,
{
    let extractor = Extractor::new(session);
    match command {
        Command::Token => Ok(format!("Access token is: {}\n", options.access_token)),
        Command::Drive => Ok(format_drive(&session.drive()?)),
        Command::Contents => Ok(format_items(&session.root_children()?)),
        Command::Files => Ok(format_spreadsheet_files(&spreadsheet_files(
            session,
            &options.file_pattern,
        )?)),
        Command::Read { file_id } => extractor
            .read_whole_document(file_id, &options.criteria)
            .map(|extraction| format_extraction(&extraction, options.column_width))
            .map_err(DriveSheetError::from)
            .with_prefix(file_id),
        Command::Range {
            file_id,
            worksheet,
            address,
        } => extractor
            .read_range(file_id, worksheet, address)
            .map(|table| format_range(&table, options.column_width))
            .map_err(DriveSheetError::from)
            .with_prefix(file_id),
        Command::Cell {
            file_id,
            worksheet,
            address,
        } => extractor
            .read_cell(file_id, worksheet, address)
            .map(|value| format!("{value}\n"))
            .map_err(DriveSheetError::from)
            .with_prefix(file_id),
    }
}
