//! Plain-text rendering of tables and drive listings.
use crate::console::SpreadsheetFile;
use crate::database::table::Table;
use crate::graph::model::Drive;
use crate::graph::model::DriveItem;
use crate::spreadsheet::sheet::WorkbookExtraction;

/// Left-aligns every cell to `width` and ends it with a tab, one line per row.
pub fn format_table(table: &Table, width: usize) -> String {
    let mut text = String::new();
    for record in table.rows() {
        for cell in record {
            text.push_str(&format!("{cell:<width$}\t"));
        }
        text.push('\n');
    }
    text
}

/// `Table {n}:` blocks in worksheet order, then the skipped worksheets.
pub fn format_extraction(extraction: &WorkbookExtraction, width: usize) -> String {
    let mut text = String::new();
    for (index, sheet) in extraction.tables.iter().enumerate() {
        text.push_str(&format!("Table {}:\n", index + 1));
        text.push_str(&format_table(&sheet.table, width));
        text.push('\n');
    }
    for failure in &extraction.failures {
        text.push_str(&format!(
            "Skipped worksheet '{}': {}\n",
            failure.worksheet.name, failure.message
        ));
    }
    if extraction.cancelled {
        text.push_str("Cancelled before the last worksheet.\n");
    }
    if extraction.is_empty() && extraction.failures.is_empty() {
        text.push_str("No tables found.\n");
    }
    text
}

pub fn format_range(table: &Table, width: usize) -> String {
    format!("Single Worksheet Contents:\n{}", format_table(table, width))
}

pub fn format_drive(drive: &Drive) -> String {
    format!(
        " Drive name: {}\n Drive owner: {}\n Drive id: {}\n",
        drive.name.as_deref().unwrap_or_default(),
        drive.owner_name().unwrap_or_default(),
        drive.id
    )
}

fn format_item(item: &DriveItem) -> String {
    match (&item.folder, &item.file, &item.audio) {
        (Some(folder), _, _) => format!(
            "'{}' is a folder ({} items), ID: {}\n",
            item.name, folder.child_count, item.id
        ),
        (_, Some(_), _) => format!("'{}' is a file, ID: {}\n", item.name, item.id),
        (_, _, Some(audio)) => format!(
            "'{}' is an audio item, ID: {}\n",
            audio.title.as_deref().unwrap_or(&item.name),
            item.id
        ),
        _ => format!("Generic drive item found with name {}, ID: {}\n", item.name, item.id),
    }
}

/// One line per root item, naming its kind.
pub fn format_items(items: &[DriveItem]) -> String {
    if items.is_empty() {
        return "No content found\n".to_owned();
    }
    items.iter().map(format_item).collect()
}

/// Spreadsheet files with their worksheets indented below each file.
pub fn format_spreadsheet_files(files: &[SpreadsheetFile]) -> String {
    if files.is_empty() {
        return "No content found\n".to_owned();
    }
    let mut text = String::new();
    for file in files {
        text.push_str(&format!("'{}' is a file, ID: {}\n", file.item.name, file.item.id));
        if file.worksheets.is_empty() {
            text.push_str("No worksheets found.\n");
        }
        for worksheet in &file.worksheets {
            text.push_str(&format!("\t- Name: '{}', ID: {}\n", worksheet.name, worksheet.id));
        }
    }
    text
}
