use crate::database::table::Table;
use crate::spreadsheet::build_table;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::RawRange;
use crate::spreadsheet::SourceError;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;

/// One worksheet of a document, as listed by the workbook API.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Worksheet {
    /// Worksheet identifier used in range requests
    pub id: String,
    /// Display name (e.g. "Sheet1")
    pub name: String,
    /// 0-based position within the document
    pub position: usize,
    /// "Visible", "Hidden" or "VeryHidden"
    pub visibility: String,
}

impl Worksheet {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

/// Table read from one worksheet.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetTable {
    pub worksheet: Worksheet,
    pub table: Table,
}

/// Worksheet that contributed no table, with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetFailure {
    pub worksheet: Worksheet,
    pub message: String,
}

/// Tables of a whole document, in worksheet listing order, plus skipped worksheets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkbookExtraction {
    pub tables: Vec<SheetTable>,
    pub failures: Vec<SheetFailure>,
    /// Set when the cancel flag stopped the loop before the last worksheet.
    pub cancelled: bool,
}

impl WorkbookExtraction {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn into_tables(self) -> Vec<Table> {
        self.tables.into_iter().map(|sheet| sheet.table).collect()
    }
}

/// Reads the used range of every accepted worksheet and builds one table per worksheet.
///
/// Worksheets are visited in the given order. A worksheet whose fetch fails or
/// whose range cannot be turned into a table is logged and skipped; the rest
/// are still read. The cancel flag is only checked before each fetch, so a
/// table is never cut short.
pub fn enumerate_tables<F>(
    document_id: &str,
    worksheets: &[Worksheet],
    criteria: &Criteria,
    mut fetch_used_range: F,
) -> WorkbookExtraction
where
    F: FnMut(&str, &str) -> Result<RawRange, SourceError>,
{
    let mut extraction = WorkbookExtraction::default();
    let mut visited = 0;
    for worksheet in worksheets.iter().filter(|worksheet| criteria.accept(&worksheet.name)) {
        if criteria.sheet_limit.map(|limit| visited >= limit).unwrap_or(false) {
            break;
        }
        if criteria.is_cancelled() {
            debug!(document_id, worksheet = %worksheet.name, "Extraction cancelled");
            extraction.cancelled = true;
            break;
        }
        visited += 1;

        let result = fetch_used_range(document_id, &worksheet.id)
            .map_err(|error| error.to_string())
            .and_then(|range| build_table(&range, true).map_err(|error| error.to_string()));
        match result {
            Ok(table) => {
                debug!(
                    worksheet = %worksheet.name,
                    rows = table.row_count(),
                    cols = table.col_count(),
                    "Read worksheet"
                );
                extraction.tables.push(SheetTable {
                    worksheet: worksheet.to_owned(),
                    table,
                });
            }
            Err(message) => {
                warn!(document_id, worksheet = %worksheet.name, %message, "Skipping worksheet");
                extraction.failures.push(SheetFailure {
                    worksheet: worksheet.to_owned(),
                    message,
                });
            }
        }
    }
    extraction
}
