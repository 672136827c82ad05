//! # Spreadsheet Extraction
//!
//! Turns the loosely typed cell grids returned by a remote workbook API into
//! rectangular [`Table`]s. The remote side is reached only through the
//! [`WorkbookSource`] trait, so any backend exposing worksheet listing and
//! range reads can be plugged in.
//!
//! - [`cell`]: single cell coercion and the `M/DD/YYYY` date rewrite
//! - [`build_table`]: one raw range to one validated table
//! - [`sheet`]: all worksheets of a document, with per-worksheet failure isolation
//! - [`Extractor`]: whole-document and single-range reads
use crate::database::range::Range;
use crate::database::range::RangeError;
use crate::database::table::Table;
use crate::database::table::TableError;
use crate::spreadsheet::cell::normalize;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::enumerate_tables;
use crate::spreadsheet::sheet::WorkbookExtraction;
use crate::spreadsheet::sheet::Worksheet;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

pub mod cell;
pub mod criteria;
pub(crate) mod reference;
pub mod sheet;

/// Errors raised while extracting tables from a document.
#[derive(Error, Debug, PartialEq)]
pub enum SpreadsheetError {
    /// The range response carried no values at all
    #[error("Range '{0}' has no values")]
    EmptyRange(String),

    /// Rows of the range differ in length
    #[error("Range '{address}' is ragged: row {row} ({reference}) has {actual} columns, expected {expected}")]
    RaggedRange {
        address: String,
        row: usize,
        reference: String,
        expected: usize,
        actual: usize,
    },

    #[error("Document '{0}' not found")]
    DocumentNotFound(String),

    #[error("Range '{address}' not found in worksheet '{worksheet}'")]
    RangeNotFound { worksheet: String, address: String },

    #[error("Invalid range address: {0}")]
    InvalidAddress(#[from] RangeError),

    /// Any other failure reported by the remote service
    #[error("Remote service unavailable: {0}")]
    CollaboratorUnavailable(String),
}

/// Failure classes of a [`WorkbookSource`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Read-only access to the worksheets and ranges of a remote document.
pub trait WorkbookSource {
    /// Lists the worksheets of a document in document order.
    fn list_worksheets(&self, document_id: &str) -> Result<Vec<Worksheet>, SourceError>;

    /// Fetches the used range (smallest range covering all non-empty cells) of a worksheet.
    fn used_range(&self, document_id: &str, worksheet_id: &str) -> Result<RawRange, SourceError>;

    /// Fetches one addressed range of a worksheet, e.g. `A1:C3`.
    fn range(&self, document_id: &str, worksheet_id: &str, address: &str) -> Result<RawRange, SourceError>;
}

impl<T: WorkbookSource + ?Sized> WorkbookSource for &T {
    fn list_worksheets(&self, document_id: &str) -> Result<Vec<Worksheet>, SourceError> {
        (**self).list_worksheets(document_id)
    }

    fn used_range(&self, document_id: &str, worksheet_id: &str) -> Result<RawRange, SourceError> {
        (**self).used_range(document_id, worksheet_id)
    }

    fn range(&self, document_id: &str, worksheet_id: &str, address: &str) -> Result<RawRange, SourceError> {
        (**self).range(document_id, worksheet_id, address)
    }
}

/// Range resource as returned by the workbook API.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawRange {
    /// Absolute address, e.g. `Sheet1!A1:C3`
    pub address: Option<String>,
    /// Raw cell values
    pub values: Option<Vec<Vec<CellValue>>>,
    /// Display text of each cell, formatted server-side
    pub text: Option<Vec<Vec<CellValue>>>,
}

/// Converts one raw range to a table of normalized strings.
///
/// The display text grid is used when `prefer_display_text` is set and the
/// response carries one; otherwise the raw values are used. Ragged grids are
/// rejected rather than padded.
pub fn build_table(range: &RawRange, prefer_display_text: bool) -> Result<Table, SpreadsheetError> {
    let address = range.address.to_owned().unwrap_or_default();
    let values = range
        .values
        .as_ref()
        .ok_or_else(|| SpreadsheetError::EmptyRange(address.to_owned()))?;
    let grid = range
        .text
        .as_ref()
        .filter(|_| prefer_display_text)
        .unwrap_or(values);

    let rows: Vec<Vec<String>> = grid
        .iter()
        .map(|record| record.iter().map(normalize).collect())
        .collect();
    Table::new(rows).map_err(|error| match error {
        TableError::RaggedRow { row, expected, actual } => SpreadsheetError::RaggedRange {
            reference: reference::index_to_reference(row, 0),
            address,
            row,
            expected,
            actual,
        },
    })
}

/// What to read from a document.
#[derive(Clone, Debug)]
pub enum Target {
    /// Every worksheet accepted by the criteria
    WholeDocument { criteria: Criteria },
    /// One addressed range of one worksheet
    Range { worksheet: String, address: String },
}

/// A document plus the part of it to read.
#[derive(Clone, Debug)]
pub struct ExtractionRequest {
    pub document_id: String,
    pub target: Target,
}

/// Outcome of an [`ExtractionRequest`].
#[derive(Clone, Debug, PartialEq)]
pub enum ExtractionResult {
    Document(WorkbookExtraction),
    Range(Table),
}

/// Reads tables out of remote documents through a [`WorkbookSource`].
pub struct Extractor<S> {
    source: S,
}

impl<S: WorkbookSource> Extractor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Runs a whole-document or single-range read.
    pub fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, SpreadsheetError> {
        match &request.target {
            Target::WholeDocument { criteria } => self
                .read_whole_document(&request.document_id, criteria)
                .map(ExtractionResult::Document),
            Target::Range { worksheet, address } => self
                .read_range(&request.document_id, worksheet, address)
                .map(ExtractionResult::Range),
        }
    }

    /// Reads one table per worksheet, in worksheet order.
    ///
    /// An unknown document is an error. An unreachable service yields an
    /// empty extraction, and failing worksheets are skipped.
    pub fn read_whole_document(
        &self,
        document_id: &str,
        criteria: &Criteria,
    ) -> Result<WorkbookExtraction, SpreadsheetError> {
        let worksheets = match self.source.list_worksheets(document_id) {
            Ok(worksheets) => worksheets,
            Err(SourceError::NotFound(_)) => {
                return Err(SpreadsheetError::DocumentNotFound(document_id.to_owned()))
            }
            Err(error) => {
                warn!(document_id, %error, "Listing worksheets failed");
                return Ok(WorkbookExtraction::default());
            }
        };
        debug!(document_id, worksheets = worksheets.len(), "Listed worksheets");
        Ok(enumerate_tables(document_id, &worksheets, criteria, |document_id, worksheet_id| {
            self.source.used_range(document_id, worksheet_id)
        }))
    }

    /// Reads one addressed range using raw values only.
    pub fn read_range(&self, document_id: &str, worksheet_id: &str, address: &str) -> Result<Table, SpreadsheetError> {
        let range = self.fetch_range(document_id, worksheet_id, address)?;
        build_table(&range, false)
    }

    /// Reads the first cell of an addressed range; empty when the range has no cells.
    pub fn read_cell(&self, document_id: &str, worksheet_id: &str, address: &str) -> Result<String, SpreadsheetError> {
        if Range::try_from(address).is_ok_and(|range| !range.is_single_cell()) {
            debug!(address, "Address spans several cells, reading the first");
        }
        let range = self.fetch_range(document_id, worksheet_id, address)?;
        Ok(range
            .values
            .as_ref()
            .and_then(|values| values.first())
            .and_then(|record| record.first())
            .map(normalize)
            .unwrap_or_default())
    }

    /// Sends the address as given. Only a blank address is refused locally; names,
    /// multi-area and structured references are resolved by the service.
    fn fetch_range(&self, document_id: &str, worksheet_id: &str, address: &str) -> Result<RawRange, SpreadsheetError> {
        if address.trim().is_empty() {
            return Err(RangeError::FormatError(address.to_owned()).into());
        }
        debug!(document_id, worksheet_id, address, "Reading range");
        self.source
            .range(document_id, worksheet_id, address)
            .map_err(|error| match error {
                SourceError::NotFound(_) => SpreadsheetError::RangeNotFound {
                    worksheet: worksheet_id.to_owned(),
                    address: address.to_owned(),
                },
                SourceError::ServiceUnavailable(message) => SpreadsheetError::CollaboratorUnavailable(message),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory workbook source keyed by document id.
    #[derive(Default)]
    struct FakeSource {
        worksheets: HashMap<String, Result<Vec<Worksheet>, SourceError>>,
        ranges: HashMap<(String, String), Result<RawRange, SourceError>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn with_sheet(mut self, document_id: &str, worksheet: &str, range: Result<RawRange, SourceError>) -> Self {
            let worksheets = self
                .worksheets
                .entry(document_id.to_owned())
                .or_insert_with(|| Ok(Vec::new()));
            if let Ok(worksheets) = worksheets {
                worksheets.push(Worksheet::new(worksheet, worksheet));
            }
            self.ranges.insert((document_id.to_owned(), worksheet.to_owned()), range);
            self
        }
    }

    impl WorkbookSource for FakeSource {
        fn list_worksheets(&self, document_id: &str) -> Result<Vec<Worksheet>, SourceError> {
            self.calls.borrow_mut().push(format!("list {document_id}"));
            self.worksheets
                .get(document_id)
                .cloned()
                .unwrap_or_else(|| Err(SourceError::NotFound(document_id.to_owned())))
        }

        fn used_range(&self, document_id: &str, worksheet_id: &str) -> Result<RawRange, SourceError> {
            self.calls.borrow_mut().push(format!("used {worksheet_id}"));
            self.ranges
                .get(&(document_id.to_owned(), worksheet_id.to_owned()))
                .cloned()
                .unwrap_or_else(|| Err(SourceError::NotFound(worksheet_id.to_owned())))
        }

        fn range(&self, document_id: &str, worksheet_id: &str, address: &str) -> Result<RawRange, SourceError> {
            self.calls.borrow_mut().push(format!("range {worksheet_id}!{address}"));
            self.used_range(document_id, worksheet_id)
        }
    }

    fn raw(payload: serde_json::Value) -> RawRange {
        serde_json::from_value(payload).unwrap()
    }

    fn both_grids() -> RawRange {
        raw(json!({
            "address": "Sheet1!A1:B2",
            "values": [["Date", "Amount"], [45_385, 1234.5]],
            "text": [["Date", "Amount"], ["4/04/2024", "1,234.50"]]
        }))
    }

    #[test]
    fn build_keeps_shape() {
        let table = build_table(
            &raw(json!({"values": [["a", 1, true], [null, "3/07/2024", "x\ny"]]})),
            false,
        )
        .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.col_count(), 3);
        assert_eq!(
            table.rows(),
            &[
                vec!["a".to_owned(), "1".to_owned(), "True".to_owned()],
                vec!["".to_owned(), "07/03/2024".to_owned(), "xy".to_owned()],
            ]
        );
    }

    #[test]
    fn build_prefers_display_text() {
        let table = build_table(&both_grids(), true).unwrap();
        assert_eq!(table.get(1, 0), Some("04/04/2024"));
        assert_eq!(table.get(1, 1), Some("1,234.50"));

        let table = build_table(&both_grids(), false).unwrap();
        assert_eq!(table.get(1, 0), Some("45385"));
        assert_eq!(table.get(1, 1), Some("1234.5"));
    }

    #[test]
    fn build_falls_back_to_values_without_text() {
        let table = build_table(&raw(json!({"values": [["only"]]})), true).unwrap();
        assert_eq!(table.get(0, 0), Some("only"));
    }

    #[test]
    fn build_without_values() {
        assert_eq!(
            build_table(&raw(json!({"address": "Sheet1!A1", "values": null, "text": [["x"]]})), true),
            Err(SpreadsheetError::EmptyRange("Sheet1!A1".to_owned()))
        );
        assert!(matches!(
            build_table(&RawRange::default(), false),
            Err(SpreadsheetError::EmptyRange(_))
        ));
    }

    #[test]
    fn build_zero_rows() {
        let table = build_table(&raw(json!({"values": []})), false).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn build_ragged() {
        let range = raw(json!({"address": "S!A1:C3", "values": [[1, 2, 3], [4, 5, 6], [7, 8]]}));
        assert_eq!(
            build_table(&range, false),
            Err(SpreadsheetError::RaggedRange {
                address: "S!A1:C3".to_owned(),
                row: 2,
                reference: "A3".to_owned(),
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn whole_document_isolates_failures() {
        let source = FakeSource::default()
            .with_sheet("doc", "One", Ok(raw(json!({"values": [["1"]]}))))
            .with_sheet("doc", "Two", Err(SourceError::ServiceUnavailable("503".to_owned())))
            .with_sheet("doc", "Three", Ok(raw(json!({"values": [["3"]]}))));
        let extraction = Extractor::new(&source)
            .read_whole_document("doc", &Criteria::default())
            .unwrap();
        let tables = extraction.into_tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].get(0, 0), Some("1"));
        assert_eq!(tables[1].get(0, 0), Some("3"));
    }

    #[test]
    fn whole_document_uses_display_text() {
        let source = FakeSource::default().with_sheet("doc", "Sheet1", Ok(both_grids()));
        let extraction = Extractor::new(&source)
            .read_whole_document("doc", &Criteria::default())
            .unwrap();
        assert_eq!(extraction.tables[0].table.get(1, 1), Some("1,234.50"));
    }

    #[test]
    fn whole_document_without_worksheets() {
        let mut source = FakeSource::default();
        source.worksheets.insert("doc".to_owned(), Ok(Vec::new()));
        let extraction = Extractor::new(source)
            .read_whole_document("doc", &Criteria::default())
            .unwrap();
        assert!(extraction.is_empty());
    }

    #[test]
    fn whole_document_not_found() {
        let extractor = Extractor::new(FakeSource::default());
        assert_eq!(
            extractor.read_whole_document("missing", &Criteria::default()),
            Err(SpreadsheetError::DocumentNotFound("missing".to_owned()))
        );
    }

    #[test]
    fn whole_document_service_unavailable() {
        let mut source = FakeSource::default();
        source
            .worksheets
            .insert("doc".to_owned(), Err(SourceError::ServiceUnavailable("down".to_owned())));
        let extraction = Extractor::new(source)
            .read_whole_document("doc", &Criteria::default())
            .unwrap();
        assert!(extraction.is_empty());
    }

    #[test]
    fn range_never_uses_display_text() {
        let source = FakeSource::default().with_sheet("doc", "Sheet1", Ok(both_grids()));
        let table = Extractor::new(&source).read_range("doc", "Sheet1", "A1:B2").unwrap();
        assert_eq!(table.get(1, 0), Some("45385"));
        assert_eq!(table.get(1, 1), Some("1234.5"));
        assert_eq!(source.calls.borrow().first().map(String::as_str), Some("range Sheet1!A1:B2"));
    }

    #[test]
    fn range_not_found() {
        let extractor = Extractor::new(FakeSource::default());
        assert_eq!(
            extractor.read_range("doc", "Nope", "A1"),
            Err(SpreadsheetError::RangeNotFound {
                worksheet: "Nope".to_owned(),
                address: "A1".to_owned(),
            })
        );
    }

    #[test]
    fn range_found_but_empty() {
        let source = FakeSource::default().with_sheet("doc", "Sheet1", Ok(raw(json!({"values": []}))));
        let table = Extractor::new(&source).read_range("doc", "Sheet1", "A1:A1").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn range_service_unavailable() {
        let source = FakeSource::default()
            .with_sheet("doc", "Sheet1", Err(SourceError::ServiceUnavailable("429".to_owned())));
        assert_eq!(
            Extractor::new(&source).read_range("doc", "Sheet1", "A1"),
            Err(SpreadsheetError::CollaboratorUnavailable("429".to_owned()))
        );
    }

    #[test]
    fn range_blank_address_is_not_sent() {
        let source = FakeSource::default();
        for address in ["", "   "] {
            let result = Extractor::new(&source).read_range("doc", "Sheet1", address);
            assert!(matches!(result, Err(SpreadsheetError::InvalidAddress(_))));
        }
        assert!(source.calls.borrow().is_empty());
    }

    #[test]
    fn range_non_a1_addresses_are_sent_as_given() {
        let source = FakeSource::default().with_sheet("doc", "Sheet1", Ok(raw(json!({"values": [["x"]]}))));
        let extractor = Extractor::new(&source);
        for address in ["Sales_2024", "Budget2024Q1", "A1:B2,D4", "Table1[Amount]"] {
            let table = extractor.read_range("doc", "Sheet1", address).unwrap();
            assert_eq!(table.get(0, 0), Some("x"), "{address}");
        }
        let sent: Vec<String> = source
            .calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with("range "))
            .cloned()
            .collect();
        assert_eq!(
            sent,
            vec![
                "range Sheet1!Sales_2024",
                "range Sheet1!Budget2024Q1",
                "range Sheet1!A1:B2,D4",
                "range Sheet1!Table1[Amount]",
            ]
        );
    }

    #[test]
    fn range_unknown_name_is_not_found() {
        let source = FakeSource::default().with_sheet("doc", "Sheet1", Ok(raw(json!({"values": [["x"]]}))));
        assert_eq!(
            Extractor::new(&source).read_range("doc", "Missing", "NoSuchName"),
            Err(SpreadsheetError::RangeNotFound {
                worksheet: "Missing".to_owned(),
                address: "NoSuchName".to_owned(),
            })
        );
    }

    #[test]
    fn cell_value() {
        let source = FakeSource::default().with_sheet("doc", "Sheet1", Ok(both_grids()));
        let extractor = Extractor::new(&source);
        assert_eq!(extractor.read_cell("doc", "Sheet1", "A1").unwrap(), "Date");
        assert_eq!(extractor.read_cell("doc", "Sheet1", "A1:B2").unwrap(), "Date");
        assert_eq!(extractor.read_cell("doc", "Sheet1", "FirstDate").unwrap(), "Date");

        let source = FakeSource::default().with_sheet("doc", "Sheet1", Ok(raw(json!({"values": []}))));
        assert_eq!(Extractor::new(&source).read_cell("doc", "Sheet1", "A1").unwrap(), "");
    }

    #[test]
    fn extract_dispatches_on_target() {
        let source = FakeSource::default().with_sheet("doc", "Sheet1", Ok(both_grids()));
        let extractor = Extractor::new(&source);

        let result = extractor
            .extract(&ExtractionRequest {
                document_id: "doc".to_owned(),
                target: Target::WholeDocument { criteria: Criteria::default() },
            })
            .unwrap();
        assert!(matches!(result, ExtractionResult::Document(ref extraction) if extraction.tables.len() == 1));

        let result = extractor
            .extract(&ExtractionRequest {
                document_id: "doc".to_owned(),
                target: Target::Range {
                    worksheet: "Sheet1".to_owned(),
                    address: "A1:B2".to_owned(),
                },
            })
            .unwrap();
        assert!(matches!(result, ExtractionResult::Range(ref table) if table.row_count() == 2));
    }
}
