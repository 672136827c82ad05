use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Optional sheet prefix, then `[$]COL[$]ROW` on each side of an optional colon.
static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:'[^']+'|[^!']+)!)?\$?([A-Z]*)\$?(\d*)(:\$?([A-Z]*)\$?(\d*))?$")
        .expect("Hardcode regex pattern")
});

/// Errors related to Excel-style range parsing.
#[derive(Error, Debug, PartialEq)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// Represents an Excel-style cell range with optional boundaries.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Range {
    /// Lower row bound (0-based index), None for unbounded
    pub row_lower_bound: Option<usize>,
    /// Upper row bound (0-based index), None for unbounded
    pub row_upper_bound: Option<usize>,
    /// Lower column bound (0-based index), None for unbounded
    pub col_lower_bound: Option<usize>,
    /// Upper column bound (0-based index), None for unbounded
    pub col_upper_bound: Option<usize>,
}

impl TryFrom<&str> for Range {
    type Error = RangeError;

    /// Parses an Excel-style range string (e.g., "A1", "B2:C5", "A:C", "1:10", "Sheet1!$A$1").
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        let captures = RANGE_PATTERN
            .captures(normalized.as_str())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let part = |index: usize| captures.get(index).map(|matcher| matcher.as_str()).unwrap_or("");

        // Both halves of a side may be missing only when the other side carries something
        let lower_is_blank = part(1).is_empty() && part(2).is_empty();
        let upper_is_blank = part(4).is_empty() && part(5).is_empty();
        if lower_is_blank || (captures.get(3).is_some() && upper_is_blank) {
            return Err(RangeError::FormatError(value.to_owned()));
        }

        let range = Range {
            col_lower_bound: col_to_index(part(1)),
            row_lower_bound: row_to_index(part(2)),
            col_upper_bound: col_to_index(part(4)),
            row_upper_bound: row_to_index(part(5)),
        };
        // Row "0" parses to None, which would silently widen the range
        if (!part(2).is_empty() && range.row_lower_bound.is_none())
            || (!part(5).is_empty() && range.row_upper_bound.is_none())
        {
            return Err(RangeError::FormatError(value.to_owned()));
        }
        Ok(range)
    }
}

impl Range {
    /// True when the range addresses exactly one cell.
    pub fn is_single_cell(&self) -> bool {
        let is_single_row = match (self.row_lower_bound, self.row_upper_bound) {
            (Some(_), None) => true,
            (Some(lower), Some(upper)) => lower == upper,
            _ => false,
        };
        let is_single_col = match (self.col_lower_bound, self.col_upper_bound) {
            (Some(_), None) => true,
            (Some(lower), Some(upper)) => lower == upper,
            _ => false,
        };
        is_single_row && is_single_col
    }
}
