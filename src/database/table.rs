use thiserror::Error;

/// Errors raised when a table is assembled from rows of unequal width.
#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("Row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Rectangular grid of normalized cell strings.
///
/// The shape is checked once in [`Table::new`]; every row holds exactly
/// `col_count()` cells afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    rows: Vec<Vec<String>>,
    col_count: usize,
}

impl Table {
    /// Builds a table, failing on the first row whose width differs from the first row.
    pub fn new(rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        let col_count = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((row, record)) = rows
            .iter()
            .enumerate()
            .find(|(_, record)| record.len() != col_count)
        {
            return Err(TableError::RaggedRow {
                row,
                expected: col_count,
                actual: record.len(),
            });
        }
        Ok(Self { rows, col_count })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.col_count
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the cell at 0-based (row, col), None when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}
