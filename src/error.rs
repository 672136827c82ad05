use thiserror::Error;

/// Main error type of the drive sheet client.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum DriveSheetError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    SourceError(#[from] crate::spreadsheet::SourceError),

    // Database module errors
    #[error("{0}")]
    RangeError(#[from] crate::database::range::RangeError),

    #[error("{0}")]
    TableError(#[from] crate::database::table::TableError),

    // Remote drive errors
    #[error("{0}")]
    GraphError(#[from] crate::graph::GraphError),

    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, DriveSheetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| DriveSheetError::WithContextError(format!("{}: {}", message, e)))
    }
}
