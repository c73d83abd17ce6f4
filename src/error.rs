//! Structured error types for gradesheet.
//!
//! The three domain variants mirror how failures surface to a caller:
//! `Parse` aborts an ingestion, `Validation` leaves an in-progress edit open
//! for correction, and `MappingIncomplete` blocks mapping confirmation while
//! keeping the sheet inspectable.

/// All errors that can occur while ingesting, editing, or exporting a grade workbook.
#[derive(Debug, thiserror::Error)]
pub enum GradesheetError {
    /// Workbook payload could not be ingested: empty file, unexpected
    /// extension, corrupt container, or zero sheets.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Grade text was neither empty nor parseable as a number.
    #[error("Invalid grade value: {0}")]
    Validation(String),

    /// Identifier/name/primary-grade could not be resolved after all fallbacks.
    #[error("Header mapping incomplete: {0}")]
    MappingIncomplete(String),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GradesheetError>;

impl From<String> for GradesheetError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GradesheetError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
