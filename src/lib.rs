//! gradesheet - bilingual grade-spreadsheet engine
//!
//! Ingests Arabic/Latin grade workbooks and edits them safely:
//! - Header-row location and column-role inference (identifier, name,
//!   grade columns) via layered multilingual heuristics
//! - Validated grade commits on top of the original sheet values
//! - Capped edit history with undo, redo, and jump-to-point
//! - Persistence of grades and history through a key-value port
//! - Snapshot export to a fresh single-sheet workbook
//!
//! # Usage
//!
//! ```no_run
//! use gradesheet::persist::MemoryStore;
//! use gradesheet::session::Session;
//!
//! # fn run(data: &[u8]) -> gradesheet::error::Result<()> {
//! let mut session = Session::new(MemoryStore::new());
//! session.load_workbook(data, "grades.xlsx")?;
//! session.confirm_mapping()?;
//! session.begin_edit("1001", "Final")?;
//! session.commit_edit("85")?;
//! # Ok(())
//! # }
//! ```

pub mod cell_ref;
pub mod error;
pub mod export;
pub mod grid;
pub mod history;
pub mod infer;
pub mod ingest;
pub mod patterns;
pub mod persist;
pub mod session;
pub mod store;
pub mod types;

pub use error::{GradesheetError, Result};
pub use grid::ScanConfig;
pub use history::{EditEntry, EditHistory, HISTORY_CAP};
pub use ingest::{ingest, Ingested};
pub use session::Session;
pub use store::GradeStore;
pub use types::{CellScalar, HeaderMapping, MappingField, RowRecord, Sheet};

/// Crate version, for diagnostics.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
