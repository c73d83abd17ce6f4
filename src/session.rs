//! Session controller: ties ingestion, the grade store, the edit history
//! and the persistence port together behind one stateful surface.
//!
//! The flow mirrors how the tool is driven: load a workbook, pick a sheet,
//! confirm (or fix) the inferred mapping, then edit grades with full
//! undo/redo, with every confirmed state written through to the port.

use chrono::Utc;

use crate::error::{GradesheetError, Result};
use crate::export::{assemble, export_headers, write_workbook};
use crate::grid::ScanConfig;
use crate::history::{EditEntry, EditHistory};
use crate::ingest::{ingest, Ingested};
use crate::persist::KeyValueStore;
use crate::store::GradeStore;
use crate::types::{CellScalar, HeaderMapping, MappingField, Sheet};

/// A grade cell selected for editing but not yet committed.
#[derive(Debug, Clone)]
struct PendingEdit {
    student_id: String,
    column: String,
}

/// One loaded workbook plus the editing state layered on top of it.
pub struct Session<S: KeyValueStore> {
    ingested: Option<Ingested>,
    store: GradeStore,
    history: EditHistory,
    port: S,
    config: ScanConfig,
    pending: Option<PendingEdit>,
    confirmed: bool,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(port: S) -> Self {
        Self::with_config(port, ScanConfig::default())
    }

    pub fn with_config(port: S, config: ScanConfig) -> Self {
        Self {
            ingested: None,
            store: GradeStore::new(),
            history: EditHistory::new(),
            port,
            config,
            pending: None,
            confirmed: false,
        }
    }

    /// Parse a workbook payload and make it the session's document.
    ///
    /// Any previous document, editing state and history are dropped; the
    /// persisted state for the new document's sheets is only merged back in
    /// at [`Session::confirm_mapping`].
    ///
    /// # Errors
    /// Propagates ingestion failures (`Parse` for malformed payloads).
    pub fn load_workbook(&mut self, data: &[u8], file_name: &str) -> Result<()> {
        let ingested = ingest(data, file_name, &self.config)?;
        log::info!(
            "loaded {file_name:?}: {} sheet(s), mapping {}",
            ingested.sheets.len(),
            if ingested.mapping.is_some() {
                "inferred"
            } else {
                "unresolved"
            }
        );
        self.ingested = Some(ingested);
        self.reset_editing_state();
        Ok(())
    }

    /// Switch the active sheet by name. Editing state is reset; the new
    /// sheet must be confirmed before edits resume.
    ///
    /// # Errors
    /// `Validation` when no workbook is loaded or the name is unknown.
    pub fn select_sheet(&mut self, name: &str) -> Result<()> {
        let ingested = self
            .ingested
            .as_mut()
            .ok_or_else(|| GradesheetError::Validation("no workbook loaded".into()))?;
        let index = ingested
            .sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| GradesheetError::Validation(format!("unknown sheet {name:?}")))?;
        ingested.current_sheet = index;
        self.reset_editing_state();
        Ok(())
    }

    /// Confirm the active sheet's mapping: seed the grade store from the
    /// sheet, merge persisted grades on top, and restore the sheet's edit
    /// history from the port.
    ///
    /// # Errors
    /// `MappingIncomplete` when inference left a role unresolved or the
    /// mapping does not resolve against the sheet's headers; `Validation`
    /// when no workbook is loaded.
    pub fn confirm_mapping(&mut self) -> Result<()> {
        let ingested = self
            .ingested
            .as_ref()
            .ok_or_else(|| GradesheetError::Validation("no workbook loaded".into()))?;
        let sheet = ingested
            .sheets
            .get(ingested.current_sheet)
            .ok_or_else(|| GradesheetError::Validation("no sheet selected".into()))?;
        let mapping = ingested
            .mapping_for(ingested.current_sheet)
            .ok_or_else(|| {
                GradesheetError::MappingIncomplete(format!(
                    "no resolvable mapping for sheet {:?}",
                    sheet.name
                ))
            })?;
        if !sheet.is_empty() && !mapping.resolves_in(&sheet.headers) {
            return Err(GradesheetError::MappingIncomplete(format!(
                "mapping references columns missing from sheet {:?}",
                sheet.name
            )));
        }

        let (grades_key, history_key) = storage_keys(&sheet.name);
        self.store.seed(sheet, mapping);
        self.store.merge_persisted(&self.port, &grades_key);
        self.history.load(&self.port, &history_key);
        self.confirmed = true;
        self.pending = None;
        log::info!("confirmed mapping for sheet {:?}", sheet.name);
        Ok(())
    }

    /// Reassign one mapping role to an existing column of the active sheet.
    /// Invalidates any prior confirmation.
    ///
    /// # Errors
    /// `Validation` for an unknown column; `MappingIncomplete` when the
    /// column already holds another role or there is no mapping to adjust.
    pub fn remap_field(&mut self, field: MappingField, column: &str) -> Result<()> {
        let ingested = self
            .ingested
            .as_mut()
            .ok_or_else(|| GradesheetError::Validation("no workbook loaded".into()))?;
        let sheet = ingested
            .sheets
            .get(ingested.current_sheet)
            .ok_or_else(|| GradesheetError::Validation("no sheet selected".into()))?;
        if !sheet.is_empty() && !sheet.headers.iter().any(|h| h == column) {
            return Err(GradesheetError::Validation(format!(
                "column {column:?} not present in sheet {:?}",
                sheet.name
            )));
        }

        // Empty sheets carry their own mapping; everything else shares the
        // workbook's reference mapping.
        let mapping = if sheet.is_empty() {
            ingested.empty_sheet_mappings.get_mut(&sheet.name)
        } else {
            ingested.mapping.as_mut()
        };
        let mapping = mapping.ok_or_else(|| {
            GradesheetError::MappingIncomplete("no mapping to adjust".into())
        })?;
        mapping.remap(field, column)?;

        self.reset_editing_state();
        Ok(())
    }

    /// Select a grade cell for editing.
    ///
    /// # Errors
    /// `Validation` when the mapping is unconfirmed, the column is not a
    /// grade column, or the student is unknown.
    pub fn begin_edit(&mut self, student_id: &str, column: &str) -> Result<()> {
        let mapping = self.confirmed_mapping()?;
        if !mapping.grade_columns().any(|c| c == column) {
            return Err(GradesheetError::Validation(format!(
                "column {column:?} is not a grade column"
            )));
        }
        if !self.store.contains_student(student_id) {
            return Err(GradesheetError::Validation(format!(
                "unknown student {student_id:?}"
            )));
        }
        self.pending = Some(PendingEdit {
            student_id: student_id.to_string(),
            column: column.to_string(),
        });
        Ok(())
    }

    /// Validate and commit the pending edit.
    ///
    /// A commit that leaves the value unchanged does not append a history
    /// entry. On success the store and history are written to the port.
    ///
    /// # Errors
    /// `Validation` when no edit is pending or `raw` is non-numeric and
    /// non-blank. A failed commit leaves store and history untouched.
    pub fn commit_edit(&mut self, raw: &str) -> Result<CellScalar> {
        let pending = self
            .pending
            .clone()
            .ok_or_else(|| GradesheetError::Validation("no edit in progress".into()))?;
        self.apply_commit(&pending.student_id, &pending.column, raw)
    }

    /// Validate and commit one edit in a single step, addressing the cell
    /// directly instead of through a pending selection. Runs the same checks
    /// as [`Session::begin_edit`] followed by [`Session::commit_edit`]; any
    /// pending selection is discarded on success.
    ///
    /// # Errors
    /// As for `begin_edit` and `commit_edit`.
    pub fn commit_grade(
        &mut self,
        student_id: &str,
        column: &str,
        raw: &str,
    ) -> Result<CellScalar> {
        let mapping = self.confirmed_mapping()?;
        if !mapping.grade_columns().any(|c| c == column) {
            return Err(GradesheetError::Validation(format!(
                "column {column:?} is not a grade column"
            )));
        }
        if !self.store.contains_student(student_id) {
            return Err(GradesheetError::Validation(format!(
                "unknown student {student_id:?}"
            )));
        }
        self.apply_commit(student_id, column, raw)
    }

    fn apply_commit(&mut self, student_id: &str, column: &str, raw: &str) -> Result<CellScalar> {
        let old = self
            .store
            .get(student_id, column)
            .cloned()
            .unwrap_or(CellScalar::Empty);
        let new = self.store.commit(student_id, column, raw)?;

        if new != old {
            let student_name = self
                .student_row(student_id)
                .map(|(row, mapping)| row.name(mapping).display())
                .unwrap_or_default();
            self.history.commit(EditEntry {
                student_id: student_id.to_string(),
                column: column.to_string(),
                old_value: old,
                new_value: new.clone(),
                timestamp: Utc::now(),
                student_name,
            });
        }

        self.pending = None;
        self.persist();
        Ok(new)
    }

    /// Abandon the pending edit without touching the store.
    pub fn cancel_edit(&mut self) {
        self.pending = None;
    }

    /// Revert the newest applied edit. Returns false at the pristine state.
    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.store);
        if changed {
            self.persist();
        }
        changed
    }

    /// Re-apply the next undone edit. Returns false at the newest state.
    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.store);
        if changed {
            self.persist();
        }
        changed
    }

    /// Jump to an arbitrary point of the history (`None` = pristine state)
    /// by reseeding and replaying. Returns false when out of range or the
    /// mapping is unconfirmed.
    pub fn jump_to(&mut self, index: Option<usize>) -> bool {
        if !self.confirmed {
            return false;
        }
        let Some(ingested) = self.ingested.as_ref() else {
            return false;
        };
        let Some(sheet) = ingested.sheets.get(ingested.current_sheet) else {
            return false;
        };
        let Some(mapping) = ingested.mapping_for(ingested.current_sheet) else {
            return false;
        };

        // Borrow juggling: replay needs the sheet and mapping immutably
        // while the store and history are mutated.
        let changed = self
            .history
            .jump_to(index, &mut self.store, sheet, mapping);
        if changed {
            self.persist();
        }
        changed
    }

    /// Force a write of the active sheet's grades and history to the port.
    /// Commits already persist as they happen; this is the explicit hook for
    /// shutdown paths.
    pub fn save(&mut self) {
        self.persist();
    }

    /// Drop the loaded document and all editing state. The port keeps its
    /// persisted payloads.
    pub fn reset(&mut self) {
        self.ingested = None;
        self.reset_editing_state();
    }

    /// Drop the active sheet's history and persist the empty log.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.persist();
    }

    /// Current grade values for one student, in mapped column order, with
    /// committed values taking precedence over the sheet.
    #[must_use]
    pub fn student_grades(&self, student_id: &str) -> Option<Vec<(String, CellScalar)>> {
        let (row, mapping) = self.student_row(student_id)?;
        Some(
            mapping
                .grade_columns()
                .map(|column| {
                    let value = self
                        .store
                        .get(student_id, column)
                        .cloned()
                        .unwrap_or_else(|| row.get(column).clone());
                    (column.to_string(), value)
                })
                .collect(),
        )
    }

    /// Write the active sheet's current state to a fresh workbook.
    ///
    /// # Errors
    /// `Validation` when the mapping is unconfirmed.
    pub fn export_snapshot(&self) -> Result<Vec<u8>> {
        let mapping = self.confirmed_mapping()?;
        let ingested = self
            .ingested
            .as_ref()
            .ok_or_else(|| GradesheetError::Validation("no workbook loaded".into()))?;
        let sheet = ingested
            .sheets
            .get(ingested.current_sheet)
            .ok_or_else(|| GradesheetError::Validation("no sheet selected".into()))?;

        let headers = export_headers(mapping);
        let rows = assemble(sheet, mapping, &self.store);
        write_workbook(&headers, &rows, &sheet.name)
    }

    #[must_use]
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    #[must_use]
    pub fn store(&self) -> &GradeStore {
        &self.store
    }

    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.ingested
            .as_ref()
            .map(|i| i.sheets.iter().map(|s| s.name.as_str()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn current_sheet(&self) -> Option<&Sheet> {
        let ingested = self.ingested.as_ref()?;
        ingested.sheets.get(ingested.current_sheet)
    }

    #[must_use]
    pub fn mapping(&self) -> Option<&HeaderMapping> {
        let ingested = self.ingested.as_ref()?;
        ingested.mapping_for(ingested.current_sheet)
    }

    fn confirmed_mapping(&self) -> Result<&HeaderMapping> {
        if !self.confirmed {
            return Err(GradesheetError::Validation(
                "mapping not confirmed".into(),
            ));
        }
        self.mapping().ok_or_else(|| {
            GradesheetError::MappingIncomplete("mapping unresolved".into())
        })
    }

    fn student_row(&self, student_id: &str) -> Option<(&crate::types::RowRecord, &HeaderMapping)> {
        let ingested = self.ingested.as_ref()?;
        let sheet = ingested.sheets.get(ingested.current_sheet)?;
        let mapping = ingested.mapping_for(ingested.current_sheet)?;
        let row = sheet
            .rows
            .iter()
            .find(|row| row.identifier(mapping).display() == student_id)?;
        Some((row, mapping))
    }

    fn persist(&mut self) {
        let Some(sheet) = self.current_sheet().map(|s| s.name.clone()) else {
            return;
        };
        let (grades_key, history_key) = storage_keys(&sheet);
        self.store.save(&mut self.port, &grades_key);
        self.history.save(&mut self.port, &history_key);
    }

    fn reset_editing_state(&mut self) {
        self.store.clear();
        self.history.clear();
        self.pending = None;
        self.confirmed = false;
    }
}

fn storage_keys(sheet_name: &str) -> (String, String) {
    (
        format!("grades:{sheet_name}"),
        format!("history:{sheet_name}"),
    )
}
