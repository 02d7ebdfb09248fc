use serde::{Deserialize, Serialize};

use crate::{FieldName, FieldType, ModelError, Row, RowId, RowState, Value};

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: FieldName,
    pub ty: FieldType,
}

impl Column {
    pub fn new(name: FieldName, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// Ordered column layout of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, ordinal: usize) -> Option<&Column> {
        self.columns.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Ordinal of the named column. Lookup is case-insensitive.
    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.as_str().eq_ignore_ascii_case(name))
    }
}

/// The in-memory, ordered set of rows for one panel session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    name: String,
    schema: Schema,
    next_id: u64,
    rows: Vec<(RowId, Row)>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            next_id: 0,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|(row_id, _)| *row_id == id)
    }

    fn next_id(&mut self) -> RowId {
        let id = RowId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a committed row, as produced by a fill.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<RowId, ModelError> {
        if values.len() != self.schema.len() {
            return Err(ModelError::WidthMismatch {
                expected: self.schema.len(),
                got: values.len(),
            });
        }
        let id = self.next_id();
        self.rows.push((id, Row::committed(values)));
        Ok(id)
    }

    /// Append a blank row in the `Added` state.
    pub fn new_row(&mut self) -> RowId {
        let id = self.next_id();
        let row = Row::blank(self.schema.len());
        self.rows.push((id, row));
        id
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.position(id).map(|pos| &self.rows[pos].1)
    }

    pub fn rows(&self) -> impl Iterator<Item = (RowId, &Row)> {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    /// Write one field of a row.
    pub fn set_value(&mut self, id: RowId, ordinal: usize, value: Value) -> Result<(), ModelError> {
        let pos = self.position(id).ok_or(ModelError::NoSuchRow(id))?;
        let row = &mut self.rows[pos].1;
        if row.state() == RowState::Deleted {
            return Err(ModelError::DeletedRow(id));
        }
        row.set(ordinal, value)
    }

    /// Mark a row deleted. Deleting a not-yet-committed (`Added`) row
    /// detaches it outright.
    pub fn delete(&mut self, id: RowId) -> Result<(), ModelError> {
        let pos = self.position(id).ok_or(ModelError::NoSuchRow(id))?;
        if self.rows[pos].1.state() == RowState::Added {
            self.rows.remove(pos);
        } else {
            self.rows[pos].1.mark_deleted();
        }
        Ok(())
    }

    pub fn has_changes(&self) -> bool {
        self.rows.iter().any(|(_, row)| row.state().is_pending())
    }

    /// Snapshot of the rows with uncommitted changes.
    pub fn changed_rows(&self) -> Vec<RowId> {
        self.rows
            .iter()
            .filter(|(_, row)| row.state().is_pending())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Accept every pending change: deleted rows detach, the rest settle
    /// into `Unchanged`.
    pub fn commit_all(&mut self) {
        self.rows.retain(|(_, row)| row.state() != RowState::Deleted);
        for (_, row) in &mut self.rows {
            row.commit();
        }
    }

    /// Reject every pending change: added rows detach, the rest restore
    /// their pre-image.
    pub fn rollback_all(&mut self) {
        self.rows.retain(|(_, row)| row.state() != RowState::Added);
        for (_, row) in &mut self.rows {
            row.rollback();
        }
    }

    /// Accept one row's pending change. No-op for a detached handle.
    pub fn commit_row(&mut self, id: RowId) {
        if let Some(pos) = self.position(id) {
            if self.rows[pos].1.state() == RowState::Deleted {
                self.rows.remove(pos);
            } else {
                self.rows[pos].1.commit();
            }
        }
    }

    /// Reject one row's pending change. No-op for a detached handle.
    pub fn rollback_row(&mut self, id: RowId) {
        if let Some(pos) = self.position(id) {
            if self.rows[pos].1.state() == RowState::Added {
                self.rows.remove(pos);
            } else {
                self.rows[pos].1.rollback();
            }
        }
    }

    /// Drop every row, keeping the schema. Used by refill.
    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }
}
