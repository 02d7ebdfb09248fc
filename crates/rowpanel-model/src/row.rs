use serde::{Deserialize, Serialize};

use crate::{ModelError, Value};

/// Change state of a row within the current session.
///
/// States only move through explicit mutation, commit, or rollback. A row
/// that leaves its table (committed delete, rollback of an added row) is
/// detached: it is removed outright and its handle resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowState {
    Unchanged,
    Added,
    Modified,
    Deleted,
}

impl RowState {
    /// True when the row carries an uncommitted change.
    pub fn is_pending(self) -> bool {
        !matches!(self, RowState::Unchanged)
    }
}

/// One record of a table, with change tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
    /// Snapshot of the last committed values, present once the row is edited.
    original: Option<Vec<Value>>,
    state: RowState,
}

impl Row {
    pub(crate) fn committed(values: Vec<Value>) -> Self {
        Self {
            values,
            original: None,
            state: RowState::Unchanged,
        }
    }

    pub(crate) fn blank(width: usize) -> Self {
        Self {
            values: vec![Value::Null; width],
            original: None,
            state: RowState::Added,
        }
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal)
    }

    /// Field values as of the last commit; for added rows, the current ones.
    pub fn pre_image(&self) -> &[Value] {
        self.original.as_deref().unwrap_or(&self.values)
    }

    /// Write one field. The first edit of a committed row snapshots the
    /// pre-image and moves the row to `Modified`.
    pub(crate) fn set(&mut self, ordinal: usize, value: Value) -> Result<(), ModelError> {
        if ordinal >= self.values.len() {
            return Err(ModelError::NoSuchColumn(ordinal));
        }
        if self.state == RowState::Unchanged {
            self.original = Some(self.values.clone());
            self.state = RowState::Modified;
        }
        self.values[ordinal] = value;
        Ok(())
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.state = RowState::Deleted;
    }

    /// Accept the pending change.
    pub(crate) fn commit(&mut self) {
        self.original = None;
        self.state = RowState::Unchanged;
    }

    /// Reject the pending change and restore the pre-image.
    pub(crate) fn rollback(&mut self) {
        if let Some(original) = self.original.take() {
            self.values = original;
        }
        self.state = RowState::Unchanged;
    }
}
