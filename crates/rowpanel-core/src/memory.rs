//! In-memory reference data source.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use rowpanel_model::{ModelError, RowId, RowState, Schema, Table, Value};

use crate::error::{PanelError, Result};
use crate::source::{CommandKind, DataSource};

/// Data source over an owned in-memory store of rows.
///
/// Fill snapshots the store into a table. Write-back validates every
/// pending row's pre-image against the store before anything is applied,
/// so a concurrent writer surfaces as a conflict instead of a lost update.
pub struct MemorySource {
    name: String,
    schema: Schema,
    store: Vec<(u64, Vec<Value>)>,
    next_key: u64,
    /// Table row handle → store key, rebuilt on every fill.
    index: BTreeMap<RowId, u64>,
    commands: BTreeSet<CommandKind>,
    build_calls: usize,
    can_build: bool,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            store: Vec::new(),
            next_key: 0,
            index: BTreeMap::new(),
            commands: BTreeSet::new(),
            build_calls: 0,
            can_build: true,
        }
    }

    /// Disable the command-builder capability.
    pub fn without_builder(mut self) -> Self {
        self.can_build = false;
        self
    }

    /// Seed one stored row.
    pub fn push(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.schema.len() {
            return Err(PanelError::Model(ModelError::WidthMismatch {
                expected: self.schema.len(),
                got: values.len(),
            }));
        }
        let key = self.next_key;
        self.next_key += 1;
        self.store.push((key, values));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Stored rows, in order.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.store.iter().map(|(_, values)| values.as_slice())
    }

    /// Overwrite one stored cell, bypassing any open panel session. This is
    /// the concurrent-writer path.
    pub fn overwrite(&mut self, row: usize, ordinal: usize, value: Value) -> Result<()> {
        let entry = self
            .store
            .get_mut(row)
            .ok_or_else(|| PanelError::Provider(format!("no stored row {row}")))?;
        let cell = entry
            .1
            .get_mut(ordinal)
            .ok_or_else(|| PanelError::Provider(format!("no stored column {ordinal}")))?;
        *cell = value;
        Ok(())
    }

    /// Remove one stored row, bypassing any open panel session.
    pub fn remove(&mut self, row: usize) -> Result<()> {
        if row >= self.store.len() {
            return Err(PanelError::Provider(format!("no stored row {row}")));
        }
        self.store.remove(row);
        Ok(())
    }

    /// Number of times the command builder actually ran.
    pub fn build_calls(&self) -> usize {
        self.build_calls
    }

    fn require_command(&self, kind: CommandKind) -> Result<()> {
        if self.commands.contains(&kind) {
            Ok(())
        } else {
            Err(PanelError::Config(format!(
                "update requires a derived {kind} command"
            )))
        }
    }
}

enum Step<'a> {
    Insert(RowId, &'a [Value]),
    Update(u64, &'a [Value]),
    Delete(u64),
}

impl DataSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_fill(&self) -> bool {
        true
    }

    fn fill(&mut self) -> Result<Table> {
        let mut table = Table::new(self.name.clone(), self.schema.clone());
        self.index.clear();
        for (key, values) in &self.store {
            let id = table.push_row(values.clone())?;
            self.index.insert(id, *key);
        }
        debug!(rows = table.len(), "memory source filled");
        Ok(table)
    }

    fn can_build_commands(&self) -> bool {
        self.can_build
    }

    fn has_command(&self, kind: CommandKind) -> bool {
        self.commands.contains(&kind)
    }

    fn build_command(&mut self, kind: CommandKind) -> Result<()> {
        if !self.can_build {
            return Err(PanelError::Config(
                "the memory source has no command builder".to_string(),
            ));
        }
        self.build_calls += 1;
        self.commands.insert(kind);
        debug!(%kind, "command derived");
        Ok(())
    }

    fn update(&mut self, table: &Table) -> Result<()> {
        // Validate everything first; apply only when the whole batch is good.
        let mut steps = Vec::new();
        for (id, row) in table.rows() {
            match row.state() {
                RowState::Unchanged => {}
                RowState::Added => {
                    self.require_command(CommandKind::Insert)?;
                    steps.push(Step::Insert(id, row.values()));
                }
                RowState::Modified | RowState::Deleted => {
                    let kind = if row.state() == RowState::Modified {
                        CommandKind::Update
                    } else {
                        CommandKind::Delete
                    };
                    self.require_command(kind)?;
                    let key = *self.index.get(&id).ok_or_else(|| {
                        PanelError::Conflict(format!("{id} is not in the backing store"))
                    })?;
                    let stored = self
                        .store
                        .iter()
                        .find(|(stored_key, _)| *stored_key == key)
                        .ok_or_else(|| {
                            PanelError::Conflict(format!(
                                "{id} was removed from the backing store"
                            ))
                        })?;
                    if stored.1.as_slice() != row.pre_image() {
                        return Err(PanelError::Conflict(format!(
                            "{id} changed in the backing store since fill"
                        )));
                    }
                    steps.push(if row.state() == RowState::Modified {
                        Step::Update(key, row.values())
                    } else {
                        Step::Delete(key)
                    });
                }
            }
        }

        for step in steps {
            match step {
                Step::Insert(id, values) => {
                    let key = self.next_key;
                    self.next_key += 1;
                    self.store.push((key, values.to_vec()));
                    self.index.insert(id, key);
                }
                Step::Update(key, values) => {
                    if let Some(entry) = self
                        .store
                        .iter_mut()
                        .find(|(stored_key, _)| *stored_key == key)
                    {
                        entry.1 = values.to_vec();
                    }
                }
                Step::Delete(key) => {
                    self.store.retain(|(stored_key, _)| *stored_key != key);
                    self.index.retain(|_, stored_key| *stored_key != key);
                }
            }
        }
        Ok(())
    }
}
