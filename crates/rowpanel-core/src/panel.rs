//! The sync lifecycle controller.
//!
//! A panel moves through `Closed → Opening → Open` and back; while open,
//! edits run through `create`/`delete_items`/`save`, closing runs through
//! the `can_close` gate, and `refresh` reloads from the data source behind
//! the same gate. Role resolution happens exactly once per open; the dirty
//! flag drives the passive item prune in `update_items`.

use tracing::{debug, warn};

use rowpanel_map::{ColumnSpec, RoleMap, RowItem, resolve_auto, resolve_explicit};
use rowpanel_model::{RowId, RowState, Table};

use crate::commands::{ensure_command, ensure_commands};
use crate::error::{PanelError, Result};
use crate::host::{PanelHost, SaveChoice};
use crate::options::PanelOptions;
use crate::source::{CommandKind, DataSource};

fn not_open() -> PanelError {
    PanelError::Config("the panel is not open".to_string())
}

/// Sync lifecycle controller: projects a data source's rows as items and
/// sequences create, delete, save, close, and refresh against their change
/// state.
pub struct DataPanel<S: DataSource> {
    source: S,
    options: PanelOptions,
    columns: Option<Vec<ColumnSpec>>,
    table: Option<Table>,
    map: Option<RoleMap>,
    items: Vec<RowId>,
    /// True while a structural change may require a display reconcile.
    dirty: bool,
    opened: bool,
    on_closed: Option<Box<dyn FnMut(&Table)>>,
}

impl<S: DataSource> DataPanel<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            options: PanelOptions::default(),
            columns: None,
            table: None,
            map: None,
            items: Vec::new(),
            dirty: true,
            opened: false,
            on_closed: None,
        }
    }

    pub fn with_options(mut self, options: PanelOptions) -> Self {
        self.options = options;
        self
    }

    /// Use an explicit column-role specification instead of automatic
    /// mapping.
    pub fn with_columns(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Reuse a caller-owned table instead of filling at open.
    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    /// Lifecycle callback run at the closing transition, before the table
    /// is released.
    pub fn on_closed(mut self, callback: impl FnMut(&Table) + 'static) -> Self {
        self.on_closed = Some(Box::new(callback));
        self
    }

    fn require_table(&self) -> Result<&Table> {
        self.table.as_ref().ok_or_else(not_open)
    }

    fn require_table_mut(&mut self) -> Result<&mut Table> {
        self.table.as_mut().ok_or_else(not_open)
    }

    /// Fill the table if needed, resolve the role map, and publish the
    /// item list. Fails without publishing any state when the data source
    /// has no select operation or the role map cannot be resolved.
    pub fn open(&mut self) -> Result<()> {
        if self.opened {
            return Ok(());
        }
        if self.table.is_none() {
            if !self.source.can_fill() {
                return Err(PanelError::Config(
                    "the data source has no select operation".to_string(),
                ));
            }
            self.table = Some(self.source.fill()?);
        }
        let Some(table) = self.table.as_ref() else {
            return Err(not_open());
        };
        let map = match &self.columns {
            Some(specs) => resolve_explicit(table.schema(), specs)?,
            None => resolve_auto(
                table.schema(),
                &self.options.auto_role_order,
                self.options.max_auto_columns,
            )?,
        };
        self.items = table.rows().map(|(id, _)| id).collect();
        debug!(table = table.name(), rows = self.items.len(), "panel opened");
        self.map = Some(map);
        self.dirty = true;
        self.opened = true;
        Ok(())
    }

    /// Append a blank row, show it, and hand it to the detail editor.
    pub fn create(&mut self, host: &mut dyn PanelHost) -> Result<RowId> {
        ensure_command(&mut self.source, CommandKind::Insert)?;
        let table = self.table.as_mut().ok_or_else(not_open)?;
        let id = table.new_row();
        self.items.push(id);
        self.dirty = true;
        debug!(%id, "row created");
        host.open_detail(id);
        Ok(id)
    }

    /// Delete the selected rows one at a time through the shared save path.
    ///
    /// The first write-back failure restores that row and stops the batch;
    /// rows already deleted stay committed.
    pub fn delete_items(&mut self, host: &mut dyn PanelHost, selected: &[RowId]) -> Result<()> {
        ensure_command(&mut self.source, CommandKind::Delete)?;

        if self.options.confirm_delete && !host.confirm_delete(selected.len()) {
            return Ok(());
        }

        self.dirty = true;
        for &id in selected {
            if self.require_table()?.row(id).is_none() {
                self.items.retain(|item| *item != id);
                continue;
            }
            self.require_table_mut()?.delete(id)?;
            let saved = match self.save(host) {
                Ok(saved) => saved,
                Err(err) => {
                    self.restore_row(id);
                    return Err(err);
                }
            };
            if !saved {
                self.restore_row(id);
                break;
            }
        }
        Ok(())
    }

    fn restore_row(&mut self, id: RowId) {
        if let Some(table) = self.table.as_mut() {
            table.rollback_row(id);
        }
        if !self.items.contains(&id) {
            self.items.push(id);
        }
        warn!(%id, "delete rolled back");
    }

    /// Write pending changes back through the derived commands.
    ///
    /// Returns `Ok(true)` when the batch committed and `Ok(false)` when the
    /// write-back was rejected with a conflict or failed in the provider;
    /// in both cases the error has already been reported through the host
    /// and the table keeps its pending changes.
    pub fn save(&mut self, host: &mut dyn PanelHost) -> Result<bool> {
        ensure_commands(&mut self.source)?;
        self.dirty = true;
        let table = self.table.as_mut().ok_or_else(not_open)?;
        match self.source.update(table) {
            Ok(()) => {
                table.commit_all();
                debug!("write-back committed");
                Ok(true)
            }
            Err(err @ (PanelError::Conflict(_) | PanelError::Provider(_))) => {
                warn!(error = %err, "write-back failed");
                host.show_error(&err.to_string());
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// True when the table currently carries any uncommitted change.
    pub fn has_pending_changes(&self) -> bool {
        self.table.as_ref().is_some_and(Table::has_changes)
    }

    /// Close-eligibility check. Without pending changes the close goes
    /// through silently; with them the host prompts for save, discard, or
    /// cancel.
    pub fn can_close(&mut self, host: &mut dyn PanelHost) -> Result<bool> {
        if !self.has_pending_changes() {
            return Ok(true);
        }
        match host.ask_save_changes() {
            SaveChoice::Save => self.save(host),
            SaveChoice::Discard => {
                if let Some(table) = self.table.as_mut() {
                    table.rollback_all();
                }
                self.dirty = true;
                Ok(true)
            }
            SaveChoice::Cancel => Ok(false),
        }
    }

    /// Close-eligibility check for a single row being edited in the detail
    /// editor.
    pub fn can_close_row(&mut self, host: &mut dyn PanelHost, id: RowId) -> Result<bool> {
        let pending = self
            .table
            .as_ref()
            .and_then(|table| table.row(id))
            .is_some_and(|row| row.state().is_pending());
        if !pending {
            return Ok(true);
        }
        match host.ask_save_changes() {
            SaveChoice::Save => self.save(host),
            SaveChoice::Discard => {
                if let Some(table) = self.table.as_mut() {
                    table.rollback_row(id);
                }
                self.dirty = true;
                Ok(true)
            }
            SaveChoice::Cancel => Ok(false),
        }
    }

    /// Explicit reload. With pending changes this runs the close-style gate
    /// first; the refill happens only on save-success or discard.
    pub fn refresh(&mut self, host: &mut dyn PanelHost) -> Result<()> {
        if self.source.can_fill() && self.can_close(host)? {
            let table = self.source.fill()?;
            self.items = table.rows().map(|(id, _)| id).collect();
            debug!(rows = self.items.len(), "panel refilled");
            self.table = Some(table);
            self.dirty = true;
        }
        self.update_items();
        Ok(())
    }

    /// Passive display refresh: prune items whose backing row is deleted
    /// or detached. Runs only when the dirty flag says something may have
    /// changed, and never touches the data source.
    pub fn update_items(&mut self) {
        if !self.dirty {
            return;
        }
        self.prune_items();
        self.dirty = false;
    }

    fn prune_items(&mut self) {
        if let Some(table) = self.table.as_ref() {
            self.items
                .retain(|id| table.row(*id).is_some_and(|row| row.state() != RowState::Deleted));
        }
    }

    /// Closing→Closed transition: offer a last save, invoke the lifecycle
    /// callback, then release the table.
    pub fn closed(&mut self, host: &mut dyn PanelHost) -> Result<()> {
        if self.source.can_fill() && self.has_pending_changes() && host.ask_save_on_close() {
            self.save(host)?;
        }
        if let Some(callback) = self.on_closed.as_mut() {
            if let Some(table) = self.table.as_ref() {
                callback(table);
            }
        }
        self.table = None;
        self.map = None;
        self.items.clear();
        self.opened = false;
        debug!("panel closed");
        Ok(())
    }

    /// External signal that the displayed data may be stale.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Route an item to the detail editor.
    pub fn open_item(&self, host: &mut dyn PanelHost, id: RowId) {
        host.open_detail(id);
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Displayed items, in order.
    pub fn items(&self) -> &[RowId] {
        &self.items
    }

    /// Project one displayed row as an item.
    pub fn item(&self, id: RowId) -> Option<RowItem<'_>> {
        let table = self.table.as_ref()?;
        let map = self.map.as_ref()?;
        let row = table.row(id)?;
        Some(RowItem::new(row, map))
    }

    pub fn title(&self) -> String {
        match self.table.as_ref().map(Table::name) {
            Some(name) if !name.is_empty() => format!("Table {name}"),
            _ => "Data Table".to_string(),
        }
    }

    pub fn help_topic(&self) -> &'static str {
        "data-panel"
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Mutable access for the detail editor; edits are visible to every
    /// item immediately.
    pub fn table_mut(&mut self) -> Option<&mut Table> {
        self.table.as_mut()
    }

    pub fn role_map(&self) -> Option<&RoleMap> {
        self.map.as_ref()
    }

    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
