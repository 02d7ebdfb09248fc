use std::fmt;

use rowpanel_model::Table;

use crate::error::Result;

/// Kind of a derived write-back command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandKind {
    Insert,
    Update,
    Delete,
}

impl CommandKind {
    pub const ALL: [CommandKind; 3] = [CommandKind::Insert, CommandKind::Update, CommandKind::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Insert => "insert",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The external collaborator behind a panel: a select operation for filling
/// and, optionally, the capability to derive write-back commands from it.
///
/// Derived commands are cached on the source; [`build_command`] is only
/// called when [`has_command`] says the cache is empty, so a source never
/// derives the same command twice.
///
/// [`build_command`]: DataSource::build_command
/// [`has_command`]: DataSource::has_command
pub trait DataSource {
    /// Identifies the data set; used for the panel title.
    fn name(&self) -> &str;

    /// True when a select operation is configured. Opening a panel without
    /// a caller-supplied table requires it.
    fn can_fill(&self) -> bool;

    /// Execute the select operation, producing a fresh table.
    fn fill(&mut self) -> Result<Table>;

    /// True when the source can derive commands from its select operation.
    fn can_build_commands(&self) -> bool;

    /// True when a derived command of `kind` is already cached.
    fn has_command(&self, kind: CommandKind) -> bool;

    /// Derive and cache the command of `kind` from the select operation.
    fn build_command(&mut self, kind: CommandKind) -> Result<()>;

    /// Execute the write-back batch for every pending row of `table`.
    ///
    /// Either the whole batch applies and `Ok(())` is returned, or nothing
    /// is applied: a pre-image mismatch reports
    /// [`PanelError::Conflict`](crate::PanelError::Conflict), an execution
    /// failure [`PanelError::Provider`](crate::PanelError::Provider).
    fn update(&mut self, table: &Table) -> Result<()>;
}
