//! Lazy derivation of write-back commands.
//!
//! Commands are built on first demand, not at open: insert when a row is
//! created, delete when a delete starts, and all three before every save so
//! a save can never fail for a missing command.

use crate::error::{PanelError, Result};
use crate::source::{CommandKind, DataSource};

/// Ensure a derived command of `kind` exists on the source. No-op when the
/// source already caches one.
pub fn ensure_command<S: DataSource + ?Sized>(source: &mut S, kind: CommandKind) -> Result<()> {
    if source.has_command(kind) {
        return Ok(());
    }
    if !source.can_build_commands() {
        return Err(PanelError::Config(format!(
            "cannot derive the {kind} command: the data source has no command builder"
        )));
    }
    source.build_command(kind)
}

/// Ensure all three derived commands exist.
pub fn ensure_commands<S: DataSource + ?Sized>(source: &mut S) -> Result<()> {
    for kind in CommandKind::ALL {
        ensure_command(source, kind)?;
    }
    Ok(())
}
