//! Data panel synchronization engine.
//!
//! Projects rows of a tabular data source into a navigable item list and
//! writes mutations back through lazily derived insert/update/delete
//! commands. The host framework owns rendering, sorting, and selection;
//! this crate owns the row-to-item mapping and the save/close/refresh
//! sequencing, including conflict handling at the save boundary.

pub mod commands;
pub mod error;
pub mod host;
pub mod memory;
pub mod options;
pub mod panel;
pub mod source;

pub use commands::{ensure_command, ensure_commands};
pub use error::{PanelError, Result};
pub use host::{PanelHost, SaveChoice};
pub use memory::MemorySource;
pub use options::PanelOptions;
pub use panel::DataPanel;
pub use source::{CommandKind, DataSource};
