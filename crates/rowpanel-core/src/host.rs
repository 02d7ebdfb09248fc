use rowpanel_model::RowId;

/// Answer to the pending-changes prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveChoice {
    Save,
    Discard,
    Cancel,
}

/// The surrounding panel framework: modal prompts, error messages, and the
/// detail editor. Prompts block the calling flow until answered.
pub trait PanelHost {
    /// Three-choice prompt for pending changes: save, discard, or cancel
    /// the operation that asked.
    fn ask_save_changes(&mut self) -> SaveChoice;

    /// Two-choice prompt used when the panel is already closing: save, or
    /// let the changes go.
    fn ask_save_on_close(&mut self) -> bool;

    /// Confirm deleting `count` selected rows.
    fn confirm_delete(&mut self, count: usize) -> bool;

    /// Show a non-fatal error message.
    fn show_error(&mut self, message: &str);

    /// Hand a row over to the detail editor.
    fn open_detail(&mut self, id: RowId);
}
