//! Panel configuration.

use serde::{Deserialize, Serialize};

use rowpanel_map::Role;

/// Options controlling panel behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelOptions {
    /// Upper bound on the number of automatically mapped columns.
    pub max_auto_columns: usize,

    /// Role handed to each successive linear column during automatic
    /// mapping. Columns past the end of this list become extra columns.
    pub auto_role_order: Vec<Role>,

    /// Ask before deleting selected rows.
    pub confirm_delete: bool,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            max_auto_columns: 8,
            auto_role_order: vec![
                Role::Name,
                Role::Description,
                Role::Owner,
                Role::Size,
                Role::Created,
                Role::Modified,
                Role::Accessed,
            ],
            confirm_delete: true,
        }
    }
}

impl PanelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_auto_columns(mut self, max: usize) -> Self {
        self.max_auto_columns = max;
        self
    }

    pub fn with_auto_role_order(mut self, order: Vec<Role>) -> Self {
        self.auto_role_order = order;
        self
    }

    pub fn with_confirm_delete(mut self, confirm: bool) -> Self {
        self.confirm_delete = confirm;
        self
    }
}
