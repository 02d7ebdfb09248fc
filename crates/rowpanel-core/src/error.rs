use thiserror::Error;

use rowpanel_map::RoleMapError;
use rowpanel_model::ModelError;

/// Failure taxonomy of panel operations.
///
/// `Config` and `Usage` abort the operation that raised them and propagate
/// to whatever initiated it. `Conflict` and `Provider` are only ever raised
/// by a write-back attempt and never escape the save boundary: save reports
/// them to the user and returns failure instead.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Missing or invalid data-source configuration.
    #[error("configuration: {0}")]
    Config(String),
    /// Malformed column-role specification.
    #[error("usage: {0}")]
    Usage(String),
    /// The underlying data changed since fill in an incompatible way.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The backing store failed to execute an operation.
    #[error("provider: {0}")]
    Provider(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<RoleMapError> for PanelError {
    fn from(err: RoleMapError) -> Self {
        if err.is_usage() {
            Self::Usage(err.to_string())
        } else {
            Self::Config(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
