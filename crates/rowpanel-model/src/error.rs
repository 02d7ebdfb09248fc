use thiserror::Error;

use crate::RowId;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),
    #[error("row width {got} does not match schema width {expected}")]
    WidthMismatch { expected: usize, got: usize },
    #[error("no column at ordinal {0}")]
    NoSuchColumn(usize),
    #[error("no such row: {0}")]
    NoSuchRow(RowId),
    #[error("{0} is deleted and cannot be edited")]
    DeletedRow(RowId),
}

pub type Result<T> = std::result::Result<T, ModelError>;
