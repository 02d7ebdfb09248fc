//! Error types for role resolution.

use std::fmt;

use crate::Role;

/// Errors from resolving a column-role map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleMapError {
    /// Role code not recognized.
    InvalidRoleCode(String),
    /// A single-valued role appeared twice in the specification.
    RoleUsedTwice(Role),
    /// Field name not present in the schema.
    FieldNotFound(String),
    /// Resolution produced no displayable column.
    NoDisplayColumn,
}

impl RoleMapError {
    /// True for errors caused by a malformed specification, as opposed to a
    /// schema that cannot satisfy it.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::InvalidRoleCode(_) | Self::RoleUsedTwice(_)
        )
    }
}

impl fmt::Display for RoleMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRoleCode(code) => write!(f, "invalid column role code: '{code}'"),
            Self::RoleUsedTwice(role) => {
                write!(f, "column role '{}' is used twice", role.code())
            }
            Self::FieldNotFound(field) => write!(f, "no such field: '{field}'"),
            Self::NoDisplayColumn => write!(f, "no column to display"),
        }
    }
}

impl std::error::Error for RoleMapError {}
