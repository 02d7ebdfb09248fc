//! Semantic column roles and their wire codes.
//!
//! A role specification names each mapped field together with a short code:
//! `N` (name), `O` (owner), `Z` (description), `S` (size), `C` (extra
//! column, repeatable), or `D` followed by `C`/`M`/`A` for the created,
//! modified, and accessed timestamps. Codes parse into the closed [`Role`]
//! enum; anything else is rejected at parse time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RoleMapError;

/// Semantic purpose a column can play in the item projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Name,
    Owner,
    Description,
    Size,
    Created,
    Modified,
    Accessed,
    /// Additional display column; the only repeatable role.
    Extra,
}

impl Role {
    /// The role code as written in a column specification.
    pub fn code(self) -> &'static str {
        match self {
            Role::Name => "N",
            Role::Owner => "O",
            Role::Description => "Z",
            Role::Size => "S",
            Role::Created => "DC",
            Role::Modified => "DM",
            Role::Accessed => "DA",
            Role::Extra => "C",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Name => "Name",
            Role::Owner => "Owner",
            Role::Description => "Description",
            Role::Size => "Size",
            Role::Created => "Created",
            Role::Modified => "Modified",
            Role::Accessed => "Accessed",
            Role::Extra => "Extra",
        }
    }

    /// True for roles that may be assigned at most once.
    pub fn is_single(self) -> bool {
        !matches!(self, Role::Extra)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        match code.as_str() {
            "N" => Ok(Role::Name),
            "O" => Ok(Role::Owner),
            "Z" => Ok(Role::Description),
            "S" => Ok(Role::Size),
            "C" => Ok(Role::Extra),
            "DC" => Ok(Role::Created),
            "DM" => Ok(Role::Modified),
            "DA" => Ok(Role::Accessed),
            _ => Err(RoleMapError::InvalidRoleCode(s.trim().to_string())),
        }
    }
}

/// One entry of an explicit column-role specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Field name in the data source.
    pub field: String,
    /// Role code, parsed via [`Role::from_str`].
    pub code: String,
}

impl ColumnSpec {
    pub fn new(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
        }
    }
}
