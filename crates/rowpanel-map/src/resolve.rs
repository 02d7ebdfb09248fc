//! Role map resolution.
//!
//! Resolution runs exactly once per panel open, before the first fill is
//! shown. An explicit specification assigns roles by field name; without one,
//! roles are handed out to the schema's linear columns in order, following a
//! configured default role ordering.

use serde::{Deserialize, Serialize};

use rowpanel_model::Schema;

use crate::{ColumnSpec, Role, RoleMapError};

/// Resolved assignment of semantic roles to column ordinals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMap {
    pub name: Option<usize>,
    pub owner: Option<usize>,
    pub description: Option<usize>,
    pub size: Option<usize>,
    pub created: Option<usize>,
    pub modified: Option<usize>,
    pub accessed: Option<usize>,
    /// Extra display columns, in specification order.
    pub extras: Vec<usize>,
}

impl RoleMap {
    /// Assign `role` to the column at `ordinal`. Single-valued roles may be
    /// assigned once; extras accumulate.
    pub fn assign(&mut self, role: Role, ordinal: usize) -> Result<(), RoleMapError> {
        let slot = match role {
            Role::Extra => {
                self.extras.push(ordinal);
                return Ok(());
            }
            Role::Name => &mut self.name,
            Role::Owner => &mut self.owner,
            Role::Description => &mut self.description,
            Role::Size => &mut self.size,
            Role::Created => &mut self.created,
            Role::Modified => &mut self.modified,
            Role::Accessed => &mut self.accessed,
        };
        if slot.is_some() {
            return Err(RoleMapError::RoleUsedTwice(role));
        }
        *slot = Some(ordinal);
        Ok(())
    }

    /// Number of assigned roles, extras included.
    pub fn assigned(&self) -> usize {
        [
            self.name,
            self.owner,
            self.description,
            self.size,
            self.created,
            self.modified,
            self.accessed,
        ]
        .iter()
        .filter(|slot| slot.is_some())
        .count()
            + self.extras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned() == 0
    }
}

/// Resolve an explicit ordered specification against `schema`.
pub fn resolve_explicit(
    schema: &Schema,
    specs: &[ColumnSpec],
) -> Result<RoleMap, RoleMapError> {
    let mut map = RoleMap::default();
    for spec in specs {
        let role: Role = spec.code.parse()?;
        let ordinal = schema
            .ordinal_of(&spec.field)
            .ok_or_else(|| RoleMapError::FieldNotFound(spec.field.clone()))?;
        map.assign(role, ordinal)?;
    }
    if map.is_empty() {
        return Err(RoleMapError::NoDisplayColumn);
    }
    Ok(map)
}

/// Resolve automatically: walk the schema in column order, skip non-linear
/// columns, and give each taken column the next role from `order` (falling
/// back to extra columns once `order` runs out), stopping after
/// `max_columns` assignments.
pub fn resolve_auto(
    schema: &Schema,
    order: &[Role],
    max_columns: usize,
) -> Result<RoleMap, RoleMapError> {
    let mut map = RoleMap::default();
    let mut taken = 0;
    for (ordinal, column) in schema.columns().iter().enumerate() {
        if taken >= max_columns {
            break;
        }
        if !column.ty.is_linear() {
            continue;
        }
        let role = order.get(taken).copied().unwrap_or(Role::Extra);
        map.assign(role, ordinal)?;
        taken += 1;
    }
    if map.is_empty() {
        return Err(RoleMapError::NoDisplayColumn);
    }
    Ok(map)
}
