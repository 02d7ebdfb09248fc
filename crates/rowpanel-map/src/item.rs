use chrono::{DateTime, Utc};

use rowpanel_model::{Row, Value};

use crate::RoleMap;

/// Listable projection of a row through a role map.
///
/// The item owns nothing: every accessor reads through to the backing row,
/// so an edit made through any other path (a detail editor, a rollback) is
/// immediately visible here. Item identity is row identity.
#[derive(Debug, Clone, Copy)]
pub struct RowItem<'a> {
    row: &'a Row,
    map: &'a RoleMap,
}

impl<'a> RowItem<'a> {
    pub fn new(row: &'a Row, map: &'a RoleMap) -> Self {
        Self { row, map }
    }

    pub fn row(&self) -> &'a Row {
        self.row
    }

    fn text(&self, slot: Option<usize>) -> String {
        slot.and_then(|ordinal| self.row.value(ordinal))
            .map(Value::display)
            .unwrap_or_default()
    }

    fn time(&self, slot: Option<usize>) -> Option<DateTime<Utc>> {
        slot.and_then(|ordinal| self.row.value(ordinal))
            .and_then(Value::as_time)
    }

    pub fn name(&self) -> String {
        self.text(self.map.name)
    }

    pub fn owner(&self) -> String {
        self.text(self.map.owner)
    }

    pub fn description(&self) -> String {
        self.text(self.map.description)
    }

    pub fn size(&self) -> i64 {
        self.map
            .size
            .and_then(|ordinal| self.row.value(ordinal))
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.time(self.map.created)
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.time(self.map.modified)
    }

    pub fn accessed(&self) -> Option<DateTime<Utc>> {
        self.time(self.map.accessed)
    }

    /// Extra column texts, in specification order.
    pub fn extras(&self) -> Vec<String> {
        self.map
            .extras
            .iter()
            .map(|&ordinal| self.text(Some(ordinal)))
            .collect()
    }
}
