//! CSV-file-backed data source.
//!
//! The select operation reads the whole file and keeps a SHA-256
//! fingerprint of its bytes. Write-back re-reads the fingerprint first: a
//! file that changed since fill rejects the batch as a conflict. On
//! success the file is rewritten from the table's surviving rows.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use rowpanel_core::{CommandKind, DataSource, PanelError};
use rowpanel_model::{Column, FieldName, FieldType, RowState, Schema, Table, Value};

use crate::error::CsvError;

/// Data source over one delimited text file.
pub struct CsvSource {
    path: PathBuf,
    name: String,
    delimiter: u8,
    commands: BTreeSet<CommandKind>,
    fingerprint: Option<[u8; 32]>,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            delimiter: b',',
            commands: BTreeSet::new(),
            fingerprint: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<(Vec<u8>, Vec<Vec<String>>), CsvError> {
        let bytes = fs::read(&self.path).map_err(|source| CsvError::Read {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(bytes.as_slice());
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| CsvError::Csv {
                path: self.path.clone(),
                source,
            })?;
            let row: Vec<String> = record.iter().map(normalize_cell).collect();
            if row.iter().all(|value| value.trim().is_empty()) {
                continue;
            }
            rows.push(row);
        }
        Ok((bytes, rows))
    }

    fn require_command(&self, kind: CommandKind) -> Result<(), PanelError> {
        if self.commands.contains(&kind) {
            Ok(())
        } else {
            Err(PanelError::Config(format!(
                "update requires a derived {kind} command"
            )))
        }
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn is_bool(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false")
}

/// Pick the narrowest field type every non-empty cell of the column fits.
fn infer_column_type(rows: &[Vec<String>], ordinal: usize) -> FieldType {
    let mut seen = false;
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    let mut all_time = true;
    for row in rows {
        let Some(cell) = row.get(ordinal) else {
            continue;
        };
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            continue;
        }
        seen = true;
        all_int = all_int && trimmed.parse::<i64>().is_ok();
        all_float = all_float && trimmed.parse::<f64>().is_ok();
        all_bool = all_bool && is_bool(trimmed);
        all_time = all_time && DateTime::parse_from_rfc3339(trimmed).is_ok();
    }
    if !seen {
        FieldType::Text
    } else if all_bool {
        FieldType::Bool
    } else if all_int {
        FieldType::Int
    } else if all_float {
        FieldType::Float
    } else if all_time {
        FieldType::Time
    } else {
        FieldType::Text
    }
}

fn parse_value(raw: &str, ty: FieldType) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match ty {
        FieldType::Int => trimmed
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(trimmed.to_string())),
        FieldType::Float => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::Text(trimmed.to_string())),
        FieldType::Bool => Value::Bool(trimmed.eq_ignore_ascii_case("true")),
        FieldType::Time => DateTime::parse_from_rfc3339(trimmed)
            .map(|time| Value::Time(time.with_timezone(&Utc)))
            .unwrap_or_else(|_| Value::Text(trimmed.to_string())),
        FieldType::Text | FieldType::Binary | FieldType::Nested => {
            Value::Text(trimmed.to_string())
        }
    }
}

fn fingerprint(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

impl DataSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_fill(&self) -> bool {
        true
    }

    fn fill(&mut self) -> rowpanel_core::Result<Table> {
        let (bytes, rows) = self.read_raw()?;
        let (header, data) = rows.split_first().ok_or_else(|| CsvError::NoHeader {
            path: self.path.clone(),
        })?;

        let mut columns = Vec::with_capacity(header.len());
        for (ordinal, raw) in header.iter().enumerate() {
            let name = FieldName::new(normalize_header(raw))?;
            columns.push(Column::new(name, infer_column_type(data, ordinal)));
        }
        let schema = Schema::new(columns);

        let mut table = Table::new(self.name.clone(), schema.clone());
        for row in data {
            let values = schema
                .columns()
                .iter()
                .enumerate()
                .map(|(ordinal, column)| {
                    parse_value(row.get(ordinal).map(String::as_str).unwrap_or(""), column.ty)
                })
                .collect();
            table.push_row(values)?;
        }

        self.fingerprint = Some(fingerprint(&bytes));
        debug!(path = %self.path.display(), rows = table.len(), "csv source filled");
        Ok(table)
    }

    fn can_build_commands(&self) -> bool {
        true
    }

    fn has_command(&self, kind: CommandKind) -> bool {
        self.commands.contains(&kind)
    }

    fn build_command(&mut self, kind: CommandKind) -> rowpanel_core::Result<()> {
        // The command layout is derived from the select descriptor's
        // header row; an unreadable or headerless file cannot back one.
        let (_, rows) = self.read_raw()?;
        if rows.is_empty() {
            return Err(CsvError::NoHeader {
                path: self.path.clone(),
            }
            .into());
        }
        self.commands.insert(kind);
        debug!(%kind, path = %self.path.display(), "command derived");
        Ok(())
    }

    fn update(&mut self, table: &Table) -> rowpanel_core::Result<()> {
        for (_, row) in table.rows() {
            match row.state() {
                RowState::Unchanged => {}
                RowState::Added => self.require_command(CommandKind::Insert)?,
                RowState::Modified => self.require_command(CommandKind::Update)?,
                RowState::Deleted => self.require_command(CommandKind::Delete)?,
            }
        }
        if table.changed_rows().is_empty() {
            return Ok(());
        }

        let Some(expected) = self.fingerprint else {
            return Err(PanelError::Config(
                "the csv source was never filled".to_string(),
            ));
        };
        let bytes = fs::read(&self.path).map_err(|source| CsvError::Read {
            path: self.path.clone(),
            source,
        })?;
        if fingerprint(&bytes) != expected {
            return Err(PanelError::Conflict(format!(
                "{} changed since the last fill",
                self.path.display()
            )));
        }

        let mut out = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.delimiter)
                .from_writer(&mut out);
            writer
                .write_record(table.schema().columns().iter().map(|column| column.name.as_str()))
                .map_err(|source| CsvError::Csv {
                    path: self.path.clone(),
                    source,
                })?;
            for (_, row) in table.rows() {
                if row.state() == RowState::Deleted {
                    continue;
                }
                writer
                    .write_record(row.values().iter().map(Value::display))
                    .map_err(|source| CsvError::Csv {
                        path: self.path.clone(),
                        source,
                    })?;
            }
            writer.flush().map_err(|source| CsvError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, &out).map_err(|source| CsvError::Write {
            path: self.path.clone(),
            source,
        })?;

        self.fingerprint = Some(fingerprint(&out));
        debug!(path = %self.path.display(), "csv write-back committed");
        Ok(())
    }
}
