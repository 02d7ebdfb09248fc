use std::path::PathBuf;

use thiserror::Error;

use rowpanel_core::PanelError;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("csv {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("{} has no header row", path.display())]
    NoHeader { path: PathBuf },
}

impl From<CsvError> for PanelError {
    fn from(err: CsvError) -> Self {
        PanelError::Provider(err.to_string())
    }
}
