pub mod error;
pub mod ids;
pub mod row;
pub mod table;
pub mod value;

pub use error::{ModelError, Result};
pub use ids::{FieldName, RowId};
pub use row::{Row, RowState};
pub use table::{Column, Schema, Table};
pub use value::{FieldType, Value};
