pub mod error;
pub mod item;
pub mod resolve;
pub mod role;

pub use error::RoleMapError;
pub use item::RowItem;
pub use resolve::{RoleMap, resolve_auto, resolve_explicit};
pub use role::{ColumnSpec, Role};
