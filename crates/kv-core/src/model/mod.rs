//! Modelo de datos de filas: tipos declarados, valores, schema y fila.

mod row;
mod schema;
mod value;

pub use row::Row;
pub use schema::{FieldMeta, RowSchema};
pub use value::{FieldValue, ValueType};
