// conform-core/src/domain/schema/mod.rs

pub mod mapping;
pub mod resolver;
pub mod table;
pub mod value;

pub use mapping::{ColumnMapping, DataType, header_key};
pub use resolver::{CellCoercionIssue, Resolution, SchemaResolver};
pub use table::{ColumnInfo, NormalizedTable, RawTable};
pub use value::CellValue;
