mod result_set;
mod row;

pub use result_set::ResultTable;
pub use row::Row;
