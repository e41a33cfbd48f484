pub mod list_query;
pub mod table;

pub use list_query::{ListQuery, SqlQuery, DEFAULT_LIMIT, MAX_LIMIT, RESERVED_KEYS};
pub use table::{Column, ColumnKind, Table, JOBS, USERS};
