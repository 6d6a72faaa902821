// SQLite backend.
//
// - params: binding `SqlValue`s as rusqlite values
// - query: materializing rusqlite rows into a `ResultTable`
// - connection: the `DriverConnection` implementation and commit-mode handling

mod connection;
mod params;
mod query;

pub use connection::SqliteConnection;
pub use params::Params;
pub use query::build_result_table;
