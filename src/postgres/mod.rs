// PostgreSQL backend.
//
// tokio-postgres is driven on a current-thread runtime owned by each
// connection, so every call blocks the caller until the server answers.

mod connection;
mod numeric;
mod params;
mod query;

pub use connection::PostgresConnection;
pub use params::Params;
pub use query::{build_result_table, postgres_extract_value};
