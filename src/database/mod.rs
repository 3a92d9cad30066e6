pub mod connection;
pub mod manager;
pub mod queries;

pub use connection::{Connection, ConnectionProvider, PgConnection, PgConnectionProvider};
pub use manager::{DatabaseError, DatabaseManager};
