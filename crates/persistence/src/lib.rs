pub mod error;
pub mod postgres;

pub use error::{PersistenceError, Result};
pub use postgres::PostgresStore;
