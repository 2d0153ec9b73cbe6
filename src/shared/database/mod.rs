pub mod connection;

pub use connection::{check_column_exists, create_tables, initialize_database};
