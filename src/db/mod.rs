pub mod connection;
pub mod schema;

pub use connection::{init_db, ConciergeDb};
pub use schema::apply_schema;
