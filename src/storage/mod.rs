pub mod database;
pub mod ingest;
pub mod schema;

pub use database::{Database, Executed, PoolStats};
pub use ingest::{CatalogWriter, LookupCache, NewPhone};
