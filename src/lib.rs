pub mod app;
pub mod client;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::catalog_service::CatalogService;
pub use client::{CatalogClient, ClientError};
pub use domain::compare::ComparisonTable;
pub use domain::filter::FilterCriteria;
pub use domain::query::{BuiltQuery, QueryBuilder, SortSpec};
pub use error::{AppError, Result};
pub use infra::config::Config;
pub use storage::{CatalogWriter, Database};
