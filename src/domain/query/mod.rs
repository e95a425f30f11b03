//! Catalog query construction.
//!
//! Filtering is expressed as a list of [`Predicate`]s first and only turned
//! into SQL text by the renderer, so the list and count statements can never
//! disagree on their WHERE clause.

pub mod builder;
pub mod column;
pub mod page;
pub mod predicate;
pub mod render;

pub use builder::{BuiltQuery, QueryBuilder};
pub use column::{Column, SortColumn, SortOrder, SortSpec};
pub use page::{PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use predicate::{predicates_for, Predicate};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SqlParam {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}
