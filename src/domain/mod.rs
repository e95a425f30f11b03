//! Catalog domain: entities, filter criteria, comparison and query building.

pub mod catalog;
pub mod compare;
pub mod filter;
pub mod query;
