pub mod catalog_service;

pub use catalog_service::{CatalogService, DeviceList, SearchResult, Sorting, Timed};
