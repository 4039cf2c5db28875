pub mod filters;
pub mod queries;

pub use filters::{ListingFilters, ListingQuery, SortField, SortOrder, Viewer};
