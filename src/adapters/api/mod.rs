//! Source API adapter
//!
//! The [`PaginatedFetcher`] trait hides how records are paged out of the source;
//! [`RestApiClient`] implements it for JSON list endpoints that answer
//! `?page=N` with `{ "info": { "next": ... }, "results": [...] }`.

pub mod client;
pub mod models;

pub use client::{PaginatedFetcher, RestApiClient};
pub use models::{PageInfo, PageResponse};
