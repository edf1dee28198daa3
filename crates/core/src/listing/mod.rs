//! Listing source abstraction.
//!
//! This module provides a `ListingSource` trait for querying the tracker that
//! publishes releases, plus an HTTP/JSON backend.

mod http;
mod types;

pub use http::HttpListingSource;
pub use types::*;
