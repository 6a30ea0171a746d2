//! Access to the listing site: transport, parsing and the seams the core consumes.

pub mod html;
pub mod http;
pub mod traits;

pub use html::{SiteClient, SiteParser};
pub use http::{HttpFetcher, Pacer};
pub use traits::{DetailSource, Fetcher, ListingPage, ListingSource};
