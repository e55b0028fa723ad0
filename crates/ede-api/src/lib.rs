mod client;
mod error;
mod fetch;
mod http;
mod resource;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ApiClient, ApiRequest, Method};
pub use error::{ApiError, extract_detail};
pub use fetch::{FetchStrategy, fetch_by_id};
pub use http::{HttpClient, parse_body};
pub use resource::{ListPage, Resource, UpdateMethod};
