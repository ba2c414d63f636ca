//! HTTP request and response models
//!
//! These types exist only in the HTTP layer and use camelCase JSON.

pub mod request;
pub mod response;

pub use request::PageQuery;
pub use response::{
    BitstreamResponse, BundleResponse, HealthCheckResponse, PageMetadata, VersionHistoryResponse,
    VersionPageResponse, VersionResponse,
};
