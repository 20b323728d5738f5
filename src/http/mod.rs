//! HTTP snapshot types shared by the host contract and the facade.

mod request;
mod response;

pub use request::{Body, Method, RequestInfo, UnknownMethod};
pub use response::{ResponseInfo, StatusCode};
