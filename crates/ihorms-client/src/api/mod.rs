mod client;
mod error;
pub mod http;
mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use http::{HttpBody, HttpClient, HttpRequest, HttpResponse, ReqwestClient};
pub use request::RequestDescriptor;
