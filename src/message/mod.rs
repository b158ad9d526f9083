//! Message model: requests, responses and their parameter bags

pub mod parameters;
mod request;
mod response;

pub use parameters::{Parameter, Parameters};
pub use request::{FileData, FileValue, FormData, FormValue, InternalRequest, Request};
pub use response::Response;
