//! Configuration handling

#[allow(clippy::module_inception)]
mod config;

pub use config::{
    Configuration, EncodingType, DEFAULT_BOUNDARY, DEFAULT_CONCURRENCY, DEFAULT_MAX_REDIRECTS,
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
};
