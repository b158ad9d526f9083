//! Out-of-band metadata carried by requests and responses

use std::sync::Arc;

use indexmap::IndexMap;

use super::InternalRequest;

/// Final URL a response was obtained from
pub const EFFECTIVE_URL: &str = "effective_url";
/// Number of redirects followed so far in a chain
pub const REDIRECT_COUNT: &str = "redirect_count";
/// Request a response is attributed to
pub const REQUEST: &str = "request";
/// First request of a redirect or retry chain
pub const PARENT_REQUEST: &str = "parent_request";
/// Number of retries issued so far for a request
pub const RETRY_COUNT: &str = "retry_count";

/// A single parameter value
#[derive(Debug, Clone)]
pub enum Parameter {
    Text(String),
    Count(u32),
    Request(Arc<InternalRequest>),
}

/// Open string-keyed parameter bag
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: IndexMap<String, Parameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Parameter) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        self.values.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(Parameter::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn count(&self, name: &str) -> Option<u32> {
        match self.values.get(name) {
            Some(Parameter::Count(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn request(&self, name: &str) -> Option<&Arc<InternalRequest>> {
        match self.values.get(name) {
            Some(Parameter::Request(request)) => Some(request),
            _ => None,
        }
    }

    pub fn effective_url(&self) -> Option<&str> {
        self.text(EFFECTIVE_URL)
    }

    pub fn redirect_count(&self) -> Option<u32> {
        self.count(REDIRECT_COUNT)
    }

    pub fn retry_count(&self) -> Option<u32> {
        self.count(RETRY_COUNT)
    }

    pub fn parent_request(&self) -> Option<&Arc<InternalRequest>> {
        self.request(PARENT_REQUEST)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
