//! Turn parsed arguments into a configuration and requests

use url::Url;

use crate::cli::args::Args;
use crate::config::Configuration;
use crate::errors::{CourierError, Result};
use crate::message::InternalRequest;

/// Check if a string has a valid URL scheme (e.g., "http://", "https://")
fn has_url_scheme(s: &str) -> bool {
    if let Some(pos) = s.find("://") {
        let scheme = &s[..pos];
        scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && scheme.chars().skip(1).all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
    } else {
        false
    }
}

/// Parse localhost shorthand (`:PORT/path` or `:/path`) into (port, rest)
fn parse_localhost_shorthand(s: &str) -> Option<(&str, &str)> {
    if !s.starts_with(':') || s.starts_with("::") {
        return None;
    }

    let after_colon = &s[1..];
    let (port, rest) = match after_colon.find('/') {
        Some(slash) => (&after_colon[..slash], &after_colon[slash..]),
        None => (after_colon, ""),
    };

    port.chars().all(|c| c.is_ascii_digit()).then_some((port, rest))
}

/// Add a missing scheme and expand localhost shorthand
pub fn process_url(raw_url: &str) -> Result<String> {
    let mut url = raw_url.trim().to_string();

    if let Some(stripped) = url.strip_prefix("://") {
        url = stripped.to_string();
    }

    if !has_url_scheme(&url) {
        if let Some((port, rest)) = parse_localhost_shorthand(&url) {
            url = if port.is_empty() {
                format!("localhost{}", rest)
            } else {
                format!("localhost:{}{}", port, rest)
            };
        }
        url = format!("http://{}", url);
    }

    Url::parse(&url).map_err(|e| CourierError::InvalidRequest(format!("Invalid URL '{}': {}", url, e)))?;
    Ok(url)
}

/// Configuration file (or defaults) with command-line overrides applied
pub fn configuration(args: &Args) -> Result<Configuration> {
    let mut config = match &args.config {
        Some(path) => Configuration::load(path)?,
        None => Configuration::load_default()?,
    };

    if let Some(max) = args.max_redirects {
        config = config.with_max_redirects(max);
    }
    if let Some(seconds) = args.timeout {
        config = config.with_timeout_secs(seconds)?;
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    Ok(config)
}

/// One request per URL, all sharing method, headers and form data
pub fn requests(args: &Args, config: &Configuration) -> Result<Vec<InternalRequest>> {
    let method = args.effective_method();
    let headers = args.header_map()?;
    let data = args.form_data()?;

    args.urls
        .iter()
        .map(|raw| {
            Ok(InternalRequest::new(process_url(raw)?, method)
                .with_protocol_version(config.protocol_version())
                .with_headers(headers.clone())
                .with_data(data.clone()))
        })
        .collect()
}
