//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::errors::{CourierError, Result};
use crate::http::{Headers, Method};
use crate::message::{FormData, FormValue};

/// Which backend performs the wire work
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum TransportKind {
    /// reqwest client (http and https)
    #[default]
    Reqwest,
    /// Raw TCP socket (plain http only)
    Socket,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "courier", version, about, long_about = None)]
pub struct Args {
    /// Request method; defaults to GET, or POST when data is given
    #[arg(short = 'X', long = "request", value_name = "METHOD")]
    pub method: Option<Method>,

    /// Extra header, `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Form field, `key=value` (repeatable)
    #[arg(short = 'd', long = "data", value_name = "FIELD")]
    pub data: Vec<String>,

    /// Redirects to follow; 0 returns the first 3xx as-is
    #[arg(long = "max-redirects", value_name = "N", env = "COURIER_MAX_REDIRECTS")]
    pub max_redirects: Option<u32>,

    /// Timeout per request in seconds, fractions allowed
    #[arg(long = "timeout", value_name = "SECONDS", env = "COURIER_TIMEOUT")]
    pub timeout: Option<f64>,

    /// Maximum number of requests in flight for several URLs
    #[arg(long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Backend to send requests with
    #[arg(long = "transport", value_enum, default_value_t = TransportKind::Reqwest)]
    pub transport: TransportKind,

    /// Configuration file (defaults to the user config directory)
    #[arg(long = "config", value_name = "FILE", env = "COURIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Retry transport failures this many times
    #[arg(long = "retry", value_name = "N", default_value_t = 0)]
    pub retry: u32,

    /// Print response headers as well as the body
    #[arg(short = 'i', long = "include", action = ArgAction::SetTrue)]
    pub include: bool,

    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Log as JSON lines
    #[arg(long = "log-json", action = ArgAction::SetTrue)]
    pub log_json: bool,

    /// One or more URLs; several are sent as one concurrent batch
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,
}

impl Args {
    /// Method to use given whether form data is present
    pub fn effective_method(&self) -> Method {
        self.method.unwrap_or_else(|| Method::infer(!self.data.is_empty()))
    }

    /// Parse every `-H` value into a header map
    pub fn header_map(&self) -> Result<Headers> {
        let mut headers = Headers::new();
        for raw in &self.headers {
            let (name, value) = raw
                .split_once(':')
                .ok_or_else(|| CourierError::InvalidRequest(format!("Invalid header \"{}\", expected Name: value", raw)))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(CourierError::InvalidRequest(format!("Invalid header \"{}\"", raw)));
            }
            headers.append(name, value.trim());
        }
        Ok(headers)
    }

    /// Parse every `-d` value into form data; repeated keys collect into a list
    pub fn form_data(&self) -> Result<FormData> {
        let mut data = FormData::new();
        for raw in &self.data {
            let (key, value) = raw
                .split_once('=')
                .ok_or_else(|| CourierError::InvalidRequest(format!("Invalid field \"{}\", expected key=value", raw)))?;
            let value = FormValue::from(value);
            match data.get_mut(key) {
                Some(FormValue::List(items)) => items.push(value),
                Some(existing) => {
                    let first = std::mem::replace(existing, FormValue::List(Vec::new()));
                    *existing = FormValue::List(vec![first, value]);
                }
                None => {
                    data.insert(key.to_string(), value);
                }
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("courier").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_minimal() {
        let args = parse(&["http://example.com"]);
        assert_eq!(args.urls, vec!["http://example.com"]);
        assert_eq!(args.effective_method(), Method::Get);
        assert_eq!(args.transport, TransportKind::Reqwest);
    }

    #[test]
    fn test_data_implies_post() {
        let args = parse(&["-d", "a=1", "http://example.com"]);
        assert_eq!(args.effective_method(), Method::Post);

        let args = parse(&["-X", "put", "-d", "a=1", "http://example.com"]);
        assert_eq!(args.effective_method(), Method::Put);
    }

    #[test]
    fn test_header_map() {
        let args = parse(&["-H", "Accept: text/html", "-H", "X-A:1", "http://example.com"]);
        let headers = args.header_map().unwrap();
        assert_eq!(headers.get("accept"), Some("text/html"));
        assert_eq!(headers.get("x-a"), Some("1"));

        let args = parse(&["-H", "broken", "http://example.com"]);
        assert!(args.header_map().is_err());
    }

    #[test]
    fn test_repeated_fields_become_list() {
        let args = parse(&["-d", "id=1", "-d", "id=2", "-d", "name=x", "http://example.com"]);
        let data = args.form_data().unwrap();
        assert_eq!(
            data.get("id"),
            Some(&FormValue::List(vec!["1".into(), "2".into()]))
        );
        assert_eq!(data.get("name"), Some(&FormValue::from("x")));
    }

    #[test]
    fn test_url_is_required() {
        assert!(Args::try_parse_from(["courier"]).is_err());
    }

    #[test]
    fn test_socket_transport_and_options() {
        let args = parse(&[
            "--transport",
            "socket",
            "--max-redirects",
            "0",
            "--timeout",
            "2.5",
            "-vv",
            "http://a",
            "http://b",
        ]);
        assert_eq!(args.transport, TransportKind::Socket);
        assert_eq!(args.max_redirects, Some(0));
        assert_eq!(args.timeout, Some(2.5));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.urls.len(), 2);
    }
}
