//! Courier library interface
//!
//! A transport-agnostic HTTP client. Requests go through one pipeline
//! (pre-send hooks, transport, post-send hooks) regardless of which backend
//! does the wire work.
//!
//! # Module Organization
//!
//! - [`adapter`] - The request pipeline (HttpAdapter) and convenience verbs
//! - [`cli`] - Command-line front end (clap arguments, runner)
//! - [`multi`] - Concurrent batch execution with partial-failure aggregation
//! - [`event`] - Lifecycle events, subscribers and the priority dispatcher
//! - [`redirect`] - Redirect target resolution, method rewrite and budget
//! - [`normalizer`] - Raw header block and body normalization
//! - [`transport`] - Transport trait and the reqwest / raw socket backends
//! - [`message`] - Request, InternalRequest, Response and parameter bags
//! - [`http`] - Methods, protocol versions and the header map
//! - [`config`] - Configuration snapshot and TOML loading
//! - [`errors`] - Error types (CourierError, MultiRequestError, Result)
//! - [`logging`] - tracing-subscriber setup
//! - [`status`] - Exit status codes (ExitStatus)

pub mod adapter;
pub mod cli;
pub mod config;
pub mod errors;
pub mod event;
pub mod http;
pub mod logging;
pub mod message;
pub mod multi;
pub mod normalizer;
pub mod redirect;
pub mod status;
pub mod transport;

pub use adapter::{HttpAdapter, Payload};
pub use config::{Configuration, EncodingType};
pub use errors::{CourierError, MultiRequestError, RequestFailure, Result};
pub use event::{EventHandler, EventKind, Outcome, Subscriber};
pub use http::{Headers, Method, ProtocolVersion};
pub use message::{FileData, FileValue, FormData, FormValue, InternalRequest, Request, Response};
pub use redirect::RedirectPolicy;
pub use transport::{ReqwestTransport, SocketTransport, Transport};
