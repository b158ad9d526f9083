//! Command-line front end

pub mod args;
pub mod process;

use std::io::Write;

use tracing::debug;

pub use args::{Args, TransportKind};

use crate::adapter::HttpAdapter;
use crate::errors::{CourierError, Result};
use crate::event::{LoggerSubscriber, RetryStrategy, Subscriber};
use crate::message::Response;
use crate::status::ExitStatus;
use crate::transport::{ReqwestTransport, SocketTransport, Transport};

/// Run the CLI with parsed arguments
pub async fn run(args: Args) -> ExitStatus {
    match execute(&args).await {
        Ok(status) => status,
        Err(error) => {
            eprintln!("courier: error: {}", error);
            ExitStatus::Error
        }
    }
}

async fn execute(args: &Args) -> Result<ExitStatus> {
    let config = process::configuration(args)?;
    debug!(?config, "configuration loaded");

    match args.transport {
        TransportKind::Reqwest => {
            let adapter = HttpAdapter::new(ReqwestTransport::new()?).with_configuration(config);
            dispatch(adapter, args).await
        }
        TransportKind::Socket => {
            let adapter = HttpAdapter::new(SocketTransport::new()).with_configuration(config);
            dispatch(adapter, args).await
        }
    }
}

async fn dispatch<T: Transport>(adapter: HttpAdapter<T>, args: &Args) -> Result<ExitStatus> {
    let mut adapter = adapter.with_subscriber(LoggerSubscriber::default());
    if args.retry > 0 {
        adapter = adapter.with_subscriber(Subscriber::retry(args.retry, RetryStrategy::default()));
    }

    let mut requests = process::requests(args, adapter.configuration())?;
    let mut stdout = std::io::stdout();

    if requests.len() == 1 {
        let request = requests.remove(0);
        let response = adapter.send_internal_request(request).await?;
        print_response(&mut stdout, &response, args.include)?;
        return Ok(ExitStatus::Success);
    }

    match adapter.send_requests(requests).await {
        Ok(responses) => {
            for response in &responses {
                print_response(&mut stdout, response, args.include)?;
            }
            Ok(ExitStatus::Success)
        }
        Err(CourierError::Multi(error)) => {
            for response in error.responses() {
                print_response(&mut stdout, response, args.include)?;
            }
            for failure in error.failures() {
                eprintln!("courier: {}: {}", failure.request.url(), failure.error);
            }
            Ok(ExitStatus::from_failures(error.failures().len()))
        }
        Err(error) => Err(error),
    }
}

/// Write the status line, optionally headers, then the body
pub fn print_response(out: &mut impl Write, response: &Response, include_headers: bool) -> Result<()> {
    let url = response.effective_url().unwrap_or("");
    writeln!(
        out,
        "HTTP/{} {} {}  ({})",
        response.protocol_version().as_str(),
        response.status_code(),
        response.reason_phrase(),
        url
    )?;

    if include_headers {
        for (name, value) in response.headers().iter_flat() {
            writeln!(out, "{}: {}", name, value)?;
        }
        writeln!(out)?;
    }

    if let Some(body) = response.body() {
        out.write_all(body)?;
        if !body.ends_with(b"\n") {
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_response() {
        let response = Response::new(200)
            .with_reason_phrase("OK")
            .with_header("Content-Type", "text/plain")
            .with_body("hi")
            .with_effective_url("http://a.com/");

        let mut out = Vec::new();
        print_response(&mut out, &response, true).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "HTTP/1.1 200 OK  (http://a.com/)\nContent-Type: text/plain\n\nhi\n"
        );
    }
}
