//! Tracing subscriber setup for the binary and for embedding applications

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "courier=warn",
        1 => "courier=info",
        2 => "courier=debug",
        _ => "courier=trace",
    }
}

/// Install a global fmt subscriber
///
/// `RUST_LOG` takes precedence over `verbosity`. Calling this more than once,
/// or after another subscriber was installed, leaves the first one in place.
pub fn init(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(verbosity).into());
    let registry = tracing_subscriber::registry().with(filter);

    // Already initialised elsewhere
    let _ = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "courier=warn");
        assert_eq!(default_directive(2), "courier=debug");
        assert_eq!(default_directive(9), "courier=trace");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(1, false);
        init(3, true);
    }
}
