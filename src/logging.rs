//! Tracing setup. `RUST_LOG` filters (default `info`), `SPELLSTR_LOG_JSON=1`
//! switches to JSON lines.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_JSON_ENV: &str = "SPELLSTR_LOG_JSON";

pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let use_json = std::env::var(LOG_JSON_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
