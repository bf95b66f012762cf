use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ApiConfig;

/// Filter for the server: per-request lines from `tower_http` only when
/// request logging is enabled.
pub fn server_filter(api: &ApiConfig) -> &'static str {
    if api.enable_request_logging {
        "kitten_api=info,tower_http=info"
    } else {
        "kitten_api=info,tower_http=warn"
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
