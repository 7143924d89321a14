//! Logging setup utilities for the hanashi binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled by the default filter.
const WORKSPACE_CRATES: [&str; 3] = ["hanashi_shared", "hanashi_server", "hanashi_client"];

/// Build the fallback filter directive used when `RUST_LOG` is not set.
///
/// Every workspace crate and the binary itself get `default_log_level`;
/// everything else (axum, hyper, tungstenite, ...) stays at its default.
pub fn default_filter_directive(binary_name: &str, default_log_level: &str) -> String {
    WORKSPACE_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "hanashi-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use hanashi_shared::logger::setup_logger;
///
/// setup_logger("hanashi-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_directive_covers_workspace_and_binary() {
        // テスト項目: デフォルトのフィルタにワークスペースの全クレートとバイナリが含まれる
        // given (前提条件):
        let binary_name = "hanashi-client";

        // when (操作):
        let directive = default_filter_directive(binary_name, "info");

        // then (期待する結果):
        assert!(directive.contains("hanashi_shared=info"));
        assert!(directive.contains("hanashi_server=info"));
        assert!(directive.contains("hanashi_client=info"));
        assert_eq!(directive.matches("hanashi_client=info").count(), 2);
    }
}
