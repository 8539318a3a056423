//! kcwatch - restarts FAILED tasks of RUNNING connectors
//!
//! # Usage
//!
//! ```bash
//! kcwatch --host connect:8083 --duration 5
//! kcwatch --host https://connect.internal/ --max-in-flight 8 --timeout-secs 30
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use kcwatch_core::config::{DEFAULT_HOST, DEFAULT_INTERVAL_MINUTES};
use kcwatch_core::impls::HttpConnectApi;
use kcwatch_core::{ConcurrencyPolicy, PollLoop, RequestPolicy, WatchdogConfig, WatchdogError};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Watchdog for a Kafka Connect cluster
#[derive(Parser, Debug)]
#[command(name = "kcwatch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Kafka Connect host; `http://` is added when no scheme is given
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Minutes between checks
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MINUTES, value_parser = clap::value_parser!(u64).range(1..))]
    duration: u64,

    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Retries per request on network errors, timeouts and 5xx
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Fixed delay between retries, in milliseconds
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    /// Track in-flight work and cap concurrent API requests at this number
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_in_flight: Option<usize>,

    /// Track in-flight work (drained on shutdown) without a concurrency cap
    #[arg(long)]
    track: bool,

    /// Exit with an error when the connector list body cannot be read
    #[arg(long)]
    fail_fast_on_list_read: bool,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn concurrency(&self) -> ConcurrencyPolicy {
        match (self.max_in_flight, self.track) {
            (Some(n), _) => ConcurrencyPolicy::Tracked {
                max_in_flight: Some(n),
            },
            (None, true) => ConcurrencyPolicy::Tracked {
                max_in_flight: None,
            },
            (None, false) => ConcurrencyPolicy::FireAndForget,
        }
    }

    fn request_policy(&self) -> RequestPolicy {
        RequestPolicy {
            timeout: self.timeout_secs.map(Duration::from_secs),
            max_retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    fn watchdog_config(&self) -> Result<WatchdogConfig, WatchdogError> {
        Ok(
            WatchdogConfig::new(&self.host, Duration::from_secs(self.duration.saturating_mul(60)))?
                .with_concurrency(self.concurrency())
                .with_request_policy(self.request_policy())
                .with_fail_fast_on_list_read(self.fail_fast_on_list_read),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = cli.watchdog_config().context("invalid configuration")?;
    info!(
        url = %config.base_url,
        duration_minutes = cli.duration,
        "kafka connect watchdog configured"
    );

    let api = Arc::new(HttpConnectApi::from_config(&config)?);
    let poll = PollLoop::new(api, config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupt received"),
            Err(e) => warn!(error = %e, "failed to listen for interrupt"),
        }
        // ignore send error: the loop may already be gone
        let _ = shutdown_tx.send(true);
    });

    poll.run(shutdown_rx).await?;
    info!("watchdog stopped");
    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_plain_polling() {
        let cli = Cli::parse_from(["kcwatch"]);
        let config = cli.watchdog_config().unwrap();

        assert_eq!(config.base_url, "http://localhost:8083");
        assert_eq!(config.interval, Duration::from_secs(15 * 60));
        assert_eq!(config.concurrency, ConcurrencyPolicy::FireAndForget);
        assert_eq!(config.request, RequestPolicy::default());
        assert!(!config.fail_fast_on_list_read);
    }

    #[test]
    fn host_and_duration_flags() {
        let cli = Cli::parse_from(["kcwatch", "--host", "myhost:8083/", "--duration", "2"]);
        let config = cli.watchdog_config().unwrap();

        assert_eq!(config.base_url, "http://myhost:8083");
        assert_eq!(config.interval, Duration::from_secs(120));
    }

    #[rstest]
    #[case::default(&["kcwatch"], ConcurrencyPolicy::FireAndForget)]
    #[case::track(&["kcwatch", "--track"], ConcurrencyPolicy::Tracked { max_in_flight: None })]
    #[case::bounded(&["kcwatch", "--max-in-flight", "8"], ConcurrencyPolicy::Tracked { max_in_flight: Some(8) })]
    fn concurrency_flags(#[case] args: &[&str], #[case] expected: ConcurrencyPolicy) {
        let cli = Cli::parse_from(args.iter().copied());
        assert_eq!(cli.concurrency(), expected);
    }

    #[test]
    fn request_policy_flags() {
        let cli = Cli::parse_from([
            "kcwatch",
            "--timeout-secs",
            "30",
            "--retries",
            "2",
            "--retry-delay-ms",
            "250",
            "--fail-fast-on-list-read",
        ]);
        let config = cli.watchdog_config().unwrap();

        assert_eq!(config.request.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.request.max_retries, 2);
        assert_eq!(config.request.retry_delay, Duration::from_millis(250));
        assert!(config.fail_fast_on_list_read);
    }

    #[test]
    fn zero_max_in_flight_is_rejected() {
        assert!(Cli::try_parse_from(["kcwatch", "--max-in-flight", "0"]).is_err());
        let cli = Cli::try_parse_from(["kcwatch", "--max-in-flight", "1"]).unwrap();
        assert_eq!(
            cli.concurrency(),
            ConcurrencyPolicy::Tracked {
                max_in_flight: Some(1)
            }
        );
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert!(Cli::try_parse_from(["kcwatch", "--duration", "0"]).is_err());
    }

    #[test]
    fn empty_host_is_rejected() {
        let cli = Cli::parse_from(["kcwatch", "--host", ""]);
        assert!(matches!(
            cli.watchdog_config(),
            Err(WatchdogError::InvalidHost(_))
        ));
    }
}
