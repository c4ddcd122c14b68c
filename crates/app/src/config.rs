//! App configuration

use std::path::PathBuf;

use clap::Args;
use jiff::SignedDuration;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Durable storage settings.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Directory holding the session and cart snapshots
    #[arg(long, env = "ESTANTE_DATA_DIR", default_value = ".estante")]
    pub data_dir: PathBuf,
}

/// Storefront behaviour settings.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Directory holding the YAML fixture sets
    #[arg(long, env = "ESTANTE_FIXTURES_DIR", default_value = "fixtures")]
    pub fixtures_dir: PathBuf,

    /// Fixture set to seed the repositories from
    #[arg(long, env = "ESTANTE_FIXTURE_SET", default_value = "default")]
    pub fixture_set: String,

    /// Cart reservation window, in minutes
    #[arg(long, env = "ESTANTE_CART_TTL_MINUTES", default_value_t = 15)]
    pub cart_ttl_minutes: u32,

    /// Simulated login latency, in milliseconds
    #[arg(long, env = "ESTANTE_LOGIN_DELAY_MS", default_value_t = 1_000)]
    pub login_delay_ms: u64,

    /// Simulated registration latency, in milliseconds
    #[arg(long, env = "ESTANTE_REGISTER_DELAY_MS", default_value_t = 1_500)]
    pub register_delay_ms: u64,
}

impl StoreConfig {
    /// Cart reservation window.
    #[must_use]
    pub fn cart_ttl(&self) -> SignedDuration {
        SignedDuration::from_mins(i64::from(self.cart_ttl_minutes))
    }
}

/// Estante app configuration
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Durable storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Storefront settings.
    #[command(flatten)]
    pub store: StoreConfig,
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        config: AppConfig,
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let harness = Harness::try_parse_from([
            "estante-app",
            "--log-format",
            "json",
            "--cart-ttl-minutes",
            "5",
            "--data-dir",
            "/tmp/estante",
        ])?;

        assert_eq!(harness.config.logging.log_format, LogFormat::Json);
        assert_eq!(harness.config.store.cart_ttl(), SignedDuration::from_mins(5));
        assert_eq!(harness.config.storage.data_dir, PathBuf::from("/tmp/estante"));

        Ok(())
    }
}
