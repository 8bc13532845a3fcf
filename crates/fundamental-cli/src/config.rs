use clap::Parser;
use yahoo_client::YahooConfig;

/// Fundamental analysis of a single ticker
#[derive(Parser, Debug, Clone)]
#[command(name = "fundamental-analysis")]
#[command(about = "Score a company's fundamentals from its latest financial statements", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Ticker symbol to analyze
    #[arg(env = "TICKER", default_value = "NVDA")]
    pub ticker: String,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// List the individual score contributions
    #[arg(long)]
    pub explain: bool,

    /// Prepend trailing-twelve-months values to income and cash flow lines
    #[arg(long)]
    pub ttm: bool,

    /// Yahoo requests allowed per minute
    #[arg(long, env = "YAHOO_RATE_LIMIT", default_value_t = 60)]
    pub rate_limit: usize,

    /// HTTP timeout in seconds
    #[arg(long, env = "YAHOO_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout: u64,
}

impl Cli {
    pub fn symbol(&self) -> String {
        self.ticker.trim().to_uppercase()
    }

    pub fn yahoo_config(&self) -> YahooConfig {
        YahooConfig {
            rate_limit_per_minute: self.rate_limit,
            timeout_secs: self.timeout,
            include_trailing: self.ttm,
            ..YahooConfig::default()
        }
    }
}

/// Install the tracing subscriber. `RUST_LOG` overrides the default filter;
/// `RUST_LOG_FORMAT=json` switches to JSON lines.
pub fn init_logging() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(
                "fundamental_cli=info,yahoo_client=warn,fundamental_analysis=warn",
            )
        })
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["fundamental-analysis"]).unwrap();
        if std::env::var("TICKER").is_err() {
            assert_eq!(cli.symbol(), "NVDA");
        }
        assert!(!cli.json);
        assert!(!cli.ttm);
    }

    #[test]
    fn test_flags_map_to_yahoo_config() {
        let cli = Cli::try_parse_from([
            "fundamental-analysis",
            " msft ",
            "--ttm",
            "--rate-limit",
            "5",
            "--timeout",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.symbol(), "MSFT");

        let config = cli.yahoo_config();
        assert!(config.include_trailing);
        assert_eq!(config.rate_limit_per_minute, 5);
        assert_eq!(config.timeout_secs, 10);
    }
}
