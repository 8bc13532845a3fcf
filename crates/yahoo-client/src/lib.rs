use analysis_core::{AnalysisError, FinancialsProvider, RawFinancials};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod timeseries;

pub use timeseries::{parse_chart_close, parse_timeseries, Statements};

const TIMESERIES_URL: &str = "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";
const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const MAX_ATTEMPTS: u32 = 3;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            let oldest = match ts.front() {
                Some(&oldest) if ts.len() >= self.max_requests => oldest,
                _ => {
                    ts.push_back(now);
                    return;
                }
            };

            // Wait until the oldest request falls out of the window
            let sleep_dur = (oldest + self.window).saturating_duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Yahoo slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Client settings
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Requests allowed per minute
    pub rate_limit_per_minute: usize,
    pub timeout_secs: u64,
    /// Also request trailing-twelve-months values for income and cash flow lines
    pub include_trailing: bool,
    /// How far back to request annual statements
    pub history_years: i64,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 60,
            timeout_secs: 30,
            include_trailing: false,
            history_years: 8,
        }
    }
}

impl YahooConfig {
    /// Defaults, overridden by `YAHOO_RATE_LIMIT` and `YAHOO_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rate_limit_per_minute: env_parse("YAHOO_RATE_LIMIT").unwrap_or(defaults.rate_limit_per_minute),
            timeout_secs: env_parse("YAHOO_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            ..defaults
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    config: YahooConfig,
    rate_limiter: RateLimiter,
}

impl YahooClient {
    pub fn new(config: YahooConfig) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(config.rate_limit_per_minute, Duration::from_secs(60)),
            config,
        }
    }

    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 0..MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 5u64 * (attempt as u64 + 1);
            tracing::warn!(
                "Yahoo 429 rate limited, waiting {}s before retry {}/{}",
                wait_secs,
                attempt + 1,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(AnalysisError::ApiError(format!(
            "Rate limited by Yahoo after {} retries",
            MAX_ATTEMPTS
        )))
    }

    async fn get_text(&self, builder: reqwest::RequestBuilder) -> Result<String, AnalysisError> {
        let response = self.send_request(builder).await?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))
    }

    /// Annual income statement, balance sheet and cash flow statement,
    /// newest period first.
    pub async fn get_statements(&self, symbol: &str) -> Result<Statements, AnalysisError> {
        let url = format!("{}/{}", TIMESERIES_URL, symbol);
        let now = Utc::now();
        let start = now - ChronoDuration::days(365 * self.config.history_years);

        let body = self
            .get_text(self.client.get(&url).query(&[
                ("symbol", symbol.to_string()),
                ("type", timeseries::type_param(self.config.include_trailing)),
                ("period1", start.timestamp().to_string()),
                ("period2", now.timestamp().to_string()),
            ]))
            .await?;

        let statements = parse_timeseries(&body)?;
        tracing::debug!(
            symbol,
            income = statements.income.line_names().count(),
            balance_sheet = statements.balance_sheet.line_names().count(),
            cash_flow = statements.cash_flow.line_names().count(),
            "Fetched statements"
        );
        Ok(statements)
    }

    /// Latest daily close.
    pub async fn get_current_price(&self, symbol: &str) -> Result<Option<f64>, AnalysisError> {
        let url = format!("{}/{}", CHART_URL, symbol);
        let body = self
            .get_text(self.client.get(&url).query(&[("range", "1d"), ("interval", "1d")]))
            .await?;
        Ok(parse_chart_close(&body))
    }

    /// Statements plus current price, mapped to the scorer's input.
    ///
    /// A failed price lookup leaves the price absent; a failed statement
    /// lookup is an error.
    pub async fn get_fundamentals(&self, symbol: &str) -> Result<RawFinancials, AnalysisError> {
        let statements = self.get_statements(symbol).await?;

        let current_price = match self.get_current_price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!("Price lookup failed for {}: {}", symbol, e);
                None
            }
        };

        Ok(RawFinancials::from_statements(
            symbol,
            &statements.income,
            &statements.balance_sheet,
            &statements.cash_flow,
            current_price,
        ))
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new(YahooConfig::default())
    }
}

#[async_trait]
impl FinancialsProvider for YahooClient {
    async fn fetch_financials(&self, symbol: &str) -> Result<RawFinancials, AnalysisError> {
        self.get_fundamentals(symbol).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = YahooConfig::default();
        assert_eq!(config.rate_limit_per_minute, 60);
        assert!(!config.include_trailing);
    }

    #[tokio::test]
    async fn test_rate_limiter_admits_up_to_limit_without_waiting() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(limiter.timestamps.lock().await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_waits_for_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        limiter.acquire().await;
        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() >= Duration::from_secs(10));
    }
}
