use crate::TradingMode;

/// All process configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Exchange credentials (empty in paper mode)
    pub binance_api_key: String,
    pub binance_secret: String,

    // Trading
    pub trading_mode: TradingMode,
    pub paper_slippage_bps: f64,

    // Strategy config file path
    pub strategy_config_path: String,

    /// Overrides the polling cadence. Defaults to the strategy timeframe.
    pub poll_interval_secs: Option<u64>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let trading_mode = match required_env("TRADING_MODE").to_lowercase().as_str() {
            "paper" => TradingMode::Paper,
            "live" => TradingMode::Live,
            other => panic!(
                "ERROR: TRADING_MODE must be 'paper' or 'live', got: '{other}'"
            ),
        };

        // Market data is public, so credentials only matter when orders go out.
        let (binance_api_key, binance_secret) = match trading_mode {
            TradingMode::Live => (required_env("BINANCE_API_KEY"), required_env("BINANCE_SECRET")),
            TradingMode::Paper => (
                optional_env("BINANCE_API_KEY").unwrap_or_default(),
                optional_env("BINANCE_SECRET").unwrap_or_default(),
            ),
        };

        Config {
            binance_api_key,
            binance_secret,
            trading_mode,
            paper_slippage_bps: optional_env("PAPER_SLIPPAGE_BPS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10.0),
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategy.toml".to_string()),
            poll_interval_secs: optional_env("POLL_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|&secs: &u64| secs > 0),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
