use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, EngineCommand, ExchangeClient, TradingMode};
use engine::{BinanceClient, Engine, OrderExecutor};
use paper::PaperClient;
use strategy::{SignalGenerator, StrategyFileConfig};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(mode = %cfg.trading_mode, "RegimeBot starting");

    let strategy_file = StrategyFileConfig::load(&cfg.strategy_config_path)
        .unwrap_or_else(|e| panic!("Failed to load strategy config: {e}"));
    let strategy_cfg = strategy_file.strategy;

    // ── Exchange client (injected based on TRADING_MODE) ──────────────────────
    let binance = BinanceClient::new(&cfg.binance_api_key, &cfg.binance_secret)
        .unwrap_or_else(|e| panic!("Failed to create Binance client: {e}"));
    let exchange_client: Arc<dyn ExchangeClient> = match cfg.trading_mode {
        TradingMode::Live => {
            info!("Live trading mode — using BinanceClient");
            Arc::new(binance)
        }
        TradingMode::Paper => {
            info!(
                slippage_bps = cfg.paper_slippage_bps,
                "Paper trading mode — Binance candles, simulated fills"
            );
            Arc::new(PaperClient::with_market_data(
                Arc::new(binance),
                cfg.paper_slippage_bps,
            ))
        }
    };

    // ── Strategy ──────────────────────────────────────────────────────────────
    let generator = SignalGenerator::from_config(&strategy_cfg, exchange_client.clone())
        .unwrap_or_else(|e| panic!("Invalid strategy '{}': {e}", strategy_cfg.name));

    let poll_interval = Duration::from_secs(
        cfg.poll_interval_secs.unwrap_or_else(|| generator.timeframe().seconds()),
    );

    // ── Engine + executor ─────────────────────────────────────────────────────
    let (signal_tx, signal_rx) = mpsc::channel::<common::Signal>(128);
    let (engine, engine_handle) = Engine::new(generator, poll_interval, signal_tx);
    let executor = OrderExecutor::new(signal_rx, exchange_client);

    let engine_task = tokio::spawn(engine.run());
    let executor_task = tokio::spawn(executor.run());

    info!("All subsystems started. Waiting for shutdown signal.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received. Stopping engine.");
    engine_handle.send(EngineCommand::Shutdown).await;
    let _ = engine_task.await;

    // The engine dropped its signal sender; the executor drains what is
    // queued and then returns.
    match executor_task.await {
        Ok(filled) => info!(filled, "Shutdown complete"),
        Err(e) => tracing::error!(error = %e, "Executor task failed"),
    }
}
