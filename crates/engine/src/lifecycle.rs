use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use common::{EngineCommand, EngineState, Signal};
use strategy::SignalGenerator;

/// Cloneable handle used to control a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    state: Arc<RwLock<EngineState>>,
}

impl EngineHandle {
    pub async fn send(&self, cmd: EngineCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }
}

/// The polling loop: one `generate_signal` call per tick, forwarded to the executor.
///
/// Each call is awaited to completion inside the tick handler, so a slow
/// fetch delays the next tick instead of overlapping with it.
pub struct Engine {
    generator: SignalGenerator,
    poll_interval: Duration,
    state: Arc<RwLock<EngineState>>,
    command_rx: mpsc::Receiver<EngineCommand>,
    signal_tx: mpsc::Sender<Signal>,
}

impl Engine {
    pub fn new(
        generator: SignalGenerator,
        poll_interval: Duration,
        signal_tx: mpsc::Sender<Signal>,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let state = Arc::new(RwLock::new(EngineState::Running));

        let handle = EngineHandle {
            command_tx,
            state: state.clone(),
        };

        let engine = Engine {
            generator,
            poll_interval,
            state,
            command_rx,
            signal_tx,
        };

        (engine, handle)
    }

    /// Run the engine until shutdown. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(
            name = %self.generator.name(),
            symbol = %self.generator.symbol(),
            timeframe = %self.generator.timeframe(),
            interval = ?self.poll_interval,
            "Engine started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *self.state.read().await != EngineState::Running {
                        continue;
                    }
                    if let Some(signal) = self.generator.generate_signal().await {
                        if self.signal_tx.send(signal).await.is_err() {
                            warn!("Signal channel closed — stopping engine");
                            break;
                        }
                    }
                }

                cmd = self.command_rx.recv() => match cmd {
                    Some(EngineCommand::Pause) => {
                        let mut state = self.state.write().await;
                        if *state == EngineState::Running {
                            info!("Engine paused — ticks skipped");
                            *state = EngineState::Paused;
                        }
                    }

                    Some(EngineCommand::Resume) => {
                        let mut state = self.state.write().await;
                        if *state == EngineState::Paused {
                            info!("Engine resumed");
                            *state = EngineState::Running;
                        }
                    }

                    Some(EngineCommand::Shutdown) => {
                        info!("Engine shutting down");
                        break;
                    }

                    None => {
                        warn!("Engine command channel closed — shutting down");
                        break;
                    }
                },
            }
        }

        *self.state.write().await = EngineState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{Candle, OrderSide};
    use paper::PaperClient;
    use strategy::StrategyFileConfig;

    fn candle(close: f64) -> Candle {
        Candle {
            timestamp: Utc::now(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    async fn grid_generator(closes: &[f64]) -> (SignalGenerator, Arc<PaperClient>) {
        let exchange = Arc::new(PaperClient::new(0.0));
        for &close in closes {
            exchange.push_candle("BTCUSDT", candle(close)).await;
        }
        let cfg = StrategyFileConfig::parse(
            r#"
            [strategy]
            type = "grid"
            name = "engine-test"
            symbol = "BTCUSDT"
            timeframe = "1m"
            amount = 1.0

            [strategy.params]
            grid_lower = 100
            grid_upper = 200
            grid_step = 10
            "#,
        )
        .unwrap()
        .strategy;
        let generator = SignalGenerator::from_config(&cfg, exchange.clone()).unwrap();
        (generator, exchange)
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_signals_from_ticks() {
        let (generator, exchange) = grid_generator(&[105.0]).await;
        let (signal_tx, mut signal_rx) = mpsc::channel(8);
        let (engine, handle) = Engine::new(generator, Duration::from_secs(60), signal_tx);
        let task = tokio::spawn(engine.run());

        // First tick fires immediately and records the baseline.
        tokio::time::sleep(Duration::from_secs(1)).await;
        exchange.push_candle("BTCUSDT", candle(125.0)).await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        let signal = signal_rx.recv().await.unwrap();
        assert_eq!(signal.side(), OrderSide::Sell);
        assert_eq!(signal.symbol(), "BTCUSDT");

        handle.send(EngineCommand::Shutdown).await;
        task.await.unwrap();
        assert_eq!(handle.state().await, EngineState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_engine_skips_ticks() {
        let (generator, exchange) = grid_generator(&[105.0]).await;
        let (signal_tx, mut signal_rx) = mpsc::channel(8);
        let (engine, handle) = Engine::new(generator, Duration::from_secs(60), signal_tx);
        let task = tokio::spawn(engine.run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.send(EngineCommand::Pause).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.state().await, EngineState::Paused);

        exchange.push_candle("BTCUSDT", candle(125.0)).await;
        tokio::time::sleep(Duration::from_secs(180)).await;
        assert!(signal_rx.try_recv().is_err());

        handle.send(EngineCommand::Resume).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(signal_rx.recv().await.unwrap().side(), OrderSide::Sell);

        handle.send(EngineCommand::Shutdown).await;
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn queued_signals_survive_engine_shutdown() {
        let (generator, exchange) = grid_generator(&[105.0]).await;
        let (signal_tx, signal_rx) = mpsc::channel(8);
        let (engine, handle) = Engine::new(generator, Duration::from_secs(60), signal_tx);
        let engine_task = tokio::spawn(engine.run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        exchange.push_candle("BTCUSDT", candle(125.0)).await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        handle.send(EngineCommand::Shutdown).await;
        engine_task.await.unwrap();

        // The sell is still queued; the executor fills it and then exits
        // because the engine dropped its sender.
        let executor = crate::OrderExecutor::new(signal_rx, exchange);
        assert_eq!(executor.run().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_signal_channel_stops_engine() {
        let (generator, exchange) = grid_generator(&[105.0]).await;
        let (signal_tx, signal_rx) = mpsc::channel(8);
        drop(signal_rx);
        let (engine, handle) = Engine::new(generator, Duration::from_secs(60), signal_tx);
        let task = tokio::spawn(engine.run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        exchange.push_candle("BTCUSDT", candle(125.0)).await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        task.await.unwrap();
        assert_eq!(handle.state().await, EngineState::Stopped);
    }
}
