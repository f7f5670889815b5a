pub mod binance;
pub mod executor;
pub mod lifecycle;

pub use binance::BinanceClient;
pub use executor::OrderExecutor;
pub use lifecycle::{Engine, EngineHandle};
