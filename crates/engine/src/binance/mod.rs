pub mod kline;
pub mod rest;

pub use rest::BinanceClient;
