pub mod adx;
pub mod bollinger;
pub mod rsi;
pub mod sma;

pub use adx::adx;
pub use bollinger::bollinger_bandwidth;
pub use rsi::rsi;
pub use sma::sma;
