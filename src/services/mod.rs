pub mod command;
pub mod executor;
pub mod notify;
pub mod route;
pub mod slippage;
pub mod swap;
pub mod units;
