pub mod diff;
pub mod error;
pub mod forecast;
pub mod grid;
pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod sarima;
