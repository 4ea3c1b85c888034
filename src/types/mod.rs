pub mod month;
pub mod network;
pub mod series;
pub mod station;
pub mod store;
