pub mod association;
pub mod error;
pub mod locate_station;
