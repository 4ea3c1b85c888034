pub mod error;
pub mod loader;
pub mod parser;
pub mod points;
pub mod station_list;
