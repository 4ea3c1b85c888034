pub mod augmented;
pub mod error;
pub mod selection;
pub mod snapshot;
