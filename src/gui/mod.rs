pub mod application;
pub mod devices;
pub mod executor;
pub mod style;
pub mod types;
pub mod volume;
