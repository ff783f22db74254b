pub mod constants;
pub mod decoder;
pub mod gpio;
pub mod types;
