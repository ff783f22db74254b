pub mod client;
pub mod constants;
pub mod properties;
pub mod types;
