pub mod constants;
pub mod gpsd;
pub mod poller;
pub mod types;
