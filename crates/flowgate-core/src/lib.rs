pub mod config;
pub mod logging;

// Core modules
pub mod client;
pub mod ratelimit;
pub mod retry;
