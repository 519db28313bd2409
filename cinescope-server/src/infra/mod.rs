pub mod app_state;
pub mod cache_sweeper;
pub mod config;
pub mod errors;
