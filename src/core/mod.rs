pub mod config;
pub mod fetcher;
pub mod models;
pub mod notify;
pub mod platform;
pub mod scheduler;
pub mod tracker;
