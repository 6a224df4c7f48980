pub mod analysis;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod indicators;
pub mod models;
pub mod notify;
