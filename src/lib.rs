pub mod api;
pub mod channels;
pub mod clients;
pub mod config;
pub mod models;
pub mod utils;
pub mod worker;
