pub mod cancel;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
