// src/config/mod.rs
pub mod services;

pub use services::ServicesConfig;
