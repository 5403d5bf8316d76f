pub mod config;
pub mod hal;
