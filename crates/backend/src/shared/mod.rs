pub mod config;
pub mod shopee;
