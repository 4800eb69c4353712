pub mod client;
pub mod error;
pub mod gateway;
pub mod models;
pub mod sign;

pub use client::ShopeeClient;
pub use error::ShopeeApiError;
pub use gateway::ShopeeGateway;
