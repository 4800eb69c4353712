pub mod combined;
pub mod orders;
pub mod products;
pub mod returns;
