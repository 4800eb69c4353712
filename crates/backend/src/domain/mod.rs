pub mod a001_shop;
