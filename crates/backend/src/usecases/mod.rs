pub mod u601_export_from_shopee;
