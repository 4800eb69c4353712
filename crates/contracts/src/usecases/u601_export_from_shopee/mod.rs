pub mod progress;
pub mod request;
pub mod response;

pub use progress::{ExportCheckpoint, ExportProgress, ExportStatus};
pub use request::{DataType, ExportRequest};
pub use response::{ExportResponse, ExportStartStatus};

use crate::usecases::common::UseCaseMetadata;

pub struct ExportFromShopee;

impl UseCaseMetadata for ExportFromShopee {
    fn usecase_index() -> &'static str {
        "u601"
    }

    fn usecase_name() -> &'static str {
        "export_from_shopee"
    }

    fn display_name() -> &'static str {
        "Экспорт из Shopee в Excel"
    }

    fn description() -> &'static str {
        "Выгрузка заказов, возвратов и товаров магазина Shopee в xlsx-файл"
    }
}
