use std::sync::Arc;

use chrono::Utc;
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u601_export_from_shopee::{
    DataType, ExportFromShopee, ExportRequest, ExportResponse, ExportStartStatus,
};
use uuid::Uuid;

use crate::domain::a001_shop::repository;
use crate::shared::config::ExportConfig;
use crate::shared::shopee::models::OrderDetail;
use crate::shared::shopee::ShopeeGateway;

use super::chunker::{split_date_range, DateChunk};
use super::enrichment;
use super::job_tracker::{ExportFile, ExportJobTracker};
use super::pagination::{self, ExportCancelled};
use super::processors;
use super::rows;
use super::xlsx;

/// Исполнитель экспорта: валидация запроса, фоновый воркер,
/// сборка файла.
///
/// Выгрузка гоняется через [`ShopeeGateway`], прогресс и готовый файл
/// живут в [`ExportJobTracker`]. При сбое страницы воркер один раз
/// возобновляется с чекпоинта, не теряя уже накопленные записи.
#[derive(Clone)]
pub struct ExportExecutor {
    gateway: Arc<dyn ShopeeGateway>,
    tracker: ExportJobTracker,
    cfg: ExportConfig,
}

impl ExportExecutor {
    pub fn new(gateway: Arc<dyn ShopeeGateway>, tracker: ExportJobTracker, cfg: ExportConfig) -> Self {
        Self { gateway, tracker, cfg }
    }

    pub fn tracker(&self) -> &ExportJobTracker {
        &self.tracker
    }

    /// Проверить запрос и запустить фоновое задание экспорта.
    /// Ошибки валидации возвращаются статусом Failed, не HTTP-ошибкой.
    pub fn start_export(&self, request: ExportRequest) -> ExportResponse {
        let shop = match repository::get(&request.shop_id) {
            Some(shop) => shop,
            None => return Self::failed("Магазин не подключен"),
        };
        if shop.access_token.is_empty() || shop.refresh_token.is_empty() {
            return Self::failed("Требуется повторная авторизация магазина");
        }
        if request.date_from > request.date_to {
            return Self::failed("Дата начала позже даты окончания");
        }

        let mut request = request;
        let today = Utc::now().date_naive();
        if request.date_to > today {
            request.date_to = today;
        }
        if request.date_from > request.date_to {
            return Self::failed("Период целиком в будущем");
        }
        let range_days = (request.date_to - request.date_from).num_days() + 1;
        if range_days > self.cfg.max_range_days {
            return Self::failed(&format!(
                "Период не может быть больше {} дней",
                self.cfg.max_range_days
            ));
        }

        let job_id = Uuid::new_v4().to_string();
        self.tracker
            .create_job(job_id.clone(), request.shop_id.clone(), request.data_type);
        tracing::info!(
            "[{}] job {} started: {} for shop {} ({} - {})",
            ExportFromShopee::full_name(),
            job_id,
            request.data_type.as_str(),
            request.shop_id,
            request.date_from,
            request.date_to
        );

        let message = format!("Экспорт запущен: {}", request.data_type.display_name());
        let executor = self.clone();
        let worker_job_id = job_id.clone();
        tokio::spawn(async move {
            executor.run_export(&worker_job_id, &request).await;
        });

        ExportResponse {
            job_id,
            status: ExportStartStatus::Started,
            message,
        }
    }

    fn failed(message: &str) -> ExportResponse {
        ExportResponse {
            job_id: String::new(),
            status: ExportStartStatus::Failed,
            message: message.to_string(),
        }
    }

    /// Тело фонового воркера: терминальный статус выставляется всегда
    pub async fn run_export(&self, job_id: &str, request: &ExportRequest) {
        if let Err(err) = self.run_export_inner(job_id, request).await {
            if err.downcast_ref::<ExportCancelled>().is_some() {
                tracing::info!("Export job {} cancelled", job_id);
                self.tracker.mark_cancelled(job_id);
            } else {
                tracing::error!("Export job {} failed: {:#}", job_id, err);
                self.tracker.fail(job_id, format!("{err:#}"));
            }
        }
    }

    async fn run_export_inner(&self, job_id: &str, request: &ExportRequest) -> anyhow::Result<()> {
        let chunks = split_date_range(
            request.date_from,
            request.date_to,
            self.cfg.chunk_days_for(request.data_type),
        );
        self.tracker.set_step(job_id, 5, "Подготовка периодов выгрузки");

        let data_rows = match request.data_type {
            DataType::Returns => self.collect_returns(job_id, &request.shop_id, &chunks).await?,
            DataType::Orders => self.collect_orders(job_id, &request.shop_id, &chunks).await?,
            DataType::Products => self.collect_products(job_id, &request.shop_id).await?,
            DataType::Combined => self.collect_combined(job_id, &request.shop_id, &chunks).await?,
        };

        let columns = rows::columns_for(request.data_type);
        let shop_name = repository::get(&request.shop_id)
            .map(|s| s.shop_name)
            .unwrap_or_else(|| request.shop_id.clone());
        let filename = xlsx::export_filename(request.data_type, &shop_name);

        if data_rows.is_empty() {
            // Пустой период — не ошибка: пользователь получает файл с шапкой
            let bytes = xlsx::build_workbook(columns, &[])?;
            self.tracker.complete(
                job_id,
                0,
                ExportFile { filename, bytes },
                "Нет данных за выбранный период",
            );
            tracing::info!("Export job {} finished with no data", job_id);
            return Ok(());
        }

        self.tracker.set_step(job_id, 95, "Формирование файла");
        let bytes = xlsx::build_workbook(columns, &data_rows)?;
        let total = data_rows.len();
        self.tracker.complete(
            job_id,
            total,
            ExportFile { filename, bytes },
            "Файл готов к скачиванию",
        );
        tracing::info!("Export job {} completed: {} rows", job_id, total);
        Ok(())
    }

    async fn collect_returns(
        &self,
        job_id: &str,
        shop_id: &str,
        chunks: &[DateChunk],
    ) -> anyhow::Result<Vec<Vec<String>>> {
        let mut records = Vec::new();
        let mut resumed = false;
        loop {
            match pagination::fetch_returns(
                self.gateway.as_ref(),
                &self.tracker,
                &self.cfg,
                job_id,
                shop_id,
                chunks,
                &mut records,
            )
            .await
            {
                Ok(()) => break,
                Err(err) if err.downcast_ref::<ExportCancelled>().is_none() && !resumed => {
                    resumed = true;
                    tracing::warn!(
                        "Returns fetch for job {} interrupted ({:#}), resuming from checkpoint",
                        job_id,
                        err
                    );
                }
                Err(err) => return Err(err),
            }
        }

        self.tracker.set_step(job_id, 85, "Загрузка деталей заказов по возвратам");
        let details = enrichment::enrich_returns(
            self.gateway.as_ref(),
            &self.tracker,
            job_id,
            shop_id,
            &records,
        )
        .await?;
        Ok(processors::returns::flatten_returns(&records, &details))
    }

    async fn collect_orders(
        &self,
        job_id: &str,
        shop_id: &str,
        chunks: &[DateChunk],
    ) -> anyhow::Result<Vec<Vec<String>>> {
        let mut summaries = Vec::new();
        let mut resumed = false;
        loop {
            match pagination::fetch_orders(
                self.gateway.as_ref(),
                &self.tracker,
                &self.cfg,
                job_id,
                shop_id,
                chunks,
                &mut summaries,
            )
            .await
            {
                Ok(()) => break,
                Err(err) if err.downcast_ref::<ExportCancelled>().is_none() && !resumed => {
                    resumed = true;
                    tracing::warn!(
                        "Order list fetch for job {} interrupted ({:#}), resuming from checkpoint",
                        job_id,
                        err
                    );
                }
                Err(err) => return Err(err),
            }
        }

        self.tracker.set_step(job_id, 85, "Загрузка деталей заказов");
        let details =
            enrichment::enrich_orders(self.gateway.as_ref(), &self.tracker, job_id, shop_id, &summaries)
                .await?;
        Ok(processors::orders::flatten_orders(&details))
    }

    async fn collect_products(&self, job_id: &str, shop_id: &str) -> anyhow::Result<Vec<Vec<String>>> {
        let mut summaries = Vec::new();
        let mut resumed = false;
        loop {
            match pagination::fetch_products(
                self.gateway.as_ref(),
                &self.tracker,
                &self.cfg,
                job_id,
                shop_id,
                &mut summaries,
            )
            .await
            {
                Ok(()) => break,
                Err(err) if err.downcast_ref::<ExportCancelled>().is_none() && !resumed => {
                    resumed = true;
                    tracing::warn!(
                        "Item list fetch for job {} interrupted ({:#}), resuming from checkpoint",
                        job_id,
                        err
                    );
                }
                Err(err) => return Err(err),
            }
        }

        self.tracker.set_step(job_id, 85, "Загрузка карточек товаров");
        let item_ids: Vec<i64> = summaries.iter().map(|s| s.item_id).collect();
        let infos =
            enrichment::fetch_item_infos(self.gateway.as_ref(), &self.tracker, job_id, shop_id, &item_ids)
                .await?;
        Ok(processors::products::flatten_products(&infos))
    }

    async fn collect_combined(
        &self,
        job_id: &str,
        shop_id: &str,
        chunks: &[DateChunk],
    ) -> anyhow::Result<Vec<Vec<String>>> {
        let mut returns = Vec::new();
        let mut resumed = false;
        loop {
            match pagination::fetch_returns(
                self.gateway.as_ref(),
                &self.tracker,
                &self.cfg,
                job_id,
                shop_id,
                chunks,
                &mut returns,
            )
            .await
            {
                Ok(()) => break,
                Err(err) if err.downcast_ref::<ExportCancelled>().is_none() && !resumed => {
                    resumed = true;
                    tracing::warn!(
                        "Returns fetch for job {} interrupted ({:#}), resuming from checkpoint",
                        job_id,
                        err
                    );
                }
                Err(err) => return Err(err),
            }
        }

        // Чекпоинт фазы возвратов закончился на последнем чанке —
        // пагинация заказов начинает со своего собственного
        self.tracker.clear_checkpoint(job_id);

        let mut summaries = Vec::new();
        let mut resumed = false;
        loop {
            match pagination::fetch_orders(
                self.gateway.as_ref(),
                &self.tracker,
                &self.cfg,
                job_id,
                shop_id,
                chunks,
                &mut summaries,
            )
            .await
            {
                Ok(()) => break,
                Err(err) if err.downcast_ref::<ExportCancelled>().is_none() && !resumed => {
                    resumed = true;
                    tracing::warn!(
                        "Order list fetch for job {} interrupted ({:#}), resuming from checkpoint",
                        job_id,
                        err
                    );
                }
                Err(err) => return Err(err),
            }
        }

        let cancelled: Vec<_> = summaries
            .into_iter()
            .filter(|s| s.order_status.as_deref() == Some("CANCELLED"))
            .collect();

        // Один вызов деталей на уникальный order_sn обеих половин отчета
        self.tracker.set_step(job_id, 85, "Загрузка деталей заказов");
        let order_sns = enrichment::dedup_sns(
            returns
                .iter()
                .map(|r| r.order_sn.clone())
                .chain(cancelled.iter().map(|s| s.order_sn.clone())),
        );
        let details = enrichment::fetch_order_details(
            self.gateway.as_ref(),
            &self.tracker,
            job_id,
            shop_id,
            &order_sns,
        )
        .await?;
        let by_sn = enrichment::details_by_sn(details);
        let cancelled_details: Vec<OrderDetail> = cancelled
            .iter()
            .filter_map(|s| by_sn.get(&s.order_sn).cloned())
            .collect();
        Ok(processors::combined::flatten_combined(
            &returns,
            &by_sn,
            &cancelled_details,
        ))
    }

    /// Фоновая уборка завершенных заданий
    pub fn cleanup_old_jobs(&self, max_age_hours: i64) {
        self.tracker.cleanup_old_jobs(max_age_hours);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::shopee::error::ShopeeApiError;
    use crate::shared::shopee::models::{
        ItemInfo, ItemListResponse, OrderDetail, OrderListResponse, ReturnListResponse,
        ReturnRecord,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use contracts::domain::a001_shop::Shop;
    use contracts::usecases::u601_export_from_shopee::{ExportProgress, ExportStatus};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Магазин без данных: все списки пустые
    struct EmptyGateway;

    #[async_trait]
    impl ShopeeGateway for EmptyGateway {
        async fn order_list(
            &self,
            _: &str,
            _: i64,
            _: i64,
            _: &str,
            _: u32,
        ) -> Result<OrderListResponse, ShopeeApiError> {
            Ok(OrderListResponse::default())
        }
        async fn order_detail(
            &self,
            _: &str,
            _: &[String],
        ) -> Result<Vec<OrderDetail>, ShopeeApiError> {
            Ok(Vec::new())
        }
        async fn return_list(
            &self,
            _: &str,
            _: i64,
            _: i64,
            _: u32,
            _: u32,
        ) -> Result<ReturnListResponse, ShopeeApiError> {
            Ok(ReturnListResponse::default())
        }
        async fn item_list(
            &self,
            _: &str,
            _: i64,
            _: u32,
        ) -> Result<ItemListResponse, ShopeeApiError> {
            Ok(ItemListResponse::default())
        }
        async fn item_base_info(
            &self,
            _: &str,
            _: &[i64],
        ) -> Result<Vec<ItemInfo>, ShopeeApiError> {
            Ok(Vec::new())
        }
        async fn tracking_number(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<String>, ShopeeApiError> {
            Ok(None)
        }
    }

    /// Одна страница возвратов с одной записью
    struct OneReturnGateway;

    #[async_trait]
    impl ShopeeGateway for OneReturnGateway {
        async fn order_list(
            &self,
            _: &str,
            _: i64,
            _: i64,
            _: &str,
            _: u32,
        ) -> Result<OrderListResponse, ShopeeApiError> {
            Ok(OrderListResponse::default())
        }
        async fn order_detail(
            &self,
            _: &str,
            _: &[String],
        ) -> Result<Vec<OrderDetail>, ShopeeApiError> {
            Ok(Vec::new())
        }
        async fn return_list(
            &self,
            _: &str,
            _: i64,
            _: i64,
            _: u32,
            _: u32,
        ) -> Result<ReturnListResponse, ShopeeApiError> {
            Ok(ReturnListResponse {
                returns: vec![ReturnRecord {
                    return_sn: "R-1".to_string(),
                    order_sn: "O-1".to_string(),
                    create_time: 1700000000,
                    ..ReturnRecord::default()
                }],
                more: false,
            })
        }
        async fn item_list(
            &self,
            _: &str,
            _: i64,
            _: u32,
        ) -> Result<ItemListResponse, ShopeeApiError> {
            Ok(ItemListResponse::default())
        }
        async fn item_base_info(
            &self,
            _: &str,
            _: &[i64],
        ) -> Result<Vec<ItemInfo>, ShopeeApiError> {
            Ok(Vec::new())
        }
        async fn tracking_number(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<String>, ShopeeApiError> {
            Ok(None)
        }
    }

    /// Одна страница из трех возвратов на общий заказ; считает вызовы деталей
    struct SharedOrderGateway {
        detail_calls: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl ShopeeGateway for SharedOrderGateway {
        async fn order_list(
            &self,
            _: &str,
            _: i64,
            _: i64,
            _: &str,
            _: u32,
        ) -> Result<OrderListResponse, ShopeeApiError> {
            Ok(OrderListResponse::default())
        }
        async fn order_detail(
            &self,
            _: &str,
            order_sn_list: &[String],
        ) -> Result<Vec<OrderDetail>, ShopeeApiError> {
            self.detail_calls.lock().unwrap().push(order_sn_list.len());
            Ok(order_sn_list
                .iter()
                .map(|sn| OrderDetail {
                    order_sn: sn.clone(),
                    order_status: Some("COMPLETED".to_string()),
                    tracking_no: Some(format!("TRK-{sn}")),
                    ..OrderDetail::default()
                })
                .collect())
        }
        async fn return_list(
            &self,
            _: &str,
            _: i64,
            _: i64,
            _: u32,
            _: u32,
        ) -> Result<ReturnListResponse, ShopeeApiError> {
            let returns = (1..=3)
                .map(|i| ReturnRecord {
                    return_sn: format!("R-{i}"),
                    order_sn: "ORDER001".to_string(),
                    create_time: 1700000000,
                    ..ReturnRecord::default()
                })
                .collect();
            Ok(ReturnListResponse { returns, more: false })
        }
        async fn item_list(
            &self,
            _: &str,
            _: i64,
            _: u32,
        ) -> Result<ItemListResponse, ShopeeApiError> {
            Ok(ItemListResponse::default())
        }
        async fn item_base_info(
            &self,
            _: &str,
            _: &[i64],
        ) -> Result<Vec<ItemInfo>, ShopeeApiError> {
            Ok(Vec::new())
        }
        async fn tracking_number(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<String>, ShopeeApiError> {
            Ok(None)
        }
    }

    fn connect_test_shop(shop_id: &str) {
        repository::upsert(Shop::new(
            shop_id.to_string(),
            "Test Shop".to_string(),
            "access".to_string(),
            "refresh".to_string(),
            14400,
        ));
    }

    fn executor(gateway: Arc<dyn ShopeeGateway>) -> ExportExecutor {
        let cfg = ExportConfig {
            page_delay_ms: 0,
            ..ExportConfig::default()
        };
        ExportExecutor::new(gateway, ExportJobTracker::new(), cfg)
    }

    fn request(shop_id: &str, data_type: DataType) -> ExportRequest {
        ExportRequest {
            shop_id: shop_id.to_string(),
            data_type,
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        }
    }

    async fn wait_terminal(tracker: &ExportJobTracker, job_id: &str) -> ExportProgress {
        for _ in 0..200 {
            if let Some(progress) = tracker.get_progress(job_id) {
                if progress.status.is_terminal() {
                    return progress;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} did not reach a terminal status");
    }

    #[tokio::test]
    async fn unknown_shop_is_rejected() {
        let executor = executor(Arc::new(EmptyGateway));
        let response = executor.start_export(request("test-exec-nope", DataType::Returns));
        assert!(matches!(response.status, ExportStartStatus::Failed));
        assert!(response.job_id.is_empty());
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let shop_id = "test-exec-200001";
        connect_test_shop(shop_id);
        let executor = executor(Arc::new(EmptyGateway));
        let mut req = request(shop_id, DataType::Orders);
        req.date_from = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        req.date_to = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let response = executor.start_export(req);
        assert!(matches!(response.status, ExportStartStatus::Failed));
        repository::remove(shop_id);
    }

    #[tokio::test]
    async fn too_wide_range_is_rejected() {
        let shop_id = "test-exec-200002";
        connect_test_shop(shop_id);
        let executor = executor(Arc::new(EmptyGateway));
        let mut req = request(shop_id, DataType::Orders);
        req.date_from = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        req.date_to = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let response = executor.start_export(req);
        assert!(matches!(response.status, ExportStartStatus::Failed));
        repository::remove(shop_id);
    }

    #[tokio::test]
    async fn empty_period_completes_with_header_only_file() {
        let shop_id = "test-exec-200003";
        connect_test_shop(shop_id);
        let executor = executor(Arc::new(EmptyGateway));

        let response = executor.start_export(request(shop_id, DataType::Returns));
        assert!(matches!(response.status, ExportStartStatus::Started));
        assert_eq!(response.message, "Экспорт запущен: Возвраты");

        let progress = wait_terminal(executor.tracker(), &response.job_id).await;
        assert_eq!(progress.status, ExportStatus::Completed);
        assert_eq!(progress.total_rows, 0);
        assert_eq!(progress.percent, 100);

        let file = executor.tracker().take_file(&response.job_id).unwrap();
        assert!(file.filename.starts_with("returns_Test_Shop_"));
        assert_eq!(&file.bytes[0..2], b"PK");
        repository::remove(shop_id);
    }

    #[tokio::test]
    async fn returns_export_produces_a_downloadable_file() {
        let shop_id = "test-exec-200004";
        connect_test_shop(shop_id);
        let executor = executor(Arc::new(OneReturnGateway));

        let response = executor.start_export(request(shop_id, DataType::Returns));
        assert!(matches!(response.status, ExportStartStatus::Started));

        let progress = wait_terminal(executor.tracker(), &response.job_id).await;
        assert_eq!(progress.status, ExportStatus::Completed);
        assert_eq!(progress.total_rows, 1);

        let file = executor.tracker().take_file(&response.job_id).unwrap();
        assert!(!file.bytes.is_empty());
        assert!(executor.tracker().get_progress(&response.job_id).is_none());
        repository::remove(shop_id);
    }

    #[tokio::test]
    async fn returns_sharing_an_order_enrich_with_one_detail_call() {
        let shop_id = "test-exec-200006";
        connect_test_shop(shop_id);
        let gateway = Arc::new(SharedOrderGateway {
            detail_calls: Mutex::new(Vec::new()),
        });
        let executor = executor(gateway.clone());

        let response = executor.start_export(request(shop_id, DataType::Returns));
        assert!(matches!(response.status, ExportStartStatus::Started));

        let progress = wait_terminal(executor.tracker(), &response.job_id).await;
        assert_eq!(progress.status, ExportStatus::Completed);
        assert_eq!(progress.total_rows, 3);

        // Три возврата ссылаются на один заказ — ровно один вызов деталей
        let calls = gateway.detail_calls.lock().unwrap();
        assert_eq!(*calls, vec![1]);
        repository::remove(shop_id);
    }

    #[tokio::test]
    async fn disconnected_shop_requires_reauthorization() {
        let shop_id = "test-exec-200005";
        connect_test_shop(shop_id);
        repository::clear_tokens(shop_id);
        let executor = executor(Arc::new(EmptyGateway));

        let response = executor.start_export(request(shop_id, DataType::Returns));
        assert!(matches!(response.status, ExportStartStatus::Failed));
        repository::remove(shop_id);
    }
}
