use std::collections::{HashMap, HashSet};

use crate::shared::shopee::models::{ItemInfo, OrderDetail, OrderSummary, ReturnRecord};
use crate::shared::shopee::ShopeeGateway;

use super::job_tracker::ExportJobTracker;
use super::pagination::ExportCancelled;

/// Лимит Shopee на batch-эндпоинты деталей
pub const DETAIL_BATCH_SIZE: usize = 50;

/// Убрать дубликаты и пустые order_sn, сохранив порядок первого
/// появления. Пагинация по пересекающимся окнам может отдать заказ
/// дважды, несколько возвратов могут ссылаться на один заказ.
pub fn dedup_sns(sns: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    sns.into_iter()
        .filter(|sn| !sn.is_empty() && seen.insert(sn.clone()))
        .collect()
}

pub fn dedup_order_sns(summaries: &[OrderSummary]) -> Vec<String> {
    dedup_sns(summaries.iter().map(|s| s.order_sn.clone()))
}

/// Обогащение сводок заказов деталями: батчи по 50, затем трек-номера
pub async fn enrich_orders(
    gateway: &dyn ShopeeGateway,
    tracker: &ExportJobTracker,
    job_id: &str,
    shop_id: &str,
    summaries: &[OrderSummary],
) -> anyhow::Result<Vec<OrderDetail>> {
    let order_sns = dedup_order_sns(summaries);
    fetch_order_details(gateway, tracker, job_id, shop_id, &order_sns).await
}

/// Детали заказов, на которые ссылаются возвраты: один вызов деталей
/// на уникальный order_sn независимо от числа возвратов по нему.
/// Возврат без найденной детали остается в отчете с пустыми полями
/// заказа.
pub async fn enrich_returns(
    gateway: &dyn ShopeeGateway,
    tracker: &ExportJobTracker,
    job_id: &str,
    shop_id: &str,
    returns: &[ReturnRecord],
) -> anyhow::Result<HashMap<String, OrderDetail>> {
    let order_sns = dedup_sns(returns.iter().map(|r| r.order_sn.clone()));
    let details = fetch_order_details(gateway, tracker, job_id, shop_id, &order_sns).await?;
    Ok(details_by_sn(details))
}

pub fn details_by_sn(details: Vec<OrderDetail>) -> HashMap<String, OrderDetail> {
    details.into_iter().map(|d| (d.order_sn.clone(), d)).collect()
}

/// Детали по готовому списку уникальных order_sn: батчи по 50, затем
/// трек-номера для заказов, где деталь их не содержала.
///
/// Отказ одного батча не валит весь экспорт — батч пропускается с
/// warn-логом. Ошибка возвращается только если не выжил ни один батч.
pub async fn fetch_order_details(
    gateway: &dyn ShopeeGateway,
    tracker: &ExportJobTracker,
    job_id: &str,
    shop_id: &str,
    order_sns: &[String],
) -> anyhow::Result<Vec<OrderDetail>> {
    if order_sns.is_empty() {
        return Ok(Vec::new());
    }

    let batches: Vec<&[String]> = order_sns.chunks(DETAIL_BATCH_SIZE).collect();
    let total_batches = batches.len();
    let mut details = Vec::with_capacity(order_sns.len());
    let mut failed_batches = 0;
    let mut last_error = None;

    for (i, batch) in batches.into_iter().enumerate() {
        if tracker.is_cancel_requested(job_id) {
            return Err(ExportCancelled.into());
        }
        match gateway.order_detail(shop_id, batch).await {
            Ok(mut batch_details) => details.append(&mut batch_details),
            Err(err) => {
                tracing::warn!(
                    "Order detail batch {}/{} failed for job {}: {}",
                    i + 1,
                    total_batches,
                    job_id,
                    err
                );
                failed_batches += 1;
                last_error = Some(err);
            }
        }

        let percent = 85 + ((i + 1) * 5 / total_batches) as u8;
        tracker.set_step(
            job_id,
            percent.min(90),
            &format!("Детали заказов: батч {}/{}", i + 1, total_batches),
        );
    }

    if failed_batches == total_batches {
        if let Some(err) = last_error {
            return Err(err.into());
        }
    }

    fill_tracking_numbers(gateway, tracker, job_id, shop_id, &mut details).await?;
    Ok(details)
}

/// Трек-номера добираются по одному, только для заказов, где деталь
/// их не содержала. Ошибка одного запроса не фатальна.
async fn fill_tracking_numbers(
    gateway: &dyn ShopeeGateway,
    tracker: &ExportJobTracker,
    job_id: &str,
    shop_id: &str,
    details: &mut [OrderDetail],
) -> anyhow::Result<()> {
    let missing: Vec<usize> = details
        .iter()
        .enumerate()
        .filter(|(_, d)| d.tracking_no.as_deref().map_or(true, |t| t.is_empty()))
        .map(|(i, _)| i)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let total = missing.len();
    for (done, idx) in missing.into_iter().enumerate() {
        if tracker.is_cancel_requested(job_id) {
            return Err(ExportCancelled.into());
        }
        let order_sn = details[idx].order_sn.clone();
        match gateway.tracking_number(shop_id, &order_sn).await {
            Ok(tracking) => details[idx].tracking_no = tracking,
            Err(err) => {
                tracing::warn!(
                    "Tracking number lookup failed for order {} of job {}: {}",
                    order_sn,
                    job_id,
                    err
                );
            }
        }
        let percent = 90 + ((done + 1) * 5 / total) as u8;
        tracker.set_step(
            job_id,
            percent.min(95),
            &format!("Трек-номера: {}/{}", done + 1, total),
        );
    }
    Ok(())
}

/// Детали товаров батчами по 50 item_id
pub async fn fetch_item_infos(
    gateway: &dyn ShopeeGateway,
    tracker: &ExportJobTracker,
    job_id: &str,
    shop_id: &str,
    item_ids: &[i64],
) -> anyhow::Result<Vec<ItemInfo>> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }

    let batches: Vec<&[i64]> = item_ids.chunks(DETAIL_BATCH_SIZE).collect();
    let total_batches = batches.len();
    let mut infos = Vec::with_capacity(item_ids.len());
    let mut failed_batches = 0;
    let mut last_error = None;

    for (i, batch) in batches.into_iter().enumerate() {
        if tracker.is_cancel_requested(job_id) {
            return Err(ExportCancelled.into());
        }
        match gateway.item_base_info(shop_id, batch).await {
            Ok(mut batch_infos) => infos.append(&mut batch_infos),
            Err(err) => {
                tracing::warn!(
                    "Item info batch {}/{} failed for job {}: {}",
                    i + 1,
                    total_batches,
                    job_id,
                    err
                );
                failed_batches += 1;
                last_error = Some(err);
            }
        }

        let percent = 85 + ((i + 1) * 10 / total_batches) as u8;
        tracker.set_step(
            job_id,
            percent.min(95),
            &format!("Детали товаров: батч {}/{}", i + 1, total_batches),
        );
    }

    if failed_batches == total_batches {
        if let Some(err) = last_error {
            return Err(err.into());
        }
    }
    Ok(infos)
}
