use std::time::Duration;

use contracts::usecases::u601_export_from_shopee::ExportCheckpoint;

use crate::shared::config::ExportConfig;
use crate::shared::shopee::models::{ItemSummary, OrderSummary, ReturnRecord};
use crate::shared::shopee::ShopeeGateway;

use super::chunker::DateChunk;
use super::job_tracker::ExportJobTracker;

/// Маркер отмены: воркер различает отмену пользователем и реальную
/// ошибку через downcast.
#[derive(Debug, thiserror::Error)]
#[error("export cancelled by user")]
pub struct ExportCancelled;

/// Чекпоинт пишется каждые N страниц и на границе каждого чанка
const CHECKPOINT_EVERY_PAGES: u32 = 10;

/// Оценка страниц на чанк для прогресса; реальное число неизвестно заранее
const PAGES_PER_CHUNK_ESTIMATE: f64 = 20.0;

/// Процент выполнения на фазе пагинации: 5..85.
///
/// Внутри чанка прогресс оценивается по номеру страницы и никогда не
/// добирает чанк до конца — границу двигает только следующий чанк.
fn pagination_percent(chunk_index: usize, total_chunks: usize, page_no: u32) -> u8 {
    let page_part = (page_no as f64 / PAGES_PER_CHUNK_ESTIMATE).min(0.9);
    let fraction = (chunk_index as f64 + page_part) / total_chunks.max(1) as f64;
    (5.0 + 80.0 * fraction).min(85.0) as u8
}

fn check_cancel(tracker: &ExportJobTracker, job_id: &str) -> anyhow::Result<()> {
    if tracker.is_cancel_requested(job_id) {
        return Err(ExportCancelled.into());
    }
    Ok(())
}

async fn page_pause(cfg: &ExportConfig) {
    if cfg.page_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(cfg.page_delay_ms)).await;
    }
}

/// Выгрузка возвратов по чанкам, page_no-пагинация.
///
/// Уже накопленные записи остаются в `out` при сбое: повторный вызов
/// продолжает с чекпоинта, не дублируя пройденные страницы.
pub async fn fetch_returns(
    gateway: &dyn ShopeeGateway,
    tracker: &ExportJobTracker,
    cfg: &ExportConfig,
    job_id: &str,
    shop_id: &str,
    chunks: &[DateChunk],
    out: &mut Vec<ReturnRecord>,
) -> anyhow::Result<()> {
    let checkpoint = tracker.load_checkpoint(job_id).unwrap_or_default();

    for chunk in chunks {
        if chunk.index < checkpoint.chunk_index {
            continue;
        }
        check_cancel(tracker, job_id)?;

        let mut page_no: u32 = if chunk.index == checkpoint.chunk_index {
            checkpoint.page_no.max(1)
        } else {
            1
        };

        loop {
            check_cancel(tracker, job_id)?;
            let page = gateway
                .return_list(
                    shop_id,
                    chunk.time_from_unix(),
                    chunk.time_to_unix(),
                    page_no,
                    cfg.returns_page_size,
                )
                .await?;
            let more = page.more;
            out.extend(page.returns);

            tracker.set_step(
                job_id,
                pagination_percent(chunk.index, chunks.len(), page_no),
                &format!(
                    "Возвраты: период {}/{}, страница {}",
                    chunk.index + 1,
                    chunks.len(),
                    page_no
                ),
            );
            tracker.set_total_rows(job_id, out.len());

            if page_no % CHECKPOINT_EVERY_PAGES == 0 {
                tracker.save_checkpoint(
                    job_id,
                    ExportCheckpoint {
                        chunk_index: chunk.index,
                        page_no: page_no + 1,
                        cursor: None,
                        running_total: out.len(),
                    },
                );
            }

            if !more {
                break;
            }
            if page_no >= cfg.max_pages_per_chunk {
                tracing::warn!(
                    "Page ceiling {} reached for chunk {} of job {}, moving on",
                    cfg.max_pages_per_chunk,
                    chunk.index,
                    job_id
                );
                break;
            }
            page_no += 1;
            page_pause(cfg).await;
        }

        tracker.save_checkpoint(
            job_id,
            ExportCheckpoint {
                chunk_index: chunk.index + 1,
                page_no: 1,
                cursor: None,
                running_total: out.len(),
            },
        );
    }
    Ok(())
}

/// Выгрузка сводок заказов по чанкам, курсорная пагинация.
///
/// Курсор непрозрачен, поэтому сохраняется в чекпоинте вместе с
/// номером страницы — иначе чанк пришлось бы перечитывать с начала.
pub async fn fetch_orders(
    gateway: &dyn ShopeeGateway,
    tracker: &ExportJobTracker,
    cfg: &ExportConfig,
    job_id: &str,
    shop_id: &str,
    chunks: &[DateChunk],
    out: &mut Vec<OrderSummary>,
) -> anyhow::Result<()> {
    let checkpoint = tracker.load_checkpoint(job_id).unwrap_or_default();

    for chunk in chunks {
        if chunk.index < checkpoint.chunk_index {
            continue;
        }
        check_cancel(tracker, job_id)?;

        let (mut cursor, mut page_no) = if chunk.index == checkpoint.chunk_index {
            (
                checkpoint.cursor.clone().unwrap_or_default(),
                checkpoint.page_no.max(1),
            )
        } else {
            (String::new(), 1)
        };

        loop {
            check_cancel(tracker, job_id)?;
            let page = gateway
                .order_list(
                    shop_id,
                    chunk.time_from_unix(),
                    chunk.time_to_unix(),
                    &cursor,
                    cfg.page_size,
                )
                .await?;
            let more = page.more;
            let next_cursor = page.next_cursor;
            out.extend(page.order_list);

            tracker.set_step(
                job_id,
                pagination_percent(chunk.index, chunks.len(), page_no),
                &format!(
                    "Заказы: период {}/{}, страница {}",
                    chunk.index + 1,
                    chunks.len(),
                    page_no
                ),
            );
            tracker.set_total_rows(job_id, out.len());

            if page_no % CHECKPOINT_EVERY_PAGES == 0 {
                tracker.save_checkpoint(
                    job_id,
                    ExportCheckpoint {
                        chunk_index: chunk.index,
                        page_no: page_no + 1,
                        cursor: Some(next_cursor.clone()),
                        running_total: out.len(),
                    },
                );
            }

            if !more || next_cursor.is_empty() {
                break;
            }
            if page_no >= cfg.max_pages_per_chunk {
                tracing::warn!(
                    "Page ceiling {} reached for chunk {} of job {}, moving on",
                    cfg.max_pages_per_chunk,
                    chunk.index,
                    job_id
                );
                break;
            }
            cursor = next_cursor;
            page_no += 1;
            page_pause(cfg).await;
        }

        tracker.save_checkpoint(
            job_id,
            ExportCheckpoint {
                chunk_index: chunk.index + 1,
                page_no: 1,
                cursor: None,
                running_total: out.len(),
            },
        );
    }
    Ok(())
}

/// Выгрузка каталога товаров, offset-пагинация.
///
/// Каталог не фильтруется по датам, чанков нет; offset хранится в
/// строковом поле чекпоинта.
pub async fn fetch_products(
    gateway: &dyn ShopeeGateway,
    tracker: &ExportJobTracker,
    cfg: &ExportConfig,
    job_id: &str,
    shop_id: &str,
    out: &mut Vec<ItemSummary>,
) -> anyhow::Result<()> {
    let checkpoint = tracker.load_checkpoint(job_id).unwrap_or_default();
    let mut offset: i64 = checkpoint
        .cursor
        .as_deref()
        .and_then(|c| c.parse().ok())
        .unwrap_or(0);
    let mut page_no: u32 = checkpoint.page_no.max(1);

    loop {
        check_cancel(tracker, job_id)?;
        let page = gateway.item_list(shop_id, offset, cfg.page_size).await?;
        let has_next = page.has_next_page;
        let next_offset = page.next_offset;
        out.extend(page.item);

        tracker.set_step(
            job_id,
            pagination_percent(0, 1, page_no),
            &format!("Товары: страница {page_no}"),
        );
        tracker.set_total_rows(job_id, out.len());

        if page_no % CHECKPOINT_EVERY_PAGES == 0 {
            tracker.save_checkpoint(
                job_id,
                ExportCheckpoint {
                    chunk_index: 0,
                    page_no: page_no + 1,
                    cursor: Some(next_offset.to_string()),
                    running_total: out.len(),
                },
            );
        }

        if !has_next {
            break;
        }
        if page_no >= cfg.max_pages_per_chunk {
            tracing::warn!(
                "Page ceiling {} reached for item list of job {}, moving on",
                cfg.max_pages_per_chunk,
                job_id
            );
            break;
        }
        offset = next_offset;
        page_no += 1;
        page_pause(cfg).await;
    }
    Ok(())
}
