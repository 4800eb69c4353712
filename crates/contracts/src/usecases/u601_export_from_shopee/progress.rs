use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::DataType;

/// Текущий прогресс экспорта (для real-time мониторинга через поллинг)
///
/// Это облегченное зеркало задания: накопленные строки и готовый файл
/// наружу не отдаются, только счетчики и статус.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportProgress {
    pub job_id: String,
    pub shop_id: String,
    pub data_type: DataType,

    pub status: ExportStatus,

    /// Процент выполнения, 0–100, не убывает пока задание идет
    pub percent: u8,

    /// Человекочитаемое описание текущего шага (только для отображения)
    pub current_step: String,

    /// Сколько строк отчета накоплено
    pub total_rows: usize,

    /// Последняя ошибка (терминальная для статуса Error)
    pub error: Option<String>,

    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Последнее обновление прогресса
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    /// Задание создано, воркер еще не начал работу
    Initializing,

    /// Выгрузка идет
    Processing,

    /// Экспорт завершен, файл готов к скачиванию
    Completed,

    /// Экспорт провален
    Error,

    /// Экспорт отменен пользователем
    Cancelled,
}

impl ExportStatus {
    /// Терминальный статус: задание больше не изменится
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }
}

/// Чекпоинт для возобновления прерванной выгрузки
///
/// Для page_no-пагинации заполняется `page_no`, для курсорной — еще и
/// `cursor` (по одному номеру страницы курсорную пагинацию не возобновить).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportCheckpoint {
    /// Индекс чанка дат, на котором остановились
    pub chunk_index: usize,

    /// Номер страницы внутри чанка, с которой продолжать
    pub page_no: u32,

    /// Курсор для курсорных эндпоинтов
    pub cursor: Option<String>,

    /// Сколько записей уже накоплено
    pub running_total: usize,
}

impl ExportProgress {
    pub fn new(job_id: String, shop_id: String, data_type: DataType) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            shop_id,
            data_type,
            status: ExportStatus::Initializing,
            percent: 0,
            current_step: "Задание создано".to_string(),
            total_rows: 0,
            error: None,
            started_at: now,
            completed_at: None,
            updated_at: now,
        }
    }
}
