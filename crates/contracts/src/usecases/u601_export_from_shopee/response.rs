use serde::{Deserialize, Serialize};

/// Ответ на запрос экспорта
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    /// Уникальный ID задания экспорта
    pub job_id: String,

    /// Статус запуска
    pub status: ExportStartStatus,

    /// Сообщение
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStartStatus {
    /// Экспорт успешно запущен
    Started,

    /// Ошибка при запуске
    Failed,
}
