use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use contracts::usecases::u601_export_from_shopee::{
    DataType, ExportCheckpoint, ExportProgress, ExportStatus,
};

/// Готовый к скачиванию результат экспорта
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

struct JobEntry {
    progress: ExportProgress,
    checkpoint: Option<ExportCheckpoint>,
    cancel_requested: bool,
    file: Option<ExportFile>,
}

/// Трекер заданий экспорта (in-memory, для real-time мониторинга)
///
/// Хранит прогресс, чекпоинт возобновления, флаг отмены и готовый файл.
/// Процент не убывает, пока задание не терминально.
#[derive(Clone)]
pub struct ExportJobTracker {
    jobs: Arc<RwLock<HashMap<String, JobEntry>>>,
}

impl ExportJobTracker {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Создать новое задание экспорта
    pub fn create_job(&self, job_id: String, shop_id: String, data_type: DataType) {
        let mut jobs = self.jobs.write().unwrap();
        jobs.insert(
            job_id.clone(),
            JobEntry {
                progress: ExportProgress::new(job_id, shop_id, data_type),
                checkpoint: None,
                cancel_requested: false,
                file: None,
            },
        );
    }

    /// Получить текущий прогресс задания
    pub fn get_progress(&self, job_id: &str) -> Option<ExportProgress> {
        let jobs = self.jobs.read().unwrap();
        jobs.get(job_id).map(|j| j.progress.clone())
    }

    /// Обновить шаг и процент. Процент только растет: поллинг никогда
    /// не должен увидеть откат прогресс-бара назад.
    pub fn set_step(&self, job_id: &str, percent: u8, step: &str) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            if job.progress.status.is_terminal() {
                return;
            }
            job.progress.status = ExportStatus::Processing;
            job.progress.percent = job.progress.percent.max(percent.min(100));
            job.progress.current_step = step.to_string();
            job.progress.updated_at = chrono::Utc::now();
        }
    }

    pub fn set_total_rows(&self, job_id: &str, total_rows: usize) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            job.progress.total_rows = total_rows;
            job.progress.updated_at = chrono::Utc::now();
        }
    }

    // ========================================================================
    // Чекпоинт возобновления
    // ========================================================================

    pub fn save_checkpoint(&self, job_id: &str, checkpoint: ExportCheckpoint) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            job.checkpoint = Some(checkpoint);
        }
    }

    pub fn load_checkpoint(&self, job_id: &str) -> Option<ExportCheckpoint> {
        let jobs = self.jobs.read().unwrap();
        jobs.get(job_id).and_then(|j| j.checkpoint.clone())
    }

    pub fn clear_checkpoint(&self, job_id: &str) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            job.checkpoint = None;
        }
    }

    // ========================================================================
    // Отмена
    // ========================================================================

    /// Запросить отмену. Воркер увидит флаг на границе страницы/чанка.
    /// Возвращает false, если задание не найдено или уже завершилось.
    pub fn request_cancel(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.write().unwrap();
        match jobs.get_mut(job_id) {
            Some(job) if !job.progress.status.is_terminal() => {
                job.cancel_requested = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_cancel_requested(&self, job_id: &str) -> bool {
        let jobs = self.jobs.read().unwrap();
        jobs.get(job_id).map(|j| j.cancel_requested).unwrap_or(false)
    }

    // ========================================================================
    // Терминальные переходы
    // ========================================================================

    /// Завершить задание с готовым файлом
    pub fn complete(&self, job_id: &str, total_rows: usize, file: ExportFile, step: &str) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            let now = chrono::Utc::now();
            job.progress.status = ExportStatus::Completed;
            job.progress.percent = 100;
            job.progress.total_rows = total_rows;
            job.progress.current_step = step.to_string();
            job.progress.completed_at = Some(now);
            job.progress.updated_at = now;
            job.checkpoint = None;
            job.file = Some(file);
        }
    }

    pub fn fail(&self, job_id: &str, error: String) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            let now = chrono::Utc::now();
            job.progress.status = ExportStatus::Error;
            job.progress.current_step = "Экспорт прерван ошибкой".to_string();
            job.progress.error = Some(error);
            job.progress.completed_at = Some(now);
            job.progress.updated_at = now;
        }
    }

    pub fn mark_cancelled(&self, job_id: &str) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            let now = chrono::Utc::now();
            job.progress.status = ExportStatus::Cancelled;
            job.progress.current_step = "Экспорт отменен".to_string();
            job.progress.completed_at = Some(now);
            job.progress.updated_at = now;
            job.checkpoint = None;
        }
    }

    /// Забрать готовый файл. Задание при этом удаляется из памяти:
    /// файл скачивается один раз.
    pub fn take_file(&self, job_id: &str) -> Option<ExportFile> {
        let mut jobs = self.jobs.write().unwrap();
        let has_file = jobs.get(job_id).map(|j| j.file.is_some()).unwrap_or(false);
        if !has_file {
            return None;
        }
        jobs.remove(job_id).and_then(|j| j.file)
    }

    /// Удалить старые завершенные задания (для очистки памяти)
    pub fn cleanup_old_jobs(&self, max_age_hours: i64) {
        let mut jobs = self.jobs.write().unwrap();
        let now = chrono::Utc::now();
        jobs.retain(|_, job| {
            if let Some(completed_at) = job.progress.completed_at {
                (now - completed_at).num_hours() < max_age_hours
            } else {
                true // Не удаляем активные задания
            }
        });
    }
}

impl Default for ExportJobTracker {
    fn default() -> Self {
        Self::new()
    }
}
