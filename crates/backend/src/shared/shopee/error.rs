use thiserror::Error;

/// Ошибки клиента Shopee API.
///
/// Клиент никогда не паникует: любой исход вызова сводится к одному из
/// этих вариантов, и только Network/RateLimited повторяются с backoff.
#[derive(Debug, Error)]
pub enum ShopeeApiError {
    /// Не заполнены учетные данные приложения
    #[error("configuration error: {0}")]
    Config(String),

    /// Магазин не подключен (нет токенов в реестре)
    #[error("shop {0} is not connected")]
    ShopNotFound(String),

    /// Сетевой сбой, повторы исчерпаны
    #[error("network error after {attempts} attempt(s): {message}")]
    Network { attempts: u32, message: String },

    /// HTTP 429, повторы исчерпаны
    #[error("rate limited by Shopee API after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    /// Бизнес-ошибка из тела ответа (error/message) — не повторяется
    #[error("Shopee API error '{error}': {message}")]
    Business { error: String, message: String },

    /// Ответ не удалось разобрать в ожидаемую структуру
    #[error("unexpected response shape: {0}")]
    Decode(String),
}
