use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Подключенный магазин Shopee (учетные данные OAuth2)
///
/// Живет только в памяти процесса: магазин привязывается через OAuth callback
/// и пропадает при перезапуске (переподключение через повторную авторизацию).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    /// ID магазина в Shopee (числовой, но храним строкой — так он приходит в callback)
    pub shop_id: String,

    /// Отображаемое имя магазина (из /shop/get_shop_info)
    pub shop_name: String,

    pub access_token: String,
    pub refresh_token: String,

    /// Момент истечения access_token
    pub expires_at: DateTime<Utc>,

    /// Когда магазин был подключен
    pub connected_at: DateTime<Utc>,
}

impl Shop {
    pub fn new(
        shop_id: String,
        shop_name: String,
        access_token: String,
        refresh_token: String,
        expire_in_secs: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            shop_id,
            shop_name,
            access_token,
            refresh_token,
            expires_at: now + Duration::seconds(expire_in_secs),
            connected_at: now,
        }
    }

    /// Токен еще действителен
    pub fn is_token_valid(&self) -> bool {
        !self.access_token.is_empty() && Utc::now() < self.expires_at
    }

    /// Токен истекает в ближайшие `secs` секунд (или уже истек)
    pub fn token_expires_within(&self, secs: i64) -> bool {
        Utc::now() + Duration::seconds(secs) >= self.expires_at
    }

    /// Обновить пару токенов после refresh
    pub fn update_tokens(&mut self, access_token: String, refresh_token: String, expire_in_secs: i64) {
        self.access_token = access_token;
        self.refresh_token = refresh_token;
        self.expires_at = Utc::now() + Duration::seconds(expire_in_secs);
    }
}
