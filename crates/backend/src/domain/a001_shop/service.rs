use contracts::domain::a001_shop::Shop;

use crate::shared::shopee::{ShopeeApiError, ShopeeClient};

use super::repository;

/// Окно фонового обновления: токены, истекающие в ближайшие полчаса
const REFRESH_WINDOW_SECS: i64 = 30 * 60;

/// Завершение OAuth: обмен кода на токены и регистрация магазина.
///
/// Имя магазина запрашивается сразу после получения токенов; если
/// get_shop_info не ответил — магазин все равно подключается с
/// именем-заглушкой, токены важнее названия.
pub async fn connect_shop(
    client: &ShopeeClient,
    code: &str,
    shop_id: &str,
) -> anyhow::Result<Shop> {
    let tokens = client.exchange_code(code, shop_id).await?;

    let shop_name = match client.get_shop_info(&tokens.access_token, shop_id).await {
        Ok(info) => info.shop_name.unwrap_or_else(|| format!("Shop {shop_id}")),
        Err(err) => {
            tracing::warn!("get_shop_info failed for shop {}: {}", shop_id, err);
            format!("Shop {shop_id}")
        }
    };

    let shop = Shop::new(
        shop_id.to_string(),
        shop_name,
        tokens.access_token,
        tokens.refresh_token,
        tokens.expire_in,
    );
    repository::upsert(shop.clone());

    tracing::info!("Shop {} ({}) connected", shop.shop_id, shop.shop_name);
    Ok(shop)
}

pub fn disconnect_shop(shop_id: &str) -> bool {
    let removed = repository::remove(shop_id);
    if removed {
        tracing::info!("Shop {} disconnected", shop_id);
    }
    removed
}

/// Фоновый проход по реестру: заранее обновляет токены, которые скоро
/// истекут. Отозванный refresh_token сбрасывает пару — магазину
/// потребуется повторная авторизация, экспорт вернет понятную ошибку.
pub async fn refresh_expiring_tokens(client: &ShopeeClient) {
    let expiring = repository::shops_expiring_within(REFRESH_WINDOW_SECS);
    if expiring.is_empty() {
        return;
    }

    tracing::info!("Refreshing tokens for {} shop(s)", expiring.len());
    for shop in expiring {
        match client.refresh_access_token(&shop.shop_id, &shop.refresh_token).await {
            Ok(tokens) => {
                repository::update_tokens(
                    &shop.shop_id,
                    &tokens.access_token,
                    &tokens.refresh_token,
                    tokens.expire_in,
                );
                tracing::info!("Token refreshed for shop {}", shop.shop_id);
            }
            Err(ShopeeApiError::Business { error, message }) => {
                tracing::error!(
                    "Refresh token rejected for shop {}: {} ({}), re-authorization required",
                    shop.shop_id,
                    error,
                    message
                );
                repository::clear_tokens(&shop.shop_id);
            }
            Err(err) => {
                // Сетевой сбой: пара еще может быть жива, попробуем в следующем проходе
                tracing::warn!("Token refresh failed for shop {}: {}", shop.shop_id, err);
            }
        }
    }
}
