use std::collections::HashMap;
use std::sync::RwLock;

use contracts::domain::a001_shop::Shop;
use once_cell::sync::Lazy;

/// Реестр подключенных магазинов.
///
/// Хранится в памяти процесса: переподключение магазина после рестарта
/// делается заново через OAuth, токены на диск не пишутся.
static SHOPS: Lazy<RwLock<HashMap<String, Shop>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Добавить или заменить магазин в реестре
pub fn upsert(shop: Shop) {
    let mut shops = SHOPS.write().unwrap();
    shops.insert(shop.shop_id.clone(), shop);
}

pub fn get(shop_id: &str) -> Option<Shop> {
    let shops = SHOPS.read().unwrap();
    shops.get(shop_id).cloned()
}

/// Все магазины, отсортированные по дате подключения
pub fn list() -> Vec<Shop> {
    let shops = SHOPS.read().unwrap();
    let mut all: Vec<Shop> = shops.values().cloned().collect();
    all.sort_by_key(|s| s.connected_at);
    all
}

pub fn remove(shop_id: &str) -> bool {
    let mut shops = SHOPS.write().unwrap();
    shops.remove(shop_id).is_some()
}

/// Записать новую пару токенов после refresh
pub fn update_tokens(shop_id: &str, access_token: &str, refresh_token: &str, expire_in_secs: i64) {
    let mut shops = SHOPS.write().unwrap();
    if let Some(shop) = shops.get_mut(shop_id) {
        shop.update_tokens(access_token.to_string(), refresh_token.to_string(), expire_in_secs);
    }
}

/// Сбросить токены магазина (refresh_token отозван или протух).
/// Магазин остается в списке, но помечен как требующий переподключения.
pub fn clear_tokens(shop_id: &str) {
    let mut shops = SHOPS.write().unwrap();
    if let Some(shop) = shops.get_mut(shop_id) {
        shop.access_token.clear();
        shop.refresh_token.clear();
    }
}

/// Магазины, у которых access_token истекает в ближайшие `within_secs` секунд
pub fn shops_expiring_within(within_secs: i64) -> Vec<Shop> {
    let shops = SHOPS.read().unwrap();
    shops
        .values()
        .filter(|s| !s.refresh_token.is_empty() && s.token_expires_within(within_secs))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_shop(shop_id: &str, expire_in_secs: i64) -> Shop {
        Shop::new(
            shop_id.to_string(),
            format!("Shop {shop_id}"),
            "access".to_string(),
            "refresh".to_string(),
            expire_in_secs,
        )
    }

    #[test]
    fn upsert_get_remove_roundtrip() {
        let shop_id = "test-repo-100001";
        upsert(make_shop(shop_id, 3600));
        assert!(get(shop_id).is_some());
        assert!(remove(shop_id));
        assert!(get(shop_id).is_none());
        assert!(!remove(shop_id));
    }

    #[test]
    fn update_tokens_replaces_the_pair() {
        let shop_id = "test-repo-100002";
        upsert(make_shop(shop_id, 10));
        update_tokens(shop_id, "at-new", "rt-new", 14400);

        let shop = get(shop_id).unwrap();
        assert_eq!(shop.access_token, "at-new");
        assert_eq!(shop.refresh_token, "rt-new");
        assert!(!shop.token_expires_within(60));
        remove(shop_id);
    }

    #[test]
    fn expiring_filter_skips_fresh_and_disconnected_shops() {
        let fresh_id = "test-repo-100003";
        let stale_id = "test-repo-100004";
        let cleared_id = "test-repo-100005";
        upsert(make_shop(fresh_id, 7200));
        upsert(make_shop(stale_id, 60));
        upsert(make_shop(cleared_id, 60));
        clear_tokens(cleared_id);

        let expiring = shops_expiring_within(600);
        assert!(expiring.iter().any(|s| s.shop_id == stale_id));
        assert!(!expiring.iter().any(|s| s.shop_id == fresh_id));
        assert!(!expiring.iter().any(|s| s.shop_id == cleared_id));

        remove(fresh_id);
        remove(stale_id);
        remove(cleared_id);
    }
}
