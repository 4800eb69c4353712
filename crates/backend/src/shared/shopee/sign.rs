use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Подпись запроса к Shopee Open Platform v2.
///
/// База подписи — конкатенация в строгом порядке:
/// `partner_id + path + timestamp [+ access_token] [+ shop_id]`,
/// HMAC-SHA256 с partner_key, hex в нижнем регистре.
pub fn sign_request(
    partner_id: i64,
    partner_key: &str,
    path: &str,
    timestamp: i64,
    access_token: Option<&str>,
    shop_id: Option<&str>,
) -> String {
    let mut base_string = format!("{partner_id}{path}{timestamp}");
    if let Some(token) = access_token {
        base_string.push_str(token);
    }
    if let Some(shop) = shop_id {
        base_string.push_str(shop);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(partner_key.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(base_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
