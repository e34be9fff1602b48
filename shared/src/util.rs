use chrono::{DateTime, Utc};

/// 当前 UTC 时间
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Generate a random order id.
///
/// Ids are not sequential and carry no uniqueness guarantee on their own;
/// the store's insert-if-absent check is what rejects a collision.
pub fn random_order_id() -> u64 {
    rand::random::<u64>()
}

/// Parse an unsigned decimal made of ASCII digits only
///
/// Unlike `str::parse::<u64>`, a leading `+` is rejected.
pub fn parse_decimal_u64(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
