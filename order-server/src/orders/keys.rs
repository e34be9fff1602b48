//! Store key layout for orders

/// Name of the set holding every live order key
pub const ORDER_INDEX: &str = "orders";

const ORDER_KEY_PREFIX: &str = "order:";

/// Store key for an order id (`order:<id>`)
pub fn order_key(order_id: u64) -> String {
    format!("{ORDER_KEY_PREFIX}{order_id}")
}

/// Recover the order id from a key produced by [`order_key`]
pub fn parse_order_key(key: &str) -> Option<u64> {
    let digits = key.strip_prefix(ORDER_KEY_PREFIX)?;
    // 拒绝 "+1" / "01" 这类非规范形式，保证一一对应
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}
