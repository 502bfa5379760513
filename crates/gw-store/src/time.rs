/// Current time as milliseconds since the Unix epoch.
///
/// `expires_at` on [`crate::TokenRecord`] and every comparison against "now"
/// in the broker is expressed in this unit (spec.md §3.1: "absolute instant
/// in UTC milliseconds").
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
