pub mod cloudflare;
pub mod pushplus;

use time::macros::format_description;
use time::OffsetDateTime;

#[derive(Debug)]
pub struct DnsUpdateResult {
    pub success: bool,
    pub message: String,
    pub record_id: String,
}

/// Local wall-clock time for console lines, `YYYY-MM-DD HH:MM:SS`.
/// Falls back to UTC when the local offset cannot be determined.
pub fn timestamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(&format)
        .unwrap_or_else(|_| "-".to_string())
}
