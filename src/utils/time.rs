//! Timestamp helpers
//!
//! All persisted timestamps are Unix milliseconds; conversion to display
//! formats is the frontend's concern.

/// Current time as Unix milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
