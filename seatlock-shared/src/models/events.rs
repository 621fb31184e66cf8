use serde::{Deserialize, Serialize};

/// Why a seat changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatChangeReason {
    Locked,
    Confirmed,
    Unlocked,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatChangedEvent {
    pub seat_id: u32,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub reason: SeatChangeReason,
    pub timestamp: i64, // epoch millis
}

impl SeatChangedEvent {
    pub fn new(seat_id: u32, status: impl Into<String>, reason: SeatChangeReason) -> Self {
        Self {
            seat_id,
            status: status.into(),
            holder: None,
            expires_at: None,
            reason,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = Some(holder.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}
