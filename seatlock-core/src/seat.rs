use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{SeatError, SeatResult};

/// Seat identifier, 1-based. Range checks against the configured pool happen
/// in the registry; parsing only guarantees a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(u32);

impl SeatId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SeatId {
    type Err = SeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u32>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(SeatError::NotFound(s.to_string())),
        }
    }
}

/// Opaque, caller-supplied token naming who holds a lock. Not authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HolderId(String);

impl HolderId {
    pub fn new(raw: impl Into<String>) -> SeatResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(SeatError::InvalidInput("userId must not be empty".to_string()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Locked,
    Booked,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SeatStatus::Available => "available",
            SeatStatus::Locked => "locked",
            SeatStatus::Booked => "booked",
        };
        f.write_str(label)
    }
}

/// Read-only view of a single seat. Holder and expiry are only set while the
/// seat is locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: SeatId,
    pub status: SeatStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SeatView {
    pub fn available(id: SeatId) -> Self {
        Self {
            id,
            status: SeatStatus::Available,
            holder: None,
            expires_at: None,
        }
    }

    pub fn locked(id: SeatId, holder: &HolderId, expires_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: SeatStatus::Locked,
            holder: Some(holder.as_str().to_string()),
            expires_at: Some(expires_at),
        }
    }

    pub fn booked(id: SeatId) -> Self {
        Self {
            id,
            status: SeatStatus::Booked,
            holder: None,
            expires_at: None,
        }
    }
}

/// Point-in-time view of every seat plus the server clock, so clients can
/// render remaining lock time without trusting their own clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub seats: BTreeMap<SeatId, SeatView>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub server_time: DateTime<Utc>,
}

impl Snapshot {
    pub fn seat(&self, id: SeatId) -> Option<&SeatView> {
        self.seats.get(&id)
    }

    pub fn count_with_status(&self, status: SeatStatus) -> usize {
        self.seats.values().filter(|s| s.status == status).count()
    }
}
