//! In-memory seat registry.
//!
//! [`SeatRegistry`] owns a fixed pool of seats and every state transition on
//! them. Each seat sits behind its own mutex, so operations on different seats
//! never contend, and guards are never held across an await point or while
//! touching another seat.
//!
//! Every granted lock gets a unique instance id. The expiry callback carries
//! that id and only clears the seat if the same lock is still in place, which
//! makes late or uncancelled timers harmless.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use seatlock_core::{
    CoreError, CoreResult, HolderId, Scheduler, SeatError, SeatId, SeatResult, SeatView, Snapshot,
    TimerHandle,
};
use seatlock_shared::models::events::{SeatChangeReason, SeatChangedEvent};
use seatlock_shared::pii::Masked;

pub const DEFAULT_SEAT_COUNT: u32 = 10;
pub const DEFAULT_LOCK_DURATION: Duration = Duration::from_secs(60);
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub seat_count: u32,
    pub lock_duration: Duration,
    /// Buffer size of the seat change broadcast channel.
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            seat_count: DEFAULT_SEAT_COUNT,
            lock_duration: DEFAULT_LOCK_DURATION,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.seat_count == 0 {
            return Err(CoreError::InvalidConfig("seat count must be at least 1".to_string()));
        }
        if self.lock_duration.is_zero() {
            return Err(CoreError::InvalidConfig("lock duration must be positive".to_string()));
        }
        let in_range = chrono::Duration::from_std(self.lock_duration)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .is_some();
        if !in_range {
            return Err(CoreError::InvalidConfig("lock duration is out of range".to_string()));
        }
        if self.event_capacity == 0 {
            return Err(CoreError::InvalidConfig("event capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

struct SeatLock {
    id: Uuid,
    holder: HolderId,
    expires_at: DateTime<Utc>,
    timer: TimerHandle,
}

/// Lock data only exists in the `Locked` variant.
enum SeatState {
    Available,
    Locked(SeatLock),
    Booked,
}

impl SeatState {
    fn view(&self, id: SeatId) -> SeatView {
        match self {
            SeatState::Available => SeatView::available(id),
            SeatState::Locked(lock) => SeatView::locked(id, &lock.holder, lock.expires_at),
            SeatState::Booked => SeatView::booked(id),
        }
    }
}

struct RegistryInner {
    seats: Vec<Mutex<SeatState>>,
    lock_duration: Duration,
    scheduler: Arc<dyn Scheduler>,
    events: broadcast::Sender<SeatChangedEvent>,
}

/// Cloneable handle to the seat pool. All clones share the same seats.
#[derive(Clone)]
pub struct SeatRegistry {
    inner: Arc<RegistryInner>,
}

impl SeatRegistry {
    pub fn new(config: RegistryConfig, scheduler: Arc<dyn Scheduler>) -> CoreResult<Self> {
        config.validate()?;

        let seats = (0..config.seat_count)
            .map(|_| Mutex::new(SeatState::Available))
            .collect();
        let (events, _) = broadcast::channel(config.event_capacity);

        info!(
            seats = config.seat_count,
            lock_seconds = config.lock_duration.as_secs_f64(),
            "Seat registry initialised"
        );

        Ok(Self {
            inner: Arc::new(RegistryInner {
                seats,
                lock_duration: config.lock_duration,
                scheduler,
                events,
            }),
        })
    }

    pub fn seat_count(&self) -> u32 {
        self.inner.seats.len() as u32
    }

    pub fn lock_duration(&self) -> Duration {
        self.inner.lock_duration
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SeatChangedEvent> {
        self.inner.events.subscribe()
    }

    /// Locks an available seat for `holder` using the configured duration.
    pub fn lock(&self, seat: SeatId, holder: &HolderId) -> SeatResult<SeatView> {
        self.lock_for(seat, holder, self.inner.lock_duration)
    }

    /// Locks an available seat for `holder` for `duration`.
    ///
    /// Fails with `AlreadyLocked` whenever the seat is locked, including by
    /// the same holder; locks are never refreshed.
    pub fn lock_for(&self, seat: SeatId, holder: &HolderId, duration: Duration) -> SeatResult<SeatView> {
        if duration.is_zero() {
            return Err(SeatError::InvalidInput("lock duration must be positive".to_string()));
        }
        let expires_at = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| SeatError::InvalidInput("lock duration is out of range".to_string()))?;

        let slot = self.inner.slot(seat)?;
        let mut state = guard(slot);

        match *state {
            SeatState::Booked => {
                debug!(seat = %seat, holder = %Masked(holder.as_str()), "Lock rejected: seat booked");
                return Err(SeatError::AlreadyBooked(seat));
            }
            SeatState::Locked(_) => {
                debug!(seat = %seat, holder = %Masked(holder.as_str()), "Lock rejected: seat locked");
                return Err(SeatError::AlreadyLocked(seat));
            }
            SeatState::Available => {}
        }

        let lock_id = Uuid::new_v4();
        let registry = Arc::downgrade(&self.inner);
        let timer = self.inner.scheduler.schedule(
            duration,
            Box::new(move || {
                if let Some(inner) = registry.upgrade() {
                    inner.expire(seat, lock_id);
                }
            }),
        );

        *state = SeatState::Locked(SeatLock {
            id: lock_id,
            holder: holder.clone(),
            expires_at,
            timer,
        });
        let view = state.view(seat);
        drop(state);

        info!(seat = %seat, holder = %Masked(holder.as_str()), %lock_id, "Seat locked");
        self.inner.publish(
            SeatChangedEvent::new(seat.get(), view.status.to_string(), SeatChangeReason::Locked)
                .with_holder(holder.as_str())
                .with_expiry(expires_at.timestamp_millis()),
        );

        Ok(view)
    }

    /// Turns the holder's lock into a permanent booking.
    pub fn confirm(&self, seat: SeatId, holder: &HolderId) -> SeatResult<SeatView> {
        let slot = self.inner.slot(seat)?;
        let mut state = guard(slot);

        let lock = take_owned_lock(&mut state, seat, holder, SeatError::AlreadyBooked(seat))
            .inspect_err(|e| debug!(seat = %seat, holder = %Masked(holder.as_str()), "Confirm rejected: {}", e))?;
        *state = SeatState::Booked;
        drop(state);

        lock.timer.cancel();

        info!(seat = %seat, holder = %Masked(holder.as_str()), lock_id = %lock.id, "Seat booked");
        self.inner.publish(
            SeatChangedEvent::new(seat.get(), "booked", SeatChangeReason::Confirmed).with_holder(holder.as_str()),
        );

        Ok(SeatView::booked(seat))
    }

    /// Releases the holder's lock, making the seat available again.
    pub fn unlock(&self, seat: SeatId, holder: &HolderId) -> SeatResult<()> {
        let slot = self.inner.slot(seat)?;
        let mut state = guard(slot);

        // A booked seat has no lock to release.
        let lock = take_owned_lock(&mut state, seat, holder, SeatError::NotLocked(seat))
            .inspect_err(|e| debug!(seat = %seat, holder = %Masked(holder.as_str()), "Unlock rejected: {}", e))?;
        drop(state);

        lock.timer.cancel();

        info!(seat = %seat, holder = %Masked(holder.as_str()), lock_id = %lock.id, "Seat unlocked");
        self.inner.publish(SeatChangedEvent::new(seat.get(), "available", SeatChangeReason::Unlocked));

        Ok(())
    }

    pub fn get(&self, seat: SeatId) -> SeatResult<SeatView> {
        let slot = self.inner.slot(seat)?;
        let view = guard(slot).view(seat);
        Ok(view)
    }

    /// Views every seat. Each seat is read under its own guard, one at a time.
    pub fn snapshot(&self) -> Snapshot {
        let seats = self
            .inner
            .seats
            .iter()
            .zip(1..)
            .map(|(slot, id)| {
                let id = SeatId::new(id);
                (id, guard(slot).view(id))
            })
            .collect();

        Snapshot {
            seats,
            server_time: Utc::now(),
        }
    }
}

impl RegistryInner {
    fn slot(&self, seat: SeatId) -> SeatResult<&Mutex<SeatState>> {
        (seat.get() as usize)
            .checked_sub(1)
            .and_then(|index| self.seats.get(index))
            .ok_or_else(|| SeatError::NotFound(seat.to_string()))
    }

    /// Timer callback for lock `lock_id` on `seat`.
    fn expire(&self, seat: SeatId, lock_id: Uuid) {
        let Ok(slot) = self.slot(seat) else {
            return;
        };
        let mut state = guard(slot);

        if !matches!(&*state, SeatState::Locked(lock) if lock.id == lock_id) {
            drop(state);
            debug!(seat = %seat, %lock_id, "Stale expiry ignored");
            return;
        }

        // The timer for this lock is the one running now, so there is
        // nothing to cancel.
        let previous = std::mem::replace(&mut *state, SeatState::Available);
        drop(state);

        if let SeatState::Locked(lock) = previous {
            info!(seat = %seat, holder = %Masked(lock.holder.as_str()), %lock_id, "Seat lock expired");
        }
        self.publish(SeatChangedEvent::new(seat.get(), "available", SeatChangeReason::Expired));
    }

    fn publish(&self, event: SeatChangedEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        for slot in &mut self.seats {
            let state = slot.get_mut().unwrap_or_else(PoisonError::into_inner);
            if let SeatState::Locked(_) = state {
                if let SeatState::Locked(lock) = std::mem::replace(state, SeatState::Available) {
                    lock.timer.cancel();
                }
            }
        }
    }
}

fn guard(slot: &Mutex<SeatState>) -> MutexGuard<'_, SeatState> {
    // Transitions are single assignments, so a poisoned seat is still consistent.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Takes the lock out of `state` if `holder` owns it. Otherwise the state is
/// left as it was and the reason is returned; `booked` is the error reported
/// for a booked seat.
fn take_owned_lock(
    state: &mut SeatState,
    seat: SeatId,
    holder: &HolderId,
    booked: SeatError,
) -> SeatResult<SeatLock> {
    match std::mem::replace(state, SeatState::Available) {
        SeatState::Locked(lock) if lock.holder == *holder => Ok(lock),
        other => {
            let err = match &other {
                SeatState::Available => SeatError::NotLocked(seat),
                SeatState::Booked => booked,
                SeatState::Locked(_) => SeatError::NotLockOwner(seat),
            };
            *state = other;
            Err(err)
        }
    }
}
