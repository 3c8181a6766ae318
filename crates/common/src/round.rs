//! Round arithmetic
//!
//! Converts between wall-clock time and beacon rounds. The caller's clock is never
//! reconciled with the beacon's, so an unlock lands within one period of the requested
//! instant, in either direction.

use chrono::{DateTime, Duration, Utc};

/// The round a message must target to stay locked until `unlock_time`
///
/// Counts whole periods from now on top of the beacon's current round. See
/// [`round_for_unlock_time_at`].
pub fn round_for_unlock_time(
    unlock_time: DateTime<Utc>,
    beacon_round: u64,
    beacon_period_seconds: u32,
) -> u64 {
    round_for_unlock_time_at(unlock_time, Utc::now(), beacon_round, beacon_period_seconds)
}

/// [`round_for_unlock_time`] with an explicit `now`
///
/// `beacon_round + ceil((unlock_time - now) / period)`, and never less than `beacon_round`.
pub fn round_for_unlock_time_at(
    unlock_time: DateTime<Utc>,
    now: DateTime<Utc>,
    beacon_round: u64,
    beacon_period_seconds: u32,
) -> u64 {
    if unlock_time <= now {
        return beacon_round;
    }

    let period_ms = i64::from(beacon_period_seconds.max(1)) * 1000;
    // sub-millisecond remainders still need one more round
    let remaining_ms = (unlock_time - now).num_milliseconds().max(1);
    let rounds = (remaining_ms + period_ms - 1) / period_ms;

    beacon_round.saturating_add(rounds as u64)
}

/// Whether `round` has been published, given the beacon's `current_round`
pub fn is_round_available(round: u64, current_round: u64) -> bool {
    current_round >= round
}

/// The round current at `time` for a chain started at `genesis`
///
/// Round 1 is emitted at genesis; before genesis there is no round, reported as 0.
pub fn round_at(time: DateTime<Utc>, genesis: DateTime<Utc>, period_seconds: u32) -> u64 {
    if time < genesis {
        return 0;
    }
    let elapsed = (time - genesis).num_seconds();
    (elapsed / i64::from(period_seconds.max(1))) as u64 + 1
}

/// When `round` is emitted for a chain started at `genesis`
///
/// Returns `None` if the instant is not representable.
pub fn time_of_round(
    round: u64,
    genesis: DateTime<Utc>,
    period_seconds: u32,
) -> Option<DateTime<Utc>> {
    let offset = round
        .saturating_sub(1)
        .checked_mul(u64::from(period_seconds))?;
    let offset = Duration::try_seconds(i64::try_from(offset).ok()?)?;
    genesis.checked_add_signed(offset)
}
