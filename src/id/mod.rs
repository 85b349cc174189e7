//! TUID-style event identifiers.
//!
//! A TUID packs a wall-clock timestamp, truncated to a centisecond
//! interval, into the high bits and 16 bits of random noise into the low
//! bits. IDs therefore sort by creation time and double as the sort score
//! in the event history collection.
//!
//! Guarantees: monotonically non-decreasing across calls separated by more
//! than one interval; collision probability bounded by the noise width
//! (~65k distinct IDs per interval). Callers must not assume IDs are
//! contiguous or gap-free.

use std::time::SystemTime;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::TUID_INTERVAL_MILLIS;
use crate::constants::TUID_NOISE_BITS;
use crate::utils::time;

/// Produce a fresh event id for the current wall-clock interval.
pub fn generate() -> i64 {
    let interval = time::now_millis() / TUID_INTERVAL_MILLIS;
    (interval << TUID_NOISE_BITS) | noise()
}

fn noise() -> i64 {
    let mask = (1u32 << TUID_NOISE_BITS) - 1;
    (OsRng.next_u32() & mask) as i64
}

/// Inverse of [`generate`]: the id's creation time in epoch milliseconds,
/// truncated to the id interval.
pub fn timestamp_millis(id: i64) -> i64 {
    (id >> TUID_NOISE_BITS) * TUID_INTERVAL_MILLIS
}

/// The id's creation time as wall-clock time.
pub fn timestamp(id: i64) -> SystemTime {
    time::millis_to_system_time(timestamp_millis(id))
}
