//! Write-path timestamps.
//!
//! `created_on`/`updated_on` are never filled in by the storage layer; every
//! constructor and mutator sets them explicitly through these helpers.

use chrono::{DateTime, TimeDelta, Utc};

pub fn now() -> DateTime<Utc> { Utc::now() }

/// A timestamp strictly later than `previous`, normally the current time.
///
/// Guards against two writes landing on the same clock tick (or a clock that
/// stepped backwards) leaving `updated_on` unchanged.
pub fn after(previous: DateTime<Utc>) -> DateTime<Utc> {
  let now = Utc::now();
  if now > previous {
    now
  } else {
    previous + TimeDelta::microseconds(1)
  }
}
