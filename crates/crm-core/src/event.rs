//! Events organised for a contract and staffed by a support rep.

use chrono::{DateTime, Datelike as _, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  collaborator::SupportRepId,
  contract::ContractId,
  id::{Entity, Id},
  timestamp,
};

pub type EventId = Id<Event>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub id:             EventId,
  pub start_date:     DateTime<Utc>,
  pub end_date:       DateTime<Utc>,
  pub location:       String,
  pub attendees:      u32,
  pub notes:          String,
  pub contract_id:    ContractId,
  /// Unassigned until a support rep is allocated.
  pub support_rep_id: Option<SupportRepId>,
  pub created_on:     DateTime<Utc>,
  pub updated_on:     DateTime<Utc>,
}

impl Entity for Event {
  const TABLE: &'static str = "event";
}

/// Years representable as four-digit RFC 3339 text.
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// `start <= end`, both within years 0000 to 9999.
pub fn check_schedule(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
  for date in [start, end] {
    if !YEARS.contains(&date.year()) {
      return Err(Error::Validation(format!(
        "event date {date} is outside years 0000-9999"
      )));
    }
  }
  if end < start {
    return Err(Error::Validation(format!(
      "event ends ({end}) before it starts ({start})"
    )));
  }
  Ok(())
}

/// Convert an attendee count from signed input (CLI arguments, SQL integers).
pub fn attendee_count(raw: i64) -> Result<u32> {
  u32::try_from(raw).map_err(|_| {
    if raw < 0 {
      Error::Validation(format!("attendee count {raw} is negative"))
    } else {
      Error::Validation(format!("attendee count {raw} is too large"))
    }
  })
}

impl Event {
  /// Returns whether anything changed; re-assigning the same rep is a no-op.
  pub fn assign_support_rep(&mut self, support_rep_id: Option<SupportRepId>) -> bool {
    if self.support_rep_id == support_rep_id {
      return false;
    }
    self.support_rep_id = support_rep_id;
    self.touch();
    true
  }

  pub fn reschedule(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    check_schedule(start, end)?;
    self.start_date = start;
    self.end_date = end;
    self.touch();
    Ok(())
  }

  pub fn apply(&mut self, details: EventDetails) -> bool {
    let mut changed = false;
    if let Some(location) = details.location
      && location != self.location
    {
      self.location = location;
      changed = true;
    }
    if let Some(attendees) = details.attendees
      && attendees != self.attendees
    {
      self.attendees = attendees;
      changed = true;
    }
    if let Some(notes) = details.notes
      && notes != self.notes
    {
      self.notes = notes;
      changed = true;
    }
    if changed {
      self.touch();
    }
    changed
  }

  fn touch(&mut self) { self.updated_on = timestamp::after(self.updated_on); }
}

/// Input to [`crate::store::CrmStore::add_event`].
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub contract_id:    ContractId,
  pub start_date:     DateTime<Utc>,
  pub end_date:       DateTime<Utc>,
  pub location:       String,
  pub attendees:      u32,
  pub notes:          String,
  pub support_rep_id: Option<SupportRepId>,
}

impl NewEvent {
  pub fn validate(&self) -> Result<()> { check_schedule(self.start_date, self.end_date) }

  pub fn into_event(self, id: EventId, now: DateTime<Utc>) -> Event {
    Event {
      id,
      start_date: self.start_date,
      end_date: self.end_date,
      location: self.location,
      attendees: self.attendees,
      notes: self.notes,
      contract_id: self.contract_id,
      support_rep_id: self.support_rep_id,
      created_on: now,
      updated_on: now,
    }
  }
}

/// Descriptive changes; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct EventDetails {
  pub location:  Option<String>,
  pub attendees: Option<u32>,
  pub notes:     Option<String>,
}
