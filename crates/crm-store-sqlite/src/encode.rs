//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (nanosecond
//! precision, `Z` suffix) so that text order is time order. Money is stored as
//! canonical decimal text with two fractional digits. Contract status is the
//! lowercase variant name.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use crm_core::{
  Entity, Id,
  collaborator::{Collaborator, Role},
  company::Company,
  contract::{Contract, ContractStatus},
  customer::Customer,
  event::{Event, attendee_count},
  money::Amount,
  password::PasswordHash,
  permission::Permission,
};
use rust_decimal::Decimal;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_amount(amount: Amount) -> String { amount.to_string() }

pub fn decode_amount(s: &str) -> Result<Amount> {
  let value = Decimal::from_str(s)?;
  Ok(Amount::new(value)?)
}

/// The same lowercase name `ContractStatus::from_str` accepts.
pub fn encode_status(status: ContractStatus) -> &'static str { status.into() }

pub fn decode_status(s: &str) -> Result<ContractStatus> { Ok(s.parse()?) }

pub fn opt_id<T>(id: Option<Id<T>>) -> Option<i64> { id.map(Id::get) }

// ─── Row decoding ────────────────────────────────────────────────────────────

/// An entity that can be read back from its table.
pub trait Stored: Entity + Sized {
  /// Column list in the order `decode` expects; used verbatim in `SELECT`.
  const COLUMNS: &'static str;

  fn decode(row: &rusqlite::Row<'_>) -> Result<Self>;
}

fn text(row: &rusqlite::Row<'_>, column: &str) -> Result<String> { Ok(row.get(column)?) }

fn id<T>(row: &rusqlite::Row<'_>, column: &str) -> Result<Id<T>> {
  Ok(Id::new(row.get::<_, i64>(column)?))
}

fn opt<T>(row: &rusqlite::Row<'_>, column: &str) -> Result<Option<Id<T>>> {
  Ok(row.get::<_, Option<i64>>(column)?.map(Id::new))
}

fn timestamp(row: &rusqlite::Row<'_>, column: &str) -> Result<DateTime<Utc>> {
  decode_dt(&text(row, column)?)
}

impl Stored for Permission {
  const COLUMNS: &'static str = "id, description";

  fn decode(row: &rusqlite::Row<'_>) -> Result<Self> {
    Ok(Self { id: id(row, "id")?, description: text(row, "description")? })
  }
}

impl<R: Role> Stored for Collaborator<R> {
  const COLUMNS: &'static str = "id, name, email, password_hash";

  fn decode(row: &rusqlite::Row<'_>) -> Result<Self> {
    Ok(Collaborator::new(
      id(row, "id")?,
      text(row, "name")?,
      text(row, "email")?,
      PasswordHash::from_stored(text(row, "password_hash")?),
    ))
  }
}

impl Stored for Company {
  const COLUMNS: &'static str = "id, name";

  fn decode(row: &rusqlite::Row<'_>) -> Result<Self> {
    Ok(Self { id: id(row, "id")?, name: text(row, "name")? })
  }
}

impl Stored for Customer {
  const COLUMNS: &'static str = "id, name, email, phone, informations, company_id, \
                                 sales_rep_id, created_on, updated_on";

  fn decode(row: &rusqlite::Row<'_>) -> Result<Self> {
    Ok(Self {
      id:           id(row, "id")?,
      name:         text(row, "name")?,
      email:        text(row, "email")?,
      phone:        text(row, "phone")?,
      informations: text(row, "informations")?,
      company_id:   opt(row, "company_id")?,
      sales_rep_id: opt(row, "sales_rep_id")?,
      created_on:   timestamp(row, "created_on")?,
      updated_on:   timestamp(row, "updated_on")?,
    })
  }
}

impl Stored for Contract {
  const COLUMNS: &'static str = "id, status, customer_id, sales_rep_id, event_id, \
                                 total_value, remaining_balance, created_on, updated_on";

  fn decode(row: &rusqlite::Row<'_>) -> Result<Self> {
    Ok(Self {
      id:                id(row, "id")?,
      status:            decode_status(&text(row, "status")?)?,
      customer_id:       id(row, "customer_id")?,
      sales_rep_id:      id(row, "sales_rep_id")?,
      event_id:          opt(row, "event_id")?,
      total_value:       decode_amount(&text(row, "total_value")?)?,
      remaining_balance: decode_amount(&text(row, "remaining_balance")?)?,
      created_on:        timestamp(row, "created_on")?,
      updated_on:        timestamp(row, "updated_on")?,
    })
  }
}

impl Stored for Event {
  const COLUMNS: &'static str = "id, start_date, end_date, location, attendees, notes, \
                                 contract_id, support_rep_id, created_on, updated_on";

  fn decode(row: &rusqlite::Row<'_>) -> Result<Self> {
    Ok(Self {
      id:             id(row, "id")?,
      start_date:     timestamp(row, "start_date")?,
      end_date:       timestamp(row, "end_date")?,
      location:       text(row, "location")?,
      attendees:      attendee_count(row.get("attendees")?)?,
      notes:          text(row, "notes")?,
      contract_id:    id(row, "contract_id")?,
      support_rep_id: opt(row, "support_rep_id")?,
      created_on:     timestamp(row, "created_on")?,
      updated_on:     timestamp(row, "updated_on")?,
    })
  }
}
