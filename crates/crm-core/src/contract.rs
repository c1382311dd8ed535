//! Contracts and their status lifecycle.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator as _, IntoStaticStr};

use crate::{
  Error, Result,
  collaborator::SalesRepId,
  customer::CustomerId,
  event::EventId,
  id::{Entity, Id},
  money::Amount,
  timestamp,
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Closed set of contract states. Stored as the lowercase name.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  Display, AsRefStr, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContractStatus {
  #[default]
  Draft,
  Signed,
  Canceled,
}

impl ContractStatus {
  /// The sanctioned transitions: `draft → signed`, `signed → canceled` and
  /// `draft → canceled`. Nothing leaves `canceled`.
  pub fn can_transition_to(self, to: Self) -> bool {
    matches!(
      (self, to),
      (Self::Draft, Self::Signed)
        | (Self::Signed, Self::Canceled)
        | (Self::Draft, Self::Canceled)
    )
  }

  pub fn is_terminal(self) -> bool { self == Self::Canceled }
}

impl FromStr for ContractStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::iter()
      .find(|status| status.as_ref() == s)
      .ok_or_else(|| Error::UnknownContractStatus(s.to_owned()))
  }
}

// ─── Contract ────────────────────────────────────────────────────────────────

pub type ContractId = Id<Contract>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
  pub id:                ContractId,
  pub status:            ContractStatus,
  pub customer_id:       CustomerId,
  pub sales_rep_id:      SalesRepId,
  pub event_id:          Option<EventId>,
  pub total_value:       Amount,
  pub remaining_balance: Amount,
  pub created_on:        DateTime<Utc>,
  pub updated_on:        DateTime<Utc>,
}

impl Entity for Contract {
  const TABLE: &'static str = "contract";
}

impl Contract {
  /// Move to `to` if the transition is sanctioned.
  pub fn transition(&mut self, to: ContractStatus) -> Result<()> {
    if !self.status.can_transition_to(to) {
      return Err(Error::InvalidStateTransition { from: self.status, to });
    }
    self.status = to;
    self.touch();
    Ok(())
  }

  /// Returns whether anything changed; re-assigning the same rep is a no-op.
  pub fn assign_sales_rep(&mut self, sales_rep_id: SalesRepId) -> bool {
    if self.sales_rep_id == sales_rep_id {
      return false;
    }
    self.sales_rep_id = sales_rep_id;
    self.touch();
    true
  }

  pub fn link_event(&mut self, event_id: Option<EventId>) -> bool {
    if self.event_id == event_id {
      return false;
    }
    self.event_id = event_id;
    self.touch();
    true
  }

  /// Reduce the remaining balance by `amount`.
  pub fn record_payment(&mut self, amount: Amount) -> Result<()> {
    if self.status.is_terminal() {
      return Err(Error::Validation(format!(
        "contract {} is {}; payments are not accepted",
        self.id, self.status
      )));
    }
    self.remaining_balance =
      self.remaining_balance.checked_sub(amount).ok_or_else(|| {
        Error::Validation(format!(
          "payment {amount} exceeds remaining balance {}",
          self.remaining_balance
        ))
      })?;
    self.touch();
    Ok(())
  }

  fn touch(&mut self) { self.updated_on = timestamp::after(self.updated_on); }
}

/// Input to [`crate::store::CrmStore::add_contract`].
#[derive(Debug, Clone)]
pub struct NewContract {
  pub customer_id:       CustomerId,
  pub sales_rep_id:      SalesRepId,
  pub status:            ContractStatus,
  pub total_value:       Amount,
  pub remaining_balance: Amount,
}

impl NewContract {
  /// A draft contract with nothing paid yet.
  pub fn new(customer_id: CustomerId, sales_rep_id: SalesRepId, total_value: Amount) -> Self {
    Self {
      customer_id,
      sales_rep_id,
      status: ContractStatus::Draft,
      total_value,
      remaining_balance: total_value,
    }
  }

  /// Field-level checks; foreign keys are resolved by the store.
  pub fn validate(&self) -> Result<()> {
    if self.status == ContractStatus::Canceled {
      return Err(Error::Validation(
        "a contract cannot be created already canceled".into(),
      ));
    }
    if self.remaining_balance > self.total_value {
      return Err(Error::Validation(format!(
        "remaining balance {} exceeds total value {}",
        self.remaining_balance, self.total_value
      )));
    }
    Ok(())
  }

  pub fn into_contract(self, id: ContractId, now: DateTime<Utc>) -> Contract {
    Contract {
      id,
      status: self.status,
      customer_id: self.customer_id,
      sales_rep_id: self.sales_rep_id,
      event_id: None,
      total_value: self.total_value,
      remaining_balance: self.remaining_balance,
      created_on: now,
      updated_on: now,
    }
  }
}
