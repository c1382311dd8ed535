//! Customers, optionally attached to a company and a sales rep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  collaborator::SalesRepId,
  company::CompanyId,
  id::{Entity, Id},
  timestamp,
};

pub type CustomerId = Id<Customer>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
  pub id:           CustomerId,
  pub name:         String,
  pub email:        String,
  pub phone:        String,
  /// Free-text notes about the customer.
  pub informations: String,
  pub company_id:   Option<CompanyId>,
  pub sales_rep_id: Option<SalesRepId>,
  pub created_on:   DateTime<Utc>,
  pub updated_on:   DateTime<Utc>,
}

impl Entity for Customer {
  const TABLE: &'static str = "customer";
}

impl Customer {
  /// Returns whether anything changed; re-assigning the same rep is a no-op.
  pub fn assign_sales_rep(&mut self, sales_rep_id: Option<SalesRepId>) -> bool {
    if self.sales_rep_id == sales_rep_id {
      return false;
    }
    self.sales_rep_id = sales_rep_id;
    self.touch();
    true
  }

  pub fn set_company(&mut self, company_id: Option<CompanyId>) -> bool {
    if self.company_id == company_id {
      return false;
    }
    self.company_id = company_id;
    self.touch();
    true
  }

  /// Apply the fields present in `update`.
  pub fn apply(&mut self, update: CustomerUpdate) -> bool {
    let mut changed = false;
    for (field, value) in [
      (&mut self.name, update.name),
      (&mut self.email, update.email),
      (&mut self.phone, update.phone),
      (&mut self.informations, update.informations),
    ] {
      if let Some(value) = value
        && *field != value
      {
        *field = value;
        changed = true;
      }
    }
    if changed {
      self.touch();
    }
    changed
  }

  fn touch(&mut self) { self.updated_on = timestamp::after(self.updated_on); }
}

/// Input to [`crate::store::CrmStore::add_customer`].
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
  pub name:         String,
  pub email:        String,
  pub phone:        String,
  pub informations: String,
  pub company_id:   Option<CompanyId>,
  pub sales_rep_id: Option<SalesRepId>,
}

impl NewCustomer {
  pub fn new(
    name: impl Into<String>,
    email: impl Into<String>,
    phone: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      email: email.into(),
      phone: phone.into(),
      ..Self::default()
    }
  }

  pub fn into_customer(self, id: CustomerId, now: DateTime<Utc>) -> Customer {
    Customer {
      id,
      name: self.name,
      email: self.email,
      phone: self.phone,
      informations: self.informations,
      company_id: self.company_id,
      sales_rep_id: self.sales_rep_id,
      created_on: now,
      updated_on: now,
    }
  }
}

/// Contact-detail changes; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
  pub name:         Option<String>,
  pub email:        Option<String>,
  pub phone:        Option<String>,
  pub informations: Option<String>,
}
