//! Companies group customers under one organisation.

use serde::{Deserialize, Serialize};

use crate::id::{Entity, Id};

pub type CompanyId = Id<Company>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
  pub id:   CompanyId,
  pub name: String,
}

impl Entity for Company {
  const TABLE: &'static str = "company";
}
