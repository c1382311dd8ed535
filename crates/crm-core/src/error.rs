//! Error types for `crm-core`.

use thiserror::Error;

use crate::{
  contract::ContractStatus,
  id::{Entity, Id},
};

#[derive(Debug, Error)]
pub enum Error {
  /// A foreign key (or a permission grant) points at a row that does not
  /// exist.
  #[error("referential integrity: no {entity} with id {id}")]
  UnresolvedReference { entity: &'static str, id: i64 },

  /// A delete was refused because required dependents still point at the row.
  #[error("referential integrity: {entity} {id} is still referenced by {dependent}")]
  StillReferenced {
    entity:    &'static str,
    id:        i64,
    dependent: &'static str,
  },

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: i64 },

  #[error("invalid contract status transition: {from} -> {to}")]
  InvalidStateTransition {
    from: ContractStatus,
    to:   ContractStatus,
  },

  #[error("unknown contract status: {0:?}")]
  UnknownContractStatus(String),

  #[error("unknown collaborator role: {0:?}")]
  UnknownRole(String),

  #[error("validation error: {0}")]
  Validation(String),

  /// Hashing failed, or a stored hash could not be parsed.
  #[error("password hash error: {0}")]
  PasswordHash(String),
}

impl Error {
  pub fn unresolved<T: Entity>(id: Id<T>) -> Self {
    Self::UnresolvedReference { entity: T::TABLE, id: id.get() }
  }

  pub fn not_found<T: Entity>(id: Id<T>) -> Self {
    Self::NotFound { entity: T::TABLE, id: id.get() }
  }

  pub fn still_referenced<T: Entity>(id: Id<T>, dependent: &'static str) -> Self {
    Self::StillReferenced { entity: T::TABLE, id: id.get(), dependent }
  }

  /// True for both flavours of referential-integrity failure.
  pub fn is_referential(&self) -> bool {
    matches!(
      self,
      Self::UnresolvedReference { .. } | Self::StillReferenced { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
