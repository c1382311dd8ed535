//! Staff accounts, one table per role.
//!
//! The fields every staff account shares live in [`Collaborator`], which is
//! generic over a zero-sized [`Role`] marker. Each role has its own table and
//! its own permission-grant table; a manager's grants are separate rows from
//! a sales rep's even when they reference the same permission.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator as _};

use crate::{
  Error, Result,
  id::{Entity, Id},
  password::{PasswordHash, PasswordParams},
};

// ─── Roles ───────────────────────────────────────────────────────────────────

mod private {
  pub trait Sealed {}
}

/// Runtime name of a role, for callers that pick the role from input.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoleKind {
  Sales,
  Support,
  Manager,
}

impl FromStr for RoleKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::iter()
      .find(|kind| kind.as_ref() == s)
      .ok_or_else(|| Error::UnknownRole(s.to_owned()))
  }
}

/// Compile-time role marker. Sealed: the three roles are the whole set.
pub trait Role:
  private::Sealed + Copy + Default + Eq + fmt::Debug + Send + Sync + 'static
{
  const KIND: RoleKind;
  /// Table holding accounts of this role.
  const TABLE: &'static str;
  /// Link table recording this role's permission grants.
  const GRANT_TABLE: &'static str;
  /// Column of [`Role::GRANT_TABLE`] referencing [`Role::TABLE`].
  const GRANT_COLUMN: &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Sales;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Support;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Management;

impl private::Sealed for Sales {}
impl private::Sealed for Support {}
impl private::Sealed for Management {}

impl Role for Sales {
  const KIND: RoleKind = RoleKind::Sales;
  const TABLE: &'static str = "sales_rep";
  const GRANT_TABLE: &'static str = "sales_permission";
  const GRANT_COLUMN: &'static str = "sales_rep_id";
}

impl Role for Support {
  const KIND: RoleKind = RoleKind::Support;
  const TABLE: &'static str = "support_rep";
  const GRANT_TABLE: &'static str = "support_permission";
  const GRANT_COLUMN: &'static str = "support_rep_id";
}

impl Role for Management {
  const KIND: RoleKind = RoleKind::Manager;
  const TABLE: &'static str = "manager";
  const GRANT_TABLE: &'static str = "manager_permission";
  const GRANT_COLUMN: &'static str = "manager_id";
}

// ─── Accounts ────────────────────────────────────────────────────────────────

pub type CollaboratorId<R> = Id<Collaborator<R>>;

/// Owns contracts and may be the assigned rep on customers.
pub type SalesRep = Collaborator<Sales>;
/// Assigned to events.
pub type SupportRep = Collaborator<Support>;
/// Holds permissions only.
pub type Manager = Collaborator<Management>;

pub type SalesRepId = CollaboratorId<Sales>;
pub type SupportRepId = CollaboratorId<Support>;
pub type ManagerId = CollaboratorId<Management>;

/// A staff account. The password is held only as a hash, and there is no way
/// to read it back:
///
/// ```compile_fail
/// # use crm_core::collaborator::SalesRep;
/// fn leak(rep: &SalesRep) -> String { rep.password() }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound = "")]
pub struct Collaborator<R: Role> {
  pub id:    CollaboratorId<R>,
  pub name:  String,
  pub email: String,
  #[serde(skip)]
  password:  PasswordHash,
  #[serde(skip)]
  _role:     R,
}

impl<R: Role> Entity for Collaborator<R> {
  const TABLE: &'static str = R::TABLE;
}

impl<R: Role> Collaborator<R> {
  pub fn new(
    id: CollaboratorId<R>,
    name: String,
    email: String,
    password: PasswordHash,
  ) -> Self {
    Self { id, name, email, password, _role: R::default() }
  }

  pub fn role(&self) -> RoleKind { R::KIND }

  /// The stored hash, for persistence. Never the plaintext.
  pub fn password_hash(&self) -> &PasswordHash { &self.password }

  /// Replace the stored hash with one computed from `plaintext`.
  pub fn set_password(&mut self, plaintext: &str, params: &PasswordParams) -> Result<()> {
    self.password = PasswordHash::generate(plaintext, params)?;
    Ok(())
  }

  /// Replace the stored hash with one computed elsewhere (e.g. off-thread).
  pub fn set_password_hash(&mut self, hash: PasswordHash) { self.password = hash; }

  pub fn verify_password(&self, candidate: &str) -> Result<bool> {
    self.password.verify(candidate)
  }
}

/// Input to [`crate::store::CrmStore::add_collaborator`].
#[derive(Clone)]
pub struct NewCollaborator {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

impl NewCollaborator {
  pub fn new(
    name: impl Into<String>,
    email: impl Into<String>,
    password: impl Into<String>,
  ) -> Self {
    Self { name: name.into(), email: email.into(), password: password.into() }
  }
}

impl fmt::Debug for NewCollaborator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NewCollaborator")
      .field("name", &self.name)
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .finish()
  }
}
