//! Permission catalog entries.
//!
//! Permissions are seeded administratively and never mutated afterwards.
//! Which collaborator holds which permission is recorded per role; see
//! [`crate::collaborator::Role::GRANT_TABLE`].

use serde::{Deserialize, Serialize};

use crate::id::{Entity, Id};

pub type PermissionId = Id<Permission>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
  pub id:          PermissionId,
  pub description: String,
}

impl Entity for Permission {
  const TABLE: &'static str = "permission";
}
