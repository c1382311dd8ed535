//! One-way password storage for collaborator accounts.
//!
//! Only an argon2 PHC string is ever kept. There is no accessor that yields
//! the plaintext, so reading a password back is impossible rather than
//! merely refused:
//!
//! ```compile_fail
//! # use crm_core::password::PasswordHash;
//! fn plaintext(hash: &PasswordHash) -> String { hash.plaintext() }
//! ```

use std::fmt;

use argon2::{
  Algorithm, Argon2, Params, PasswordHash as PhcString, PasswordHasher,
  PasswordVerifier, Version,
  password_hash::{self, SaltString},
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Work factor ─────────────────────────────────────────────────────────────

/// Argon2id cost parameters used when a new hash is produced.
///
/// Verification always uses the parameters recorded inside the stored hash,
/// so raising these only affects passwords set afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordParams {
  pub memory_kib:  u32,
  pub iterations:  u32,
  pub parallelism: u32,
}

impl Default for PasswordParams {
  fn default() -> Self {
    Self {
      memory_kib:  Params::DEFAULT_M_COST,
      iterations:  Params::DEFAULT_T_COST,
      parallelism: Params::DEFAULT_P_COST,
    }
  }
}

impl PasswordParams {
  fn hasher(&self) -> Result<Argon2<'static>> {
    let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
      .map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
  }
}

// ─── Hash ────────────────────────────────────────────────────────────────────

/// A salted argon2 hash in PHC string form, e.g. `$argon2id$v=19$…`.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
  /// Hash `plaintext` with a fresh random salt.
  pub fn generate(plaintext: &str, params: &PasswordParams) -> Result<Self> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
      .hasher()?
      .hash_password(plaintext.as_bytes(), &salt)
      .map_err(|e| Error::PasswordHash(e.to_string()))?
      .to_string();
    Ok(Self(hash))
  }

  /// Wrap a PHC string read back from storage. Not validated here; a
  /// malformed value surfaces as an error from [`PasswordHash::verify`].
  pub fn from_stored(phc: impl Into<String>) -> Self { Self(phc.into()) }

  /// The PHC string, for persistence.
  pub fn as_phc(&self) -> &str { &self.0 }

  /// Check a candidate password against this hash.
  ///
  /// A mismatch is `Ok(false)`; only an unparseable stored hash is an error.
  pub fn verify(&self, candidate: &str) -> Result<bool> {
    let parsed =
      PhcString::new(&self.0).map_err(|e| Error::PasswordHash(e.to_string()))?;

    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
      Ok(()) => Ok(true),
      Err(password_hash::Error::Password) => Ok(false),
      Err(e) => Err(Error::PasswordHash(e.to_string())),
    }
  }
}

impl fmt::Debug for PasswordHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("PasswordHash(<redacted>)")
  }
}
