//! Typed integer surrogate keys.
//!
//! Every table uses an `INTEGER PRIMARY KEY`. [`Id`] tags that integer with
//! the entity it belongs to, so a sales rep's id cannot be handed to an
//! operation expecting a support rep.

use std::{
  cmp::Ordering,
  fmt,
  hash::{Hash, Hasher},
  marker::PhantomData,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A persisted entity with its own table.
pub trait Entity {
  /// Table name; also used to name the entity in error messages.
  const TABLE: &'static str;
}

/// The primary key of a `T` row.
pub struct Id<T> {
  raw:     i64,
  _entity: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
  pub const fn new(raw: i64) -> Self { Self { raw, _entity: PhantomData } }

  pub const fn get(self) -> i64 { self.raw }
}

impl<T> Clone for Id<T> {
  fn clone(&self) -> Self { *self }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
  fn eq(&self, other: &Self) -> bool { self.raw == other.raw }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl<T> Ord for Id<T> {
  fn cmp(&self, other: &Self) -> Ordering { self.raw.cmp(&other.raw) }
}

impl<T> Hash for Id<T> {
  fn hash<H: Hasher>(&self, state: &mut H) { self.raw.hash(state) }
}

impl<T> fmt::Debug for Id<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Id({})", self.raw)
  }
}

impl<T> fmt::Display for Id<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.raw, f) }
}

impl<T> From<i64> for Id<T> {
  fn from(raw: i64) -> Self { Self::new(raw) }
}

impl<T> Serialize for Id<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(self.raw)
  }
}

impl<'de, T> Deserialize<'de> for Id<T> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    i64::deserialize(deserializer).map(Self::new)
  }
}
