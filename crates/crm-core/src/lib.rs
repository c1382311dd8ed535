//! Core types and trait definitions for the CRM data model.
//!
//! This crate holds the entities, their value objects and lifecycle rules,
//! and the [`store::CrmStore`] abstraction. It is free of any database
//! dependency; storage backends (e.g. `crm-store-sqlite`) implement the trait.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures in `store.rs`.
#![allow(async_fn_in_trait)]

pub mod collaborator;
pub mod company;
pub mod contract;
pub mod customer;
pub mod error;
pub mod event;
pub mod id;
pub mod money;
pub mod password;
pub mod permission;
pub mod store;
pub mod timestamp;

pub use error::{Error, Result};
pub use id::{Entity, Id};
