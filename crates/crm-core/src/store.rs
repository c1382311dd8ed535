//! The `CrmStore` trait.
//!
//! Implemented by storage backends (e.g. `crm-store-sqlite`). Every write
//! operation is atomic: referential checks, the mutation and the
//! `updated_on` refresh that accompanies it are either all visible or none
//! are.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  collaborator::{Collaborator, CollaboratorId, NewCollaborator, Role, SalesRepId, SupportRepId},
  company::{Company, CompanyId},
  contract::{Contract, ContractId, ContractStatus, NewContract},
  customer::{Customer, CustomerId, CustomerUpdate, NewCustomer},
  event::{Event, EventDetails, EventId, NewEvent},
  money::Amount,
  permission::{Permission, PermissionId},
};

/// Abstraction over a CRM storage backend.
///
/// Lookups by id return `Ok(None)` for a missing row; mutations of a missing
/// row fail with a not-found error, and dangling foreign keys fail with a
/// referential-integrity error.
pub trait CrmStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Permission catalog ────────────────────────────────────────────────

  fn add_permission(
    &self,
    description: String,
  ) -> impl Future<Output = Result<Permission, Self::Error>> + Send + '_;

  fn get_permission(
    &self,
    id: PermissionId,
  ) -> impl Future<Output = Result<Option<Permission>, Self::Error>> + Send + '_;

  fn list_permissions(
    &self,
  ) -> impl Future<Output = Result<Vec<Permission>, Self::Error>> + Send + '_;

  // ── Collaborators ─────────────────────────────────────────────────────

  /// Persist a new account; only a hash of `input.password` is stored.
  fn add_collaborator<R: Role>(
    &self,
    input: NewCollaborator,
  ) -> impl Future<Output = Result<Collaborator<R>, Self::Error>> + Send + '_;

  fn get_collaborator<R: Role>(
    &self,
    id: CollaboratorId<R>,
  ) -> impl Future<Output = Result<Option<Collaborator<R>>, Self::Error>> + Send + '_;

  fn list_collaborators<R: Role>(
    &self,
  ) -> impl Future<Output = Result<Vec<Collaborator<R>>, Self::Error>> + Send + '_;

  /// Overwrite the stored hash with one computed from `plaintext`.
  fn set_password<R: Role>(
    &self,
    id: CollaboratorId<R>,
    plaintext: String,
  ) -> impl Future<Output = Result<Collaborator<R>, Self::Error>> + Send + '_;

  /// Remove an account and its grants. Refused while required dependents
  /// (a sales rep's contracts) exist; optional references to it are cleared.
  fn delete_collaborator<R: Role>(
    &self,
    id: CollaboratorId<R>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Permission grants ─────────────────────────────────────────────────

  /// Idempotent: granting an already-held permission is a no-op.
  fn grant<R: Role>(
    &self,
    collaborator: CollaboratorId<R>,
    permission: PermissionId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Idempotent: revoking a permission that is not held is a no-op.
  fn revoke<R: Role>(
    &self,
    collaborator: CollaboratorId<R>,
    permission: PermissionId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The distinct permissions held, ordered by permission id.
  fn list_grants<R: Role>(
    &self,
    collaborator: CollaboratorId<R>,
  ) -> impl Future<Output = Result<Vec<Permission>, Self::Error>> + Send + '_;

  // ── Companies ─────────────────────────────────────────────────────────

  fn add_company(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  fn get_company(
    &self,
    id: CompanyId,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  fn rename_company(
    &self,
    id: CompanyId,
    name: String,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  /// Refused while customers belong to the company.
  fn delete_company(
    &self,
    id: CompanyId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn customers_of_company(
    &self,
    id: CompanyId,
  ) -> impl Future<Output = Result<Vec<Customer>, Self::Error>> + Send + '_;

  // ── Customers ─────────────────────────────────────────────────────────

  fn add_customer(
    &self,
    input: NewCustomer,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  fn get_customer(
    &self,
    id: CustomerId,
  ) -> impl Future<Output = Result<Option<Customer>, Self::Error>> + Send + '_;

  fn update_customer(
    &self,
    id: CustomerId,
    update: CustomerUpdate,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  fn assign_customer_sales_rep(
    &self,
    id: CustomerId,
    sales_rep: Option<SalesRepId>,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  fn set_customer_company(
    &self,
    id: CustomerId,
    company: Option<CompanyId>,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  /// Refused while the customer has contracts.
  fn delete_customer(
    &self,
    id: CustomerId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn contracts_of_customer(
    &self,
    id: CustomerId,
  ) -> impl Future<Output = Result<Vec<Contract>, Self::Error>> + Send + '_;

  // ── Contracts ─────────────────────────────────────────────────────────

  fn add_contract(
    &self,
    input: NewContract,
  ) -> impl Future<Output = Result<Contract, Self::Error>> + Send + '_;

  fn get_contract(
    &self,
    id: ContractId,
  ) -> impl Future<Output = Result<Option<Contract>, Self::Error>> + Send + '_;

  /// Apply a sanctioned status transition.
  fn transition_contract(
    &self,
    id: ContractId,
    to: ContractStatus,
  ) -> impl Future<Output = Result<Contract, Self::Error>> + Send + '_;

  fn assign_contract_sales_rep(
    &self,
    id: ContractId,
    sales_rep: SalesRepId,
  ) -> impl Future<Output = Result<Contract, Self::Error>> + Send + '_;

  /// Reduce the remaining balance; never below zero.
  fn record_payment(
    &self,
    id: ContractId,
    amount: Amount,
  ) -> impl Future<Output = Result<Contract, Self::Error>> + Send + '_;

  /// Refused while an event belongs to the contract.
  fn delete_contract(
    &self,
    id: ContractId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn contracts_of_sales_rep(
    &self,
    id: SalesRepId,
  ) -> impl Future<Output = Result<Vec<Contract>, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  /// Persist an event and link it from its contract in the same write.
  /// Refused when the contract already has an event.
  fn add_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  fn assign_event_support_rep(
    &self,
    id: EventId,
    support_rep: Option<SupportRepId>,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn reschedule_event(
    &self,
    id: EventId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn update_event_details(
    &self,
    id: EventId,
    details: EventDetails,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Remove an event, unlinking it from its contract.
  fn delete_event(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn events_of_support_rep(
    &self,
    id: SupportRepId,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;
}
