//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, TimeDelta, TimeZone as _, Utc};
use crm_core::{
  Id,
  collaborator::{
    Collaborator, Management, NewCollaborator, Role, Sales, SalesRep, Support,
    SupportRep,
  },
  contract::{Contract, ContractStatus, NewContract},
  customer::{CustomerUpdate, NewCustomer},
  event::{EventDetails, NewEvent},
  money::Amount,
  password::PasswordParams,
  store::CrmStore,
};

use crate::{Error, SqliteStore, schema::{SCHEMA_VERSION, TABLES}};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
    .with_password_params(PasswordParams { memory_kib: 8, iterations: 1, parallelism: 1 })
}

/// Unwrap the domain error out of a store error.
fn core(err: Error) -> crm_core::Error {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

fn amount(s: &str) -> Amount { s.parse().unwrap() }

fn at(day: u32, hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap()
}

async fn sales_rep(s: &SqliteStore, name: &str) -> SalesRep {
  s.add_collaborator(NewCollaborator::new(name, format!("{name}@example.com"), "pw"))
    .await
    .unwrap()
}

async fn support_rep(s: &SqliteStore, name: &str) -> SupportRep {
  s.add_collaborator(NewCollaborator::new(name, format!("{name}@example.com"), "pw"))
    .await
    .unwrap()
}

/// A customer with a draft contract worth 1000.00.
async fn contract_fixture(s: &SqliteStore) -> (SalesRep, Contract) {
  let rep = sales_rep(s, "alice").await;
  let customer = s
    .add_customer(NewCustomer::new("Bob", "bob@example.com", "555-0100"))
    .await
    .unwrap();
  let contract = s
    .add_contract(NewContract::new(customer.id, rep.id, amount("1000.00")))
    .await
    .unwrap();
  (rep, contract)
}

fn gala(contract: &Contract) -> NewEvent {
  NewEvent {
    contract_id:    contract.id,
    start_date:     at(1, 18),
    end_date:       at(1, 23),
    location:       "Hall A".into(),
    attendees:      120,
    notes:          "black tie".into(),
    support_rep_id: None,
  }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn schema_materialisation_is_idempotent() {
  let s = store().await;
  s.materialize_schema().await.unwrap();
  s.materialize_schema().await.unwrap();
  assert_eq!(s.schema_version().await.unwrap(), SCHEMA_VERSION);

  let tables: Vec<String> = s
    .read(|conn| {
      let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
      let names = stmt
        .query_map([], |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
      Ok(names)
    })
    .await
    .unwrap();
  for table in TABLES {
    assert!(tables.iter().any(|t| t == table), "missing table {table}");
  }
}

#[tokio::test]
async fn rematerialising_keeps_existing_rows() {
  let s = store().await;
  let company = s.add_company("Acme".into()).await.unwrap();
  s.materialize_schema().await.unwrap();
  assert_eq!(s.get_company(company.id).await.unwrap(), Some(company));
}

#[tokio::test]
async fn file_backed_store_reopens() {
  let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
  let path = std::env::temp_dir().join(format!("crm-store-{}-{nanos}.db", std::process::id()));

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.add_company("Acme".into()).await.unwrap().id
  };
  let reopened = SqliteStore::open(&path).await.unwrap();
  let company = reopened.get_company(id).await.unwrap().unwrap();
  assert_eq!(company.name, "Acme");

  drop(reopened);
  let _ = std::fs::remove_file(&path);
}

// ─── Passwords ───────────────────────────────────────────────────────────────

async fn check_password_round_trip<R: Role>(s: &SqliteStore) {
  let created: Collaborator<R> = s
    .add_collaborator(NewCollaborator::new("Alice", "alice@example.com", "hunter2"))
    .await
    .unwrap();
  assert!(created.verify_password("hunter2").unwrap());

  let loaded = s.get_collaborator(created.id).await.unwrap().unwrap();
  assert_eq!(loaded, created);
  assert!(loaded.verify_password("hunter2").unwrap());
  assert!(!loaded.verify_password("hunter3").unwrap());
  assert!(!loaded.verify_password("").unwrap());
  assert!(!loaded.verify_password(loaded.password_hash().as_phc()).unwrap());

  let changed = s.set_password(created.id, "correct horse".into()).await.unwrap();
  assert_ne!(changed.password_hash(), created.password_hash());

  let reloaded = s.get_collaborator(created.id).await.unwrap().unwrap();
  assert!(reloaded.verify_password("correct horse").unwrap());
  assert!(!reloaded.verify_password("hunter2").unwrap());
}

#[tokio::test]
async fn password_round_trip_for_every_role() {
  let s = store().await;
  check_password_round_trip::<Sales>(&s).await;
  check_password_round_trip::<Support>(&s).await;
  check_password_round_trip::<Management>(&s).await;
}

#[tokio::test]
async fn plaintext_is_never_stored() {
  let s = store().await;
  let rep = sales_rep(&s, "alice").await;
  s.set_password(rep.id, "hunter2".into()).await.unwrap();

  let stored: String = s
    .read(move |conn| {
      Ok(conn.query_row(
        "SELECT password_hash FROM sales_rep WHERE id = ?1",
        [rep.id.get()],
        |r| r.get(0),
      )?)
    })
    .await
    .unwrap();
  assert!(stored.starts_with("$argon2id$"));
  assert!(!stored.contains("hunter2"));
}

#[tokio::test]
async fn set_password_on_missing_collaborator_fails() {
  let s = store().await;
  let err = s
    .set_password::<Support>(Id::new(99), "pw".into())
    .await
    .unwrap_err();
  assert!(matches!(core(err), crm_core::Error::NotFound { entity: "support_rep", id: 99 }));
}

#[tokio::test]
async fn roles_have_independent_id_spaces() {
  let s = store().await;
  let rep = sales_rep(&s, "alice").await;
  let support = support_rep(&s, "sam").await;
  // Both tables start counting at 1.
  assert_eq!(rep.id.get(), support.id.get());
  assert_eq!(s.list_collaborators::<Sales>().await.unwrap().len(), 1);
  assert!(s.list_collaborators::<Management>().await.unwrap().is_empty());
}

// ─── Grants ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn grant_and_revoke_are_idempotent() {
  let s = store().await;
  let rep = sales_rep(&s, "alice").await;
  let perm = s.add_permission("contracts:write".into()).await.unwrap();

  s.grant(rep.id, perm.id).await.unwrap();
  s.grant(rep.id, perm.id).await.unwrap();
  assert_eq!(s.list_grants(rep.id).await.unwrap(), vec![perm.clone()]);

  s.revoke(rep.id, perm.id).await.unwrap();
  assert!(s.list_grants(rep.id).await.unwrap().is_empty());
  s.revoke(rep.id, perm.id).await.unwrap();
  assert!(s.list_grants(rep.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn grants_are_scoped_per_role() {
  let s = store().await;
  let rep = sales_rep(&s, "alice").await;
  let manager: Collaborator<Management> = s
    .add_collaborator(NewCollaborator::new("Mia", "mia@example.com", "pw"))
    .await
    .unwrap();
  let read = s.add_permission("customers:read".into()).await.unwrap();
  let write = s.add_permission("customers:write".into()).await.unwrap();

  s.grant(manager.id, write.id).await.unwrap();
  s.grant(manager.id, read.id).await.unwrap();
  s.grant(rep.id, read.id).await.unwrap();

  assert_eq!(s.list_grants(manager.id).await.unwrap(), vec![read.clone(), write]);
  assert_eq!(s.list_grants(rep.id).await.unwrap(), vec![read.clone()]);

  // Revoking from the manager leaves the sales rep's row alone.
  s.revoke(manager.id, read.id).await.unwrap();
  assert_eq!(s.list_grants(rep.id).await.unwrap(), vec![read]);
}

#[tokio::test]
async fn granting_unknown_permission_is_referential_error() {
  let s = store().await;
  let rep = sales_rep(&s, "alice").await;
  let err = core(s.grant(rep.id, Id::new(404)).await.unwrap_err());
  assert!(err.is_referential());
  assert!(matches!(
    err,
    crm_core::Error::UnresolvedReference { entity: "permission", id: 404 }
  ));
}

#[tokio::test]
async fn granting_to_unknown_collaborator_is_referential_error() {
  let s = store().await;
  let perm = s.add_permission("events:read".into()).await.unwrap();
  let err = core(s.grant::<Support>(Id::new(5), perm.id).await.unwrap_err());
  assert!(matches!(
    err,
    crm_core::Error::UnresolvedReference { entity: "support_rep", id: 5 }
  ));
}

#[tokio::test]
async fn deleting_a_collaborator_drops_its_grants() {
  let s = store().await;
  let rep = sales_rep(&s, "alice").await;
  let perm = s.add_permission("contracts:read".into()).await.unwrap();
  s.grant(rep.id, perm.id).await.unwrap();

  s.delete_collaborator(rep.id).await.unwrap();

  let remaining: i64 = s
    .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM sales_permission", [], |r| r.get(0))?))
    .await
    .unwrap();
  assert_eq!(remaining, 0);
  assert_eq!(s.list_permissions().await.unwrap(), vec![perm]);
}

// ─── Customers ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn customer_with_unknown_sales_rep_is_rejected() {
  let s = store().await;
  let mut input = NewCustomer::new("Bob", "bob@example.com", "555-0100");
  input.sales_rep_id = Some(Id::new(42));

  let err = core(s.add_customer(input).await.unwrap_err());
  assert!(matches!(
    err,
    crm_core::Error::UnresolvedReference { entity: "sales_rep", id: 42 }
  ));
  assert!(s.get_customer(Id::new(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn customer_with_unknown_company_is_rejected() {
  let s = store().await;
  let mut input = NewCustomer::new("Bob", "bob@example.com", "555-0100");
  input.company_id = Some(Id::new(3));
  assert!(core(s.add_customer(input).await.unwrap_err()).is_referential());
}

#[tokio::test]
async fn unassigned_customer_is_allowed() {
  let s = store().await;
  let customer = s
    .add_customer(NewCustomer::new("Bob", "bob@example.com", "555-0100"))
    .await
    .unwrap();
  assert_eq!(customer.sales_rep_id, None);
  assert_eq!(customer.company_id, None);
}

#[tokio::test]
async fn customer_reassignment() {
  let s = store().await;
  let alice = sales_rep(&s, "alice").await;
  let carol = sales_rep(&s, "carol").await;
  let customer = s
    .add_customer(NewCustomer::new("Bob", "bob@example.com", "555-0100"))
    .await
    .unwrap();

  let assigned = s.assign_customer_sales_rep(customer.id, Some(alice.id)).await.unwrap();
  assert!(assigned.updated_on > customer.updated_on);

  let again = s.assign_customer_sales_rep(customer.id, Some(alice.id)).await.unwrap();
  assert_eq!(again, assigned);

  let moved = s.assign_customer_sales_rep(customer.id, Some(carol.id)).await.unwrap();
  assert_eq!(moved.sales_rep_id, Some(carol.id));
  assert!(moved.updated_on > assigned.updated_on);
  assert_eq!(s.get_customer(customer.id).await.unwrap(), Some(moved));

  let err = s.assign_customer_sales_rep(customer.id, Some(Id::new(77))).await.unwrap_err();
  assert!(core(err).is_referential());
}

#[tokio::test]
async fn customer_update_refreshes_updated_on() {
  let s = store().await;
  let customer = s
    .add_customer(NewCustomer::new("Bob", "bob@example.com", "555-0100"))
    .await
    .unwrap();

  let updated = s
    .update_customer(customer.id, CustomerUpdate {
      informations: Some("prefers email".into()),
      ..CustomerUpdate::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.informations, "prefers email");
  assert_eq!(updated.created_on, customer.created_on);
  assert!(updated.updated_on > customer.updated_on);
}

// ─── Contracts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_contract_signing() {
  let s = store().await;

  let acme = s.add_company("Acme".into()).await.unwrap();
  let alice: SalesRep = s
    .add_collaborator(NewCollaborator::new("Alice", "alice@acme.test", "hunter2"))
    .await
    .unwrap();
  assert!(alice.verify_password("hunter2").unwrap());

  let mut input = NewCustomer::new("Bob", "bob@example.com", "555-0100");
  input.company_id = Some(acme.id);
  input.sales_rep_id = Some(alice.id);
  let bob = s.add_customer(input).await.unwrap();

  let draft = s
    .add_contract(NewContract::new(bob.id, alice.id, amount("1000.00")))
    .await
    .unwrap();
  assert_eq!(draft.status, ContractStatus::Draft);
  assert_eq!(draft.total_value, amount("1000.00"));
  assert_eq!(draft.remaining_balance, amount("1000.00"));

  let signed = s.transition_contract(draft.id, ContractStatus::Signed).await.unwrap();
  assert_eq!(signed.status, ContractStatus::Signed);
  assert!(signed.updated_on > draft.updated_on);

  let err = s.transition_contract(draft.id, ContractStatus::Draft).await.unwrap_err();
  assert!(matches!(
    core(err),
    crm_core::Error::InvalidStateTransition {
      from: ContractStatus::Signed,
      to:   ContractStatus::Draft,
    }
  ));

  // The failed transition left the stored row untouched.
  assert_eq!(s.get_contract(draft.id).await.unwrap(), Some(signed));
  assert_eq!(s.customers_of_company(acme.id).await.unwrap(), vec![bob.clone()]);
  assert_eq!(s.contracts_of_sales_rep(alice.id).await.unwrap().len(), 1);
  assert_eq!(s.contracts_of_customer(bob.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sanctioned_transitions_through_the_store() {
  let s = store().await;
  let (_, a) = contract_fixture(&s).await;
  let canceled = s.transition_contract(a.id, ContractStatus::Canceled).await.unwrap();
  assert_eq!(canceled.status, ContractStatus::Canceled);

  for to in [ContractStatus::Draft, ContractStatus::Signed, ContractStatus::Canceled] {
    let err = s.transition_contract(a.id, to).await.unwrap_err();
    assert!(matches!(core(err), crm_core::Error::InvalidStateTransition { .. }));
  }

  let (_, b) = contract_fixture(&s).await;
  s.transition_contract(b.id, ContractStatus::Signed).await.unwrap();
  let canceled = s.transition_contract(b.id, ContractStatus::Canceled).await.unwrap();
  assert_eq!(canceled.status, ContractStatus::Canceled);
}

#[tokio::test]
async fn contract_can_be_created_signed_but_not_canceled() {
  let s = store().await;
  let (rep, existing) = contract_fixture(&s).await;

  let mut input = NewContract::new(existing.customer_id, rep.id, amount("50"));
  input.status = ContractStatus::Signed;
  let signed = s.add_contract(input.clone()).await.unwrap();
  assert_eq!(signed.status, ContractStatus::Signed);

  input.status = ContractStatus::Canceled;
  let err = s.add_contract(input).await.unwrap_err();
  assert!(matches!(core(err), crm_core::Error::Validation(_)));
}

#[tokio::test]
async fn contract_with_dangling_keys_is_not_persisted() {
  let s = store().await;
  let (rep, existing) = contract_fixture(&s).await;

  let err = s
    .add_contract(NewContract::new(Id::new(999), rep.id, amount("10")))
    .await
    .unwrap_err();
  assert!(matches!(
    core(err),
    crm_core::Error::UnresolvedReference { entity: "customer", id: 999 }
  ));

  let err = s
    .add_contract(NewContract::new(existing.customer_id, Id::new(999), amount("10")))
    .await
    .unwrap_err();
  assert!(matches!(
    core(err),
    crm_core::Error::UnresolvedReference { entity: "sales_rep", id: 999 }
  ));

  assert_eq!(s.contracts_of_customer(existing.customer_id).await.unwrap(), vec![existing]);
}

#[tokio::test]
async fn remaining_balance_cannot_exceed_total() {
  let s = store().await;
  let (rep, existing) = contract_fixture(&s).await;

  let mut input = NewContract::new(existing.customer_id, rep.id, amount("100.00"));
  input.remaining_balance = amount("100.01");
  assert!(matches!(
    core(s.add_contract(input).await.unwrap_err()),
    crm_core::Error::Validation(_)
  ));
}

#[tokio::test]
async fn payments_reduce_remaining_balance() {
  let s = store().await;
  let (_, contract) = contract_fixture(&s).await;

  let paid = s.record_payment(contract.id, amount("250.50")).await.unwrap();
  assert_eq!(paid.remaining_balance, amount("749.50"));
  assert_eq!(paid.total_value, amount("1000.00"));
  assert!(paid.updated_on > contract.updated_on);

  let err = s.record_payment(contract.id, amount("749.51")).await.unwrap_err();
  assert!(matches!(core(err), crm_core::Error::Validation(_)));
  assert_eq!(s.get_contract(contract.id).await.unwrap(), Some(paid));
}

#[tokio::test]
async fn contract_sales_rep_reassignment() {
  let s = store().await;
  let (alice, contract) = contract_fixture(&s).await;
  let carol = sales_rep(&s, "carol").await;

  let same = s.assign_contract_sales_rep(contract.id, alice.id).await.unwrap();
  assert_eq!(same.updated_on, contract.updated_on);

  let moved = s.assign_contract_sales_rep(contract.id, carol.id).await.unwrap();
  assert_eq!(moved.sales_rep_id, carol.id);
  assert!(moved.updated_on > contract.updated_on);
  assert!(s.contracts_of_sales_rep(alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn transition_of_missing_contract_is_not_found() {
  let s = store().await;
  let err = s.transition_contract(Id::new(8), ContractStatus::Signed).await.unwrap_err();
  assert!(matches!(core(err), crm_core::Error::NotFound { entity: "contract", id: 8 }));
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn adding_an_event_links_the_contract() {
  let s = store().await;
  let (_, contract) = contract_fixture(&s).await;

  let event = s.add_event(gala(&contract)).await.unwrap();
  assert_eq!(event.contract_id, contract.id);
  assert_eq!(event.support_rep_id, None);

  let linked = s.get_contract(contract.id).await.unwrap().unwrap();
  assert_eq!(linked.event_id, Some(event.id));
  assert!(linked.updated_on > contract.updated_on);
}

#[tokio::test]
async fn a_contract_holds_at_most_one_event() {
  let s = store().await;
  let (_, contract) = contract_fixture(&s).await;
  let first = s.add_event(gala(&contract)).await.unwrap();
  let linked = s.get_contract(contract.id).await.unwrap().unwrap();

  let err = s.add_event(gala(&contract)).await.unwrap_err();
  assert!(matches!(core(err), crm_core::Error::Validation(_)));

  // The rejected write left the first link and no second row.
  assert_eq!(s.get_contract(contract.id).await.unwrap(), Some(linked));
  assert!(s.get_event(Id::new(first.id.get() + 1)).await.unwrap().is_none());

  // Once the first event is gone the contract can take a new one.
  s.delete_event(first.id).await.unwrap();
  let second = s.add_event(gala(&contract)).await.unwrap();
  let relinked = s.get_contract(contract.id).await.unwrap().unwrap();
  assert_eq!(relinked.event_id, Some(second.id));
}

#[tokio::test]
async fn far_future_event_dates_are_rejected_before_storage() {
  let s = store().await;
  let (_, contract) = contract_fixture(&s).await;

  let mut input = gala(&contract);
  input.start_date = Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).unwrap();
  input.end_date = Utc.with_ymd_and_hms(10000, 1, 2, 0, 0, 0).unwrap();
  assert!(matches!(
    core(s.add_event(input).await.unwrap_err()),
    crm_core::Error::Validation(_)
  ));
  assert_eq!(s.get_contract(contract.id).await.unwrap(), Some(contract.clone()));

  let mut input = gala(&contract);
  input.start_date = Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).unwrap();
  input.end_date = Utc.with_ymd_and_hms(9999, 12, 31, 23, 0, 0).unwrap();
  let event = s.add_event(input).await.unwrap();
  assert_eq!(s.get_event(event.id).await.unwrap(), Some(event));
}

#[tokio::test]
async fn event_validation_and_references() {
  let s = store().await;
  let (_, contract) = contract_fixture(&s).await;

  let mut backwards = gala(&contract);
  backwards.end_date = backwards.start_date - TimeDelta::hours(1);
  assert!(matches!(
    core(s.add_event(backwards).await.unwrap_err()),
    crm_core::Error::Validation(_)
  ));

  let mut orphan = gala(&contract);
  orphan.contract_id = Id::new(55);
  assert!(matches!(
    core(s.add_event(orphan).await.unwrap_err()),
    crm_core::Error::UnresolvedReference { entity: "contract", id: 55 }
  ));

  let mut unknown_rep = gala(&contract);
  unknown_rep.support_rep_id = Some(Id::new(6));
  assert!(core(s.add_event(unknown_rep).await.unwrap_err()).is_referential());

  // None of the rejected events left a link behind.
  assert_eq!(s.get_contract(contract.id).await.unwrap(), Some(contract));
}

#[tokio::test]
async fn support_rep_assignment_is_idempotent() {
  let s = store().await;
  let (_, contract) = contract_fixture(&s).await;
  let sam = support_rep(&s, "sam").await;
  let event = s.add_event(gala(&contract)).await.unwrap();

  let assigned = s.assign_event_support_rep(event.id, Some(sam.id)).await.unwrap();
  assert_eq!(assigned.support_rep_id, Some(sam.id));
  assert!(assigned.updated_on > event.updated_on);

  let again = s.assign_event_support_rep(event.id, Some(sam.id)).await.unwrap();
  assert_eq!(again.updated_on, assigned.updated_on);

  assert_eq!(s.events_of_support_rep(sam.id).await.unwrap(), vec![assigned]);
}

#[tokio::test]
async fn reschedule_and_details() {
  let s = store().await;
  let (_, contract) = contract_fixture(&s).await;
  let event = s.add_event(gala(&contract)).await.unwrap();

  let err = s.reschedule_event(event.id, at(3, 12), at(2, 12)).await.unwrap_err();
  assert!(matches!(core(err), crm_core::Error::Validation(_)));

  let moved = s.reschedule_event(event.id, at(2, 12), at(3, 12)).await.unwrap();
  assert_eq!((moved.start_date, moved.end_date), (at(2, 12), at(3, 12)));

  let detailed = s
    .update_event_details(event.id, EventDetails {
      attendees: Some(80),
      ..EventDetails::default()
    })
    .await
    .unwrap();
  assert_eq!(detailed.attendees, 80);
  assert_eq!(detailed.location, "Hall A");
  assert!(detailed.updated_on > moved.updated_on);
  assert_eq!(s.get_event(event.id).await.unwrap(), Some(detailed));
}

// ─── Round trip ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_entity_round_trips() {
  let s = store().await;

  let perm = s.add_permission("reports:read".into()).await.unwrap();
  assert_eq!(s.get_permission(perm.id).await.unwrap(), Some(perm));

  let company = s.add_company("Acme".into()).await.unwrap();
  assert_eq!(s.get_company(company.id).await.unwrap(), Some(company.clone()));

  let rep = sales_rep(&s, "alice").await;
  let sam = support_rep(&s, "sam").await;

  let mut input = NewCustomer::new("Bob", "bob@example.com", "555-0100");
  input.informations = "met at the fair".into();
  input.company_id = Some(company.id);
  input.sales_rep_id = Some(rep.id);
  let customer = s.add_customer(input).await.unwrap();
  assert_eq!(s.get_customer(customer.id).await.unwrap(), Some(customer.clone()));

  let mut input = NewContract::new(customer.id, rep.id, amount("1234567.89"));
  input.remaining_balance = amount("0.01");
  let contract = s.add_contract(input).await.unwrap();
  assert_eq!(s.get_contract(contract.id).await.unwrap(), Some(contract.clone()));

  let mut input = gala(&contract);
  input.support_rep_id = Some(sam.id);
  let event = s.add_event(input).await.unwrap();
  assert_eq!(s.get_event(event.id).await.unwrap(), Some(event));

  let loaded = s.get_collaborator(rep.id).await.unwrap().unwrap();
  assert_eq!(loaded, rep);
  assert!(loaded.verify_password("pw").unwrap());
}

// ─── Delete policy ───────────────────────────────────────────────────────────

#[tokio::test]
async fn company_delete_is_restricted_by_customers() {
  let s = store().await;
  let company = s.add_company("Acme".into()).await.unwrap();
  let mut input = NewCustomer::new("Bob", "bob@example.com", "555-0100");
  input.company_id = Some(company.id);
  let customer = s.add_customer(input).await.unwrap();

  let err = core(s.delete_company(company.id).await.unwrap_err());
  assert!(matches!(
    err,
    crm_core::Error::StillReferenced { entity: "company", dependent: "customer", .. }
  ));

  s.set_customer_company(customer.id, None).await.unwrap();
  s.delete_company(company.id).await.unwrap();
  assert!(s.get_company(company.id).await.unwrap().is_none());
}

#[tokio::test]
async fn financial_rows_are_never_removed_implicitly() {
  let s = store().await;
  let (rep, contract) = contract_fixture(&s).await;

  let err = core(s.delete_customer(contract.customer_id).await.unwrap_err());
  assert!(matches!(err, crm_core::Error::StillReferenced { dependent: "contract", .. }));

  let err = core(s.delete_collaborator(rep.id).await.unwrap_err());
  assert!(matches!(err, crm_core::Error::StillReferenced { dependent: "contract", .. }));

  let event = s.add_event(gala(&contract)).await.unwrap();
  let err = core(s.delete_contract(contract.id).await.unwrap_err());
  assert!(matches!(err, crm_core::Error::StillReferenced { dependent: "event", .. }));

  s.delete_event(event.id).await.unwrap();
  s.delete_contract(contract.id).await.unwrap();
  s.delete_customer(contract.customer_id).await.unwrap();
  s.delete_collaborator(rep.id).await.unwrap();
  assert!(s.get_collaborator(rep.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_an_event_unlinks_its_contract() {
  let s = store().await;
  let (_, contract) = contract_fixture(&s).await;
  let event = s.add_event(gala(&contract)).await.unwrap();
  let linked = s.get_contract(contract.id).await.unwrap().unwrap();

  s.delete_event(event.id).await.unwrap();

  let unlinked = s.get_contract(contract.id).await.unwrap().unwrap();
  assert_eq!(unlinked.event_id, None);
  assert!(unlinked.updated_on > linked.updated_on);
  assert!(s.get_event(event.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_reps_clears_optional_assignments() {
  let s = store().await;
  let alice = sales_rep(&s, "alice").await;
  let (_, contract) = contract_fixture(&s).await;
  let sam = support_rep(&s, "sam").await;

  let mut input = NewCustomer::new("Dana", "dana@example.com", "555-0101");
  input.sales_rep_id = Some(alice.id);
  let dana = s.add_customer(input).await.unwrap();

  let mut input = gala(&contract);
  input.support_rep_id = Some(sam.id);
  let event = s.add_event(input).await.unwrap();

  s.delete_collaborator(alice.id).await.unwrap();
  let dana_after = s.get_customer(dana.id).await.unwrap().unwrap();
  assert_eq!(dana_after.sales_rep_id, None);
  assert!(dana_after.updated_on > dana.updated_on);

  s.delete_collaborator(sam.id).await.unwrap();
  let event_after = s.get_event(event.id).await.unwrap().unwrap();
  assert_eq!(event_after.support_rep_id, None);
  assert!(event_after.updated_on > event.updated_on);
}

#[tokio::test]
async fn deleting_missing_rows_is_not_found() {
  let s = store().await;
  assert!(matches!(
    core(s.delete_company(Id::new(1)).await.unwrap_err()),
    crm_core::Error::NotFound { entity: "company", .. }
  ));
  assert!(matches!(
    core(s.delete_collaborator::<Management>(Id::new(1)).await.unwrap_err()),
    crm_core::Error::NotFound { entity: "manager", .. }
  ));
}
