//! [`SqliteStore`], the SQLite implementation of [`CrmStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use tracing::{debug, info};

use crm_core::{
  Entity, Id,
  collaborator::{
    Collaborator, CollaboratorId, NewCollaborator, Role, RoleKind, SalesRepId,
    SupportRepId,
  },
  company::{Company, CompanyId},
  contract::{Contract, ContractId, ContractStatus, NewContract},
  customer::{Customer, CustomerId, CustomerUpdate, NewCustomer},
  event::{Event, EventDetails, EventId, NewEvent},
  money::Amount,
  password::{PasswordHash, PasswordParams},
  permission::{Permission, PermissionId},
  store::CrmStore,
  timestamp,
};

use crate::{
  Result,
  encode::{Stored, encode_amount, encode_dt, encode_status, opt_id},
  schema::{SCHEMA, SCHEMA_VERSION, TABLES},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A CRM store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn:            tokio_rusqlite::Connection,
  password_params: PasswordParams,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and materialise the schema.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, password_params: PasswordParams::default() };
    store.materialize_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, password_params: PasswordParams::default() };
    store.materialize_schema().await?;
    Ok(store)
  }

  /// Argon2 cost used for passwords set through this store.
  pub fn with_password_params(mut self, params: PasswordParams) -> Self {
    self.password_params = params;
    self
  }

  /// Create every table and index that does not exist yet. Safe to call any
  /// number of times.
  pub async fn materialize_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    info!(version = SCHEMA_VERSION, tables = TABLES.len(), "schema materialised");
    Ok(())
  }

  /// The layout version recorded by [`SqliteStore::materialize_schema`].
  pub async fn schema_version(&self) -> Result<i64> {
    self
      .read(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
      .await
  }

  pub(crate) async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside one immediate transaction; commit only if it succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = f(&tx);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }

  /// Hash on the blocking pool, off the runtime and the DB thread.
  async fn hash_password(&self, plaintext: String) -> Result<PasswordHash> {
    let params = self.password_params;
    let hash =
      tokio::task::spawn_blocking(move || PasswordHash::generate(&plaintext, &params))
        .await??;
    Ok(hash)
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn fetch_all<T: Stored>(
  conn: &Connection,
  filter: &str,
  params: impl rusqlite::Params,
) -> Result<Vec<T>> {
  let sql = format!("SELECT {} FROM {} {filter}", T::COLUMNS, T::TABLE);
  let mut stmt = conn.prepare(&sql)?;
  let mut rows = stmt.query(params)?;
  let mut out = Vec::new();
  while let Some(row) = rows.next()? {
    out.push(T::decode(row)?);
  }
  Ok(out)
}

fn fetch<T: Stored>(conn: &Connection, id: Id<T>) -> Result<Option<T>> {
  Ok(fetch_all(conn, "WHERE id = ?1", [id.get()])?.into_iter().next())
}

/// Load the row a mutation targets.
fn fetch_required<T: Stored>(conn: &Connection, id: Id<T>) -> Result<T> {
  fetch(conn, id)?.ok_or_else(|| crm_core::Error::not_found(id).into())
}

fn exists<T: Entity>(conn: &Connection, id: Id<T>) -> Result<bool> {
  let sql = format!("SELECT 1 FROM {} WHERE id = ?1", T::TABLE);
  Ok(conn.query_row(&sql, [id.get()], |_| Ok(())).optional()?.is_some())
}

/// A foreign key being written must point at an existing row.
fn require<T: Entity>(conn: &Connection, id: Id<T>) -> Result<()> {
  if !exists(conn, id)? {
    return Err(crm_core::Error::unresolved(id).into());
  }
  Ok(())
}

/// The row being deleted must exist.
fn require_target<T: Entity>(conn: &Connection, id: Id<T>) -> Result<()> {
  if !exists(conn, id)? {
    return Err(crm_core::Error::not_found(id).into());
  }
  Ok(())
}

/// Refuse a delete while `dependent.column` still references `id`.
fn restrict<T: Entity>(
  conn: &Connection,
  id: Id<T>,
  dependent: &'static str,
  column: &str,
) -> Result<()> {
  let sql = format!("SELECT COUNT(*) FROM {dependent} WHERE {column} = ?1");
  let count: i64 = conn.query_row(&sql, [id.get()], |r| r.get(0))?;
  if count > 0 {
    return Err(crm_core::Error::still_referenced(id, dependent).into());
  }
  Ok(())
}

fn delete_row<T: Entity>(conn: &Connection, id: Id<T>) -> Result<()> {
  conn.execute(&format!("DELETE FROM {} WHERE id = ?1", T::TABLE), [id.get()])?;
  Ok(())
}

fn save_customer(conn: &Connection, c: &Customer) -> Result<()> {
  conn.execute(
    "UPDATE customer SET
       name = ?2, email = ?3, phone = ?4, informations = ?5,
       company_id = ?6, sales_rep_id = ?7, updated_on = ?8
     WHERE id = ?1",
    params![
      c.id.get(),
      c.name,
      c.email,
      c.phone,
      c.informations,
      opt_id(c.company_id),
      opt_id(c.sales_rep_id),
      encode_dt(c.updated_on),
    ],
  )?;
  Ok(())
}

fn save_contract(conn: &Connection, c: &Contract) -> Result<()> {
  conn.execute(
    "UPDATE contract SET
       status = ?2, sales_rep_id = ?3, event_id = ?4,
       remaining_balance = ?5, updated_on = ?6
     WHERE id = ?1",
    params![
      c.id.get(),
      encode_status(c.status),
      c.sales_rep_id.get(),
      opt_id(c.event_id),
      encode_amount(c.remaining_balance),
      encode_dt(c.updated_on),
    ],
  )?;
  Ok(())
}

fn save_event(conn: &Connection, e: &Event) -> Result<()> {
  conn.execute(
    "UPDATE event SET
       start_date = ?2, end_date = ?3, location = ?4, attendees = ?5,
       notes = ?6, support_rep_id = ?7, updated_on = ?8
     WHERE id = ?1",
    params![
      e.id.get(),
      encode_dt(e.start_date),
      encode_dt(e.end_date),
      e.location,
      e.attendees,
      e.notes,
      opt_id(e.support_rep_id),
      encode_dt(e.updated_on),
    ],
  )?;
  Ok(())
}

// ─── CrmStore impl ───────────────────────────────────────────────────────────

impl CrmStore for SqliteStore {
  type Error = crate::Error;

  // ── Permission catalog ────────────────────────────────────────────────────

  async fn add_permission(&self, description: String) -> Result<Permission> {
    let permission = self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO permission (description) VALUES (?1)",
          params![description],
        )?;
        Ok(Permission { id: Id::new(tx.last_insert_rowid()), description })
      })
      .await?;
    debug!(id = %permission.id, "permission added");
    Ok(permission)
  }

  async fn get_permission(&self, id: PermissionId) -> Result<Option<Permission>> {
    self.read(move |conn| fetch(conn, id)).await
  }

  async fn list_permissions(&self) -> Result<Vec<Permission>> {
    self.read(|conn| fetch_all(conn, "ORDER BY id", [])).await
  }

  // ── Collaborators ─────────────────────────────────────────────────────────

  async fn add_collaborator<R: Role>(
    &self,
    input: NewCollaborator,
  ) -> Result<Collaborator<R>> {
    let NewCollaborator { name, email, password } = input;
    let hash = self.hash_password(password).await?;

    let collaborator = self
      .write(move |tx| {
        tx.execute(
          &format!(
            "INSERT INTO {} (name, email, password_hash) VALUES (?1, ?2, ?3)",
            R::TABLE
          ),
          params![name, email, hash.as_phc()],
        )?;
        Ok(Collaborator::new(Id::new(tx.last_insert_rowid()), name, email, hash))
      })
      .await?;
    debug!(role = %R::KIND, id = %collaborator.id, "collaborator added");
    Ok(collaborator)
  }

  async fn get_collaborator<R: Role>(
    &self,
    id: CollaboratorId<R>,
  ) -> Result<Option<Collaborator<R>>> {
    self.read(move |conn| fetch(conn, id)).await
  }

  async fn list_collaborators<R: Role>(&self) -> Result<Vec<Collaborator<R>>> {
    self.read(|conn| fetch_all(conn, "ORDER BY id", [])).await
  }

  async fn set_password<R: Role>(
    &self,
    id: CollaboratorId<R>,
    plaintext: String,
  ) -> Result<Collaborator<R>> {
    let hash = self.hash_password(plaintext).await?;

    let collaborator = self
      .write(move |tx| {
        let mut collaborator: Collaborator<R> = fetch_required(tx, id)?;
        collaborator.set_password_hash(hash);
        tx.execute(
          &format!("UPDATE {} SET password_hash = ?1 WHERE id = ?2", R::TABLE),
          params![collaborator.password_hash().as_phc(), id.get()],
        )?;
        Ok(collaborator)
      })
      .await?;
    debug!(role = %R::KIND, %id, "password changed");
    Ok(collaborator)
  }

  async fn delete_collaborator<R: Role>(&self, id: CollaboratorId<R>) -> Result<()> {
    self
      .write(move |tx| {
        require_target(tx, id)?;

        match R::KIND {
          RoleKind::Sales => {
            restrict(tx, id, "contract", "sales_rep_id")?;
            let customers: Vec<Customer> =
              fetch_all(tx, "WHERE sales_rep_id = ?1", [id.get()])?;
            for mut customer in customers {
              customer.assign_sales_rep(None);
              save_customer(tx, &customer)?;
            }
          }
          RoleKind::Support => {
            let events: Vec<Event> =
              fetch_all(tx, "WHERE support_rep_id = ?1", [id.get()])?;
            for mut event in events {
              event.assign_support_rep(None);
              save_event(tx, &event)?;
            }
          }
          RoleKind::Manager => {}
        }

        tx.execute(
          &format!("DELETE FROM {} WHERE {} = ?1", R::GRANT_TABLE, R::GRANT_COLUMN),
          [id.get()],
        )?;
        delete_row(tx, id)
      })
      .await?;
    debug!(role = %R::KIND, %id, "collaborator deleted");
    Ok(())
  }

  // ── Permission grants ─────────────────────────────────────────────────────

  async fn grant<R: Role>(
    &self,
    collaborator: CollaboratorId<R>,
    permission: PermissionId,
  ) -> Result<()> {
    let inserted = self
      .write(move |tx| {
        require(tx, collaborator)?;
        require(tx, permission)?;
        Ok(tx.execute(
          &format!(
            "INSERT OR IGNORE INTO {} ({}, permission_id) VALUES (?1, ?2)",
            R::GRANT_TABLE,
            R::GRANT_COLUMN
          ),
          [collaborator.get(), permission.get()],
        )?)
      })
      .await?;
    debug!(role = %R::KIND, %collaborator, %permission, inserted, "grant");
    Ok(())
  }

  async fn revoke<R: Role>(
    &self,
    collaborator: CollaboratorId<R>,
    permission: PermissionId,
  ) -> Result<()> {
    let removed = self
      .write(move |tx| {
        Ok(tx.execute(
          &format!(
            "DELETE FROM {} WHERE {} = ?1 AND permission_id = ?2",
            R::GRANT_TABLE,
            R::GRANT_COLUMN
          ),
          [collaborator.get(), permission.get()],
        )?)
      })
      .await?;
    debug!(role = %R::KIND, %collaborator, %permission, removed, "revoke");
    Ok(())
  }

  async fn list_grants<R: Role>(
    &self,
    collaborator: CollaboratorId<R>,
  ) -> Result<Vec<Permission>> {
    let filter = format!(
      "WHERE id IN (SELECT permission_id FROM {} WHERE {} = ?1) ORDER BY id",
      R::GRANT_TABLE,
      R::GRANT_COLUMN
    );
    self
      .read(move |conn| fetch_all(conn, &filter, [collaborator.get()]))
      .await
  }

  // ── Companies ─────────────────────────────────────────────────────────────

  async fn add_company(&self, name: String) -> Result<Company> {
    let company = self
      .write(move |tx| {
        tx.execute("INSERT INTO company (name) VALUES (?1)", params![name])?;
        Ok(Company { id: Id::new(tx.last_insert_rowid()), name })
      })
      .await?;
    debug!(id = %company.id, "company added");
    Ok(company)
  }

  async fn get_company(&self, id: CompanyId) -> Result<Option<Company>> {
    self.read(move |conn| fetch(conn, id)).await
  }

  async fn rename_company(&self, id: CompanyId, name: String) -> Result<Company> {
    self
      .write(move |tx| {
        let mut company: Company = fetch_required(tx, id)?;
        if company.name != name {
          tx.execute(
            "UPDATE company SET name = ?2 WHERE id = ?1",
            params![id.get(), name],
          )?;
          company.name = name;
        }
        Ok(company)
      })
      .await
  }

  async fn delete_company(&self, id: CompanyId) -> Result<()> {
    self
      .write(move |tx| {
        require_target(tx, id)?;
        restrict(tx, id, "customer", "company_id")?;
        delete_row(tx, id)
      })
      .await?;
    debug!(%id, "company deleted");
    Ok(())
  }

  async fn customers_of_company(&self, id: CompanyId) -> Result<Vec<Customer>> {
    self
      .read(move |conn| fetch_all(conn, "WHERE company_id = ?1 ORDER BY id", [id.get()]))
      .await
  }

  // ── Customers ─────────────────────────────────────────────────────────────

  async fn add_customer(&self, input: NewCustomer) -> Result<Customer> {
    let customer = self
      .write(move |tx| {
        if let Some(company) = input.company_id {
          require(tx, company)?;
        }
        if let Some(rep) = input.sales_rep_id {
          require(tx, rep)?;
        }

        let now = timestamp::now();
        tx.execute(
          "INSERT INTO customer (
             name, email, phone, informations, company_id, sales_rep_id,
             created_on, updated_on
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          params![
            input.name,
            input.email,
            input.phone,
            input.informations,
            opt_id(input.company_id),
            opt_id(input.sales_rep_id),
            encode_dt(now),
            encode_dt(now),
          ],
        )?;
        Ok(input.into_customer(Id::new(tx.last_insert_rowid()), now))
      })
      .await?;
    debug!(id = %customer.id, "customer added");
    Ok(customer)
  }

  async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
    self.read(move |conn| fetch(conn, id)).await
  }

  async fn update_customer(
    &self,
    id: CustomerId,
    update: CustomerUpdate,
  ) -> Result<Customer> {
    self
      .write(move |tx| {
        let mut customer: Customer = fetch_required(tx, id)?;
        if customer.apply(update) {
          save_customer(tx, &customer)?;
        }
        Ok(customer)
      })
      .await
  }

  async fn assign_customer_sales_rep(
    &self,
    id: CustomerId,
    sales_rep: Option<SalesRepId>,
  ) -> Result<Customer> {
    self
      .write(move |tx| {
        if let Some(rep) = sales_rep {
          require(tx, rep)?;
        }
        let mut customer: Customer = fetch_required(tx, id)?;
        if customer.assign_sales_rep(sales_rep) {
          save_customer(tx, &customer)?;
        }
        Ok(customer)
      })
      .await
  }

  async fn set_customer_company(
    &self,
    id: CustomerId,
    company: Option<CompanyId>,
  ) -> Result<Customer> {
    self
      .write(move |tx| {
        if let Some(company) = company {
          require(tx, company)?;
        }
        let mut customer: Customer = fetch_required(tx, id)?;
        if customer.set_company(company) {
          save_customer(tx, &customer)?;
        }
        Ok(customer)
      })
      .await
  }

  async fn delete_customer(&self, id: CustomerId) -> Result<()> {
    self
      .write(move |tx| {
        require_target(tx, id)?;
        restrict(tx, id, "contract", "customer_id")?;
        delete_row(tx, id)
      })
      .await?;
    debug!(%id, "customer deleted");
    Ok(())
  }

  async fn contracts_of_customer(&self, id: CustomerId) -> Result<Vec<Contract>> {
    self
      .read(move |conn| fetch_all(conn, "WHERE customer_id = ?1 ORDER BY id", [id.get()]))
      .await
  }

  // ── Contracts ─────────────────────────────────────────────────────────────

  async fn add_contract(&self, input: NewContract) -> Result<Contract> {
    input.validate()?;

    let contract = self
      .write(move |tx| {
        require(tx, input.customer_id)?;
        require(tx, input.sales_rep_id)?;

        let now = timestamp::now();
        tx.execute(
          "INSERT INTO contract (
             status, customer_id, sales_rep_id, event_id,
             total_value, remaining_balance, created_on, updated_on
           ) VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, ?7)",
          params![
            encode_status(input.status),
            input.customer_id.get(),
            input.sales_rep_id.get(),
            encode_amount(input.total_value),
            encode_amount(input.remaining_balance),
            encode_dt(now),
            encode_dt(now),
          ],
        )?;
        Ok(input.into_contract(Id::new(tx.last_insert_rowid()), now))
      })
      .await?;
    debug!(id = %contract.id, status = %contract.status, "contract added");
    Ok(contract)
  }

  async fn get_contract(&self, id: ContractId) -> Result<Option<Contract>> {
    self.read(move |conn| fetch(conn, id)).await
  }

  async fn transition_contract(
    &self,
    id: ContractId,
    to: ContractStatus,
  ) -> Result<Contract> {
    let contract = self
      .write(move |tx| {
        let mut contract: Contract = fetch_required(tx, id)?;
        contract.transition(to)?;
        save_contract(tx, &contract)?;
        Ok(contract)
      })
      .await?;
    debug!(%id, status = %contract.status, "contract transitioned");
    Ok(contract)
  }

  async fn assign_contract_sales_rep(
    &self,
    id: ContractId,
    sales_rep: SalesRepId,
  ) -> Result<Contract> {
    self
      .write(move |tx| {
        require(tx, sales_rep)?;
        let mut contract: Contract = fetch_required(tx, id)?;
        if contract.assign_sales_rep(sales_rep) {
          save_contract(tx, &contract)?;
        }
        Ok(contract)
      })
      .await
  }

  async fn record_payment(&self, id: ContractId, amount: Amount) -> Result<Contract> {
    let contract = self
      .write(move |tx| {
        let mut contract: Contract = fetch_required(tx, id)?;
        contract.record_payment(amount)?;
        save_contract(tx, &contract)?;
        Ok(contract)
      })
      .await?;
    debug!(%id, %amount, remaining = %contract.remaining_balance, "payment recorded");
    Ok(contract)
  }

  async fn delete_contract(&self, id: ContractId) -> Result<()> {
    self
      .write(move |tx| {
        require_target(tx, id)?;
        restrict(tx, id, "event", "contract_id")?;
        delete_row(tx, id)
      })
      .await?;
    debug!(%id, "contract deleted");
    Ok(())
  }

  async fn contracts_of_sales_rep(&self, id: SalesRepId) -> Result<Vec<Contract>> {
    self
      .read(move |conn| fetch_all(conn, "WHERE sales_rep_id = ?1 ORDER BY id", [id.get()]))
      .await
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn add_event(&self, input: NewEvent) -> Result<Event> {
    input.validate()?;

    let event = self
      .write(move |tx| {
        let mut contract: Contract = fetch(tx, input.contract_id)?
          .ok_or_else(|| crm_core::Error::unresolved(input.contract_id))?;
        // One event per contract.
        if let Some(existing) = contract.event_id {
          return Err(
            crm_core::Error::Validation(format!(
              "contract {} already has event {existing}",
              contract.id
            ))
            .into(),
          );
        }
        if let Some(rep) = input.support_rep_id {
          require(tx, rep)?;
        }

        let now = timestamp::now();
        tx.execute(
          "INSERT INTO event (
             start_date, end_date, location, attendees, notes,
             contract_id, support_rep_id, created_on, updated_on
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          params![
            encode_dt(input.start_date),
            encode_dt(input.end_date),
            input.location,
            input.attendees,
            input.notes,
            input.contract_id.get(),
            opt_id(input.support_rep_id),
            encode_dt(now),
            encode_dt(now),
          ],
        )?;
        let event = input.into_event(Id::new(tx.last_insert_rowid()), now);

        contract.link_event(Some(event.id));
        save_contract(tx, &contract)?;
        Ok(event)
      })
      .await?;
    debug!(id = %event.id, contract = %event.contract_id, "event added");
    Ok(event)
  }

  async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
    self.read(move |conn| fetch(conn, id)).await
  }

  async fn assign_event_support_rep(
    &self,
    id: EventId,
    support_rep: Option<SupportRepId>,
  ) -> Result<Event> {
    self
      .write(move |tx| {
        if let Some(rep) = support_rep {
          require(tx, rep)?;
        }
        let mut event: Event = fetch_required(tx, id)?;
        if event.assign_support_rep(support_rep) {
          save_event(tx, &event)?;
        }
        Ok(event)
      })
      .await
  }

  async fn reschedule_event(
    &self,
    id: EventId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<Event> {
    self
      .write(move |tx| {
        let mut event: Event = fetch_required(tx, id)?;
        event.reschedule(start, end)?;
        save_event(tx, &event)?;
        Ok(event)
      })
      .await
  }

  async fn update_event_details(
    &self,
    id: EventId,
    details: EventDetails,
  ) -> Result<Event> {
    self
      .write(move |tx| {
        let mut event: Event = fetch_required(tx, id)?;
        if event.apply(details) {
          save_event(tx, &event)?;
        }
        Ok(event)
      })
      .await
  }

  async fn delete_event(&self, id: EventId) -> Result<()> {
    self
      .write(move |tx| {
        require_target(tx, id)?;
        let linked: Vec<Contract> = fetch_all(tx, "WHERE event_id = ?1", [id.get()])?;
        for mut contract in linked {
          contract.link_event(None);
          save_contract(tx, &contract)?;
        }
        delete_row(tx, id)
      })
      .await?;
    debug!(%id, "event deleted");
    Ok(())
  }

  async fn events_of_support_rep(&self, id: SupportRepId) -> Result<Vec<Event>> {
    self
      .read(move |conn| {
        fetch_all(conn, "WHERE support_rep_id = ?1 ORDER BY id", [id.get()])
      })
      .await
  }
}
