//! Subcommands of the `crm` binary and their execution against a store.
//!
//! Every command yields a JSON value that `main` prints.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use crm_core::{
  Id,
  collaborator::{Collaborator, Management, NewCollaborator, Role, RoleKind, Sales, Support},
  contract::{ContractStatus, NewContract},
  customer::NewCustomer,
  event::NewEvent,
  money::Amount,
  store::CrmStore,
};
use crm_store_sqlite::SqliteStore;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

// ─── Command tree ─────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Create any missing tables and report the schema version.
  Init,

  /// The permission catalog.
  #[command(subcommand)]
  Permission(PermissionCmd),

  /// Staff accounts. Passwords are read from stdin.
  #[command(subcommand)]
  Collaborator(CollaboratorCmd),

  /// Grant a permission to a collaborator.
  Grant(GrantArgs),

  /// Withdraw a permission from a collaborator.
  Revoke(GrantArgs),

  /// List the permissions a collaborator holds.
  Grants(Target),

  #[command(subcommand)]
  Company(CompanyCmd),

  #[command(subcommand)]
  Customer(CustomerCmd),

  #[command(subcommand)]
  Contract(ContractCmd),

  #[command(subcommand)]
  Event(EventCmd),
}

#[derive(Subcommand, Debug)]
pub enum PermissionCmd {
  Add { description: String },
  List,
}

/// One collaborator of a given role.
#[derive(Args, Debug)]
pub struct Target {
  /// sales, support or manager.
  #[arg(long)]
  role: RoleKind,
  #[arg(long)]
  id:   i64,
}

#[derive(Subcommand, Debug)]
pub enum CollaboratorCmd {
  Add {
    #[arg(long)]
    role:  RoleKind,
    #[arg(long)]
    name:  String,
    #[arg(long)]
    email: String,
  },
  List {
    #[arg(long)]
    role: RoleKind,
  },
  SetPassword(Target),
  /// Check a candidate password; prints `"valid": true|false`.
  Verify(Target),
  Delete(Target),
}

#[derive(Args, Debug)]
pub struct GrantArgs {
  #[command(flatten)]
  target:     Target,
  #[arg(long)]
  permission: i64,
}

#[derive(Subcommand, Debug)]
pub enum CompanyCmd {
  Add { name: String },
}

#[derive(Subcommand, Debug)]
pub enum CustomerCmd {
  Add {
    #[arg(long)]
    name:         String,
    #[arg(long)]
    email:        String,
    #[arg(long)]
    phone:        String,
    #[arg(long, default_value = "")]
    informations: String,
    #[arg(long)]
    company:      Option<i64>,
    #[arg(long)]
    sales_rep:    Option<i64>,
  },
  /// Set the customer's sales rep; omit `--sales-rep` to unassign.
  Assign {
    #[arg(long)]
    id:        i64,
    #[arg(long)]
    sales_rep: Option<i64>,
  },
}

#[derive(Subcommand, Debug)]
pub enum ContractCmd {
  Add {
    #[arg(long)]
    customer:  i64,
    #[arg(long)]
    sales_rep: i64,
    #[arg(long)]
    total:     Amount,
    /// Defaults to the total value.
    #[arg(long)]
    remaining: Option<Amount>,
    #[arg(long, default_value = "draft")]
    status:    ContractStatus,
  },
  Transition {
    #[arg(long)]
    id: i64,
    #[arg(long)]
    to: ContractStatus,
  },
  /// Record a payment against the remaining balance.
  Pay {
    #[arg(long)]
    id:     i64,
    #[arg(long)]
    amount: Amount,
  },
}

#[derive(Subcommand, Debug)]
pub enum EventCmd {
  Add {
    #[arg(long)]
    contract:    i64,
    /// RFC 3339, e.g. 2026-05-01T18:00:00Z.
    #[arg(long)]
    start:       DateTime<Utc>,
    #[arg(long)]
    end:         DateTime<Utc>,
    #[arg(long)]
    location:    String,
    #[arg(long, default_value_t = 0)]
    attendees:   u32,
    #[arg(long, default_value = "")]
    notes:       String,
    #[arg(long)]
    support_rep: Option<i64>,
  },
  /// Set the event's support rep; omit `--support-rep` to unassign.
  Assign {
    #[arg(long)]
    id:          i64,
    #[arg(long)]
    support_rep: Option<i64>,
  },
}

// ─── Role dispatch ────────────────────────────────────────────────────────────

/// A collaborator command with its role split off, so it can run generically.
enum RoleAction {
  Add { name: String, email: String },
  List,
  SetPassword(i64),
  Verify(i64),
  Delete(i64),
  Grant { id: i64, permission: i64 },
  Revoke { id: i64, permission: i64 },
  Grants(i64),
}

async fn dispatch(store: &SqliteStore, role: RoleKind, action: RoleAction) -> Result<Value> {
  match role {
    RoleKind::Sales => run_as::<Sales>(store, action).await,
    RoleKind::Support => run_as::<Support>(store, action).await,
    RoleKind::Manager => run_as::<Management>(store, action).await,
  }
}

async fn run_as<R: Role>(store: &SqliteStore, action: RoleAction) -> Result<Value> {
  match action {
    RoleAction::Add { name, email } => {
      let password = read_password()?;
      let created: Collaborator<R> =
        store.add_collaborator(NewCollaborator::new(name, email, password)).await?;
      info!(role = %R::KIND, id = %created.id, "collaborator created");
      to_json(&created)
    }
    RoleAction::List => to_json(&store.list_collaborators::<R>().await?),
    RoleAction::SetPassword(id) => {
      let password = read_password()?;
      let updated = store.set_password::<R>(Id::new(id), password).await?;
      to_json(&updated)
    }
    RoleAction::Verify(id) => {
      let collaborator = store
        .get_collaborator::<R>(Id::new(id))
        .await?
        .with_context(|| format!("no {} with id {id}", R::TABLE))?;
      let candidate = read_password()?;
      let valid = collaborator.verify_password(&candidate)?;
      Ok(json!({ "role": R::KIND, "id": id, "valid": valid }))
    }
    RoleAction::Delete(id) => {
      store.delete_collaborator::<R>(Id::new(id)).await?;
      Ok(json!({ "role": R::KIND, "deleted": id }))
    }
    RoleAction::Grant { id, permission } => {
      store.grant::<R>(Id::new(id), Id::new(permission)).await?;
      to_json(&store.list_grants::<R>(Id::new(id)).await?)
    }
    RoleAction::Revoke { id, permission } => {
      store.revoke::<R>(Id::new(id), Id::new(permission)).await?;
      to_json(&store.list_grants::<R>(Id::new(id)).await?)
    }
    RoleAction::Grants(id) => to_json(&store.list_grants::<R>(Id::new(id)).await?),
  }
}

// ─── Execution ────────────────────────────────────────────────────────────────

impl Command {
  pub async fn run(self, store: &SqliteStore) -> Result<Value> {
    match self {
      Command::Init => {
        store.materialize_schema().await?;
        Ok(json!({ "schema_version": store.schema_version().await? }))
      }

      Command::Permission(PermissionCmd::Add { description }) => {
        to_json(&store.add_permission(description).await?)
      }
      Command::Permission(PermissionCmd::List) => to_json(&store.list_permissions().await?),

      Command::Collaborator(cmd) => {
        let (role, action) = match cmd {
          CollaboratorCmd::Add { role, name, email } => (role, RoleAction::Add { name, email }),
          CollaboratorCmd::List { role } => (role, RoleAction::List),
          CollaboratorCmd::SetPassword(t) => (t.role, RoleAction::SetPassword(t.id)),
          CollaboratorCmd::Verify(t) => (t.role, RoleAction::Verify(t.id)),
          CollaboratorCmd::Delete(t) => (t.role, RoleAction::Delete(t.id)),
        };
        dispatch(store, role, action).await
      }
      Command::Grant(GrantArgs { target, permission }) => {
        let action = RoleAction::Grant { id: target.id, permission };
        dispatch(store, target.role, action).await
      }
      Command::Revoke(GrantArgs { target, permission }) => {
        let action = RoleAction::Revoke { id: target.id, permission };
        dispatch(store, target.role, action).await
      }
      Command::Grants(target) => dispatch(store, target.role, RoleAction::Grants(target.id)).await,

      Command::Company(CompanyCmd::Add { name }) => to_json(&store.add_company(name).await?),

      Command::Customer(CustomerCmd::Add {
        name,
        email,
        phone,
        informations,
        company,
        sales_rep,
      }) => {
        let input = NewCustomer {
          informations,
          company_id: company.map(Id::new),
          sales_rep_id: sales_rep.map(Id::new),
          ..NewCustomer::new(name, email, phone)
        };
        to_json(&store.add_customer(input).await?)
      }
      Command::Customer(CustomerCmd::Assign { id, sales_rep }) => {
        let customer = store
          .assign_customer_sales_rep(Id::new(id), sales_rep.map(Id::new))
          .await?;
        to_json(&customer)
      }

      Command::Contract(ContractCmd::Add { customer, sales_rep, total, remaining, status }) => {
        let mut input = NewContract::new(Id::new(customer), Id::new(sales_rep), total);
        input.status = status;
        if let Some(remaining) = remaining {
          input.remaining_balance = remaining;
        }
        to_json(&store.add_contract(input).await?)
      }
      Command::Contract(ContractCmd::Transition { id, to }) => {
        to_json(&store.transition_contract(Id::new(id), to).await?)
      }
      Command::Contract(ContractCmd::Pay { id, amount }) => {
        to_json(&store.record_payment(Id::new(id), amount).await?)
      }

      Command::Event(EventCmd::Add {
        contract,
        start,
        end,
        location,
        attendees,
        notes,
        support_rep,
      }) => {
        let input = NewEvent {
          contract_id: Id::new(contract),
          start_date: start,
          end_date: end,
          location,
          attendees,
          notes,
          support_rep_id: support_rep.map(Id::new),
        };
        to_json(&store.add_event(input).await?)
      }
      Command::Event(EventCmd::Assign { id, support_rep }) => {
        let event = store
          .assign_event_support_rep(Id::new(id), support_rep.map(Id::new))
          .await?;
        to_json(&event)
      }
    }
  }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> { Ok(serde_json::to_value(value)?) }

/// Read a password from stdin. The prompt goes to stderr so stdout stays
/// JSON-only.
fn read_password() -> Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
