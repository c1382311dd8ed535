//! SQL schema for the CRM SQLite store.
//!
//! Executed at connection startup and safe to run again at any time: every
//! statement is `IF NOT EXISTS`. `PRAGMA user_version` records the layout
//! version for future migrations.

/// Layout version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL.
///
/// Foreign keys declare the delete policy as a backstop; the store checks
/// references and dependents itself before every write so that failures carry
/// a typed error.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS permission (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT NOT NULL
);

-- One table per collaborator role; no shared polymorphic table.
CREATE TABLE IF NOT EXISTS sales_rep (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL      -- argon2 PHC string; never plaintext
);

CREATE TABLE IF NOT EXISTS support_rep (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS manager (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL
);

-- Grant relations, one per role. The primary key makes a grant a set member.
CREATE TABLE IF NOT EXISTS sales_permission (
    sales_rep_id  INTEGER NOT NULL REFERENCES sales_rep(id) ON DELETE CASCADE,
    permission_id INTEGER NOT NULL REFERENCES permission(id) ON DELETE RESTRICT,
    PRIMARY KEY (sales_rep_id, permission_id)
);

CREATE TABLE IF NOT EXISTS support_permission (
    support_rep_id INTEGER NOT NULL REFERENCES support_rep(id) ON DELETE CASCADE,
    permission_id  INTEGER NOT NULL REFERENCES permission(id) ON DELETE RESTRICT,
    PRIMARY KEY (support_rep_id, permission_id)
);

CREATE TABLE IF NOT EXISTS manager_permission (
    manager_id    INTEGER NOT NULL REFERENCES manager(id) ON DELETE CASCADE,
    permission_id INTEGER NOT NULL REFERENCES permission(id) ON DELETE RESTRICT,
    PRIMARY KEY (manager_id, permission_id)
);

CREATE TABLE IF NOT EXISTS company (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS customer (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    email        TEXT NOT NULL,
    phone        TEXT NOT NULL,
    informations TEXT NOT NULL,
    company_id   INTEGER REFERENCES company(id) ON DELETE RESTRICT,
    sales_rep_id INTEGER REFERENCES sales_rep(id) ON DELETE SET NULL,
    created_on   TEXT NOT NULL,   -- RFC 3339 UTC
    updated_on   TEXT NOT NULL
);

-- Money is decimal(9,2) kept as canonical text (e.g. '1000.00'), never REAL.
CREATE TABLE IF NOT EXISTS contract (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    status            TEXT NOT NULL DEFAULT 'draft'
                      CHECK (status IN ('draft', 'signed', 'canceled')),
    customer_id       INTEGER NOT NULL REFERENCES customer(id) ON DELETE RESTRICT,
    sales_rep_id      INTEGER NOT NULL REFERENCES sales_rep(id) ON DELETE RESTRICT,
    event_id          INTEGER REFERENCES event(id) ON DELETE SET NULL,
    total_value       TEXT NOT NULL,
    remaining_balance TEXT NOT NULL,
    created_on        TEXT NOT NULL,
    updated_on        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS event (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    start_date     TEXT NOT NULL,
    end_date       TEXT NOT NULL,
    location       TEXT NOT NULL,
    attendees      INTEGER NOT NULL CHECK (attendees >= 0),
    notes          TEXT NOT NULL,
    contract_id    INTEGER NOT NULL REFERENCES contract(id) ON DELETE RESTRICT,
    support_rep_id INTEGER REFERENCES support_rep(id) ON DELETE SET NULL,
    created_on     TEXT NOT NULL,
    updated_on     TEXT NOT NULL,
    CHECK (start_date <= end_date)
);

CREATE INDEX IF NOT EXISTS customer_company_idx   ON customer(company_id);
CREATE INDEX IF NOT EXISTS customer_sales_rep_idx ON customer(sales_rep_id);
CREATE INDEX IF NOT EXISTS contract_customer_idx  ON contract(customer_id);
CREATE INDEX IF NOT EXISTS contract_sales_rep_idx ON contract(sales_rep_id);
CREATE INDEX IF NOT EXISTS event_contract_idx     ON event(contract_id);
CREATE INDEX IF NOT EXISTS event_support_rep_idx  ON event(support_rep_id);

PRAGMA user_version = 1;
";

/// Every table the schema declares, in creation order.
pub const TABLES: [&str; 11] = [
  "permission",
  "sales_rep",
  "support_rep",
  "manager",
  "sales_permission",
  "support_permission",
  "manager_permission",
  "company",
  "customer",
  "contract",
  "event",
];
