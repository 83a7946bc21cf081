//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the org tree store.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Only [`open_db`] migrates; [`connect_db`] refuses stores that are not
//!   already at the latest schema.
//! - Repositories refuse connections that are not fully migrated.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::MigrationReport;
pub use open::{connect_db, open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage bootstrap failures.
#[derive(Debug)]
pub enum DbError {
    /// SQLite failure outside a migration script.
    Sqlite(rusqlite::Error),
    /// A migration script failed; the whole pending batch was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// Store was written by a build with a newer schema.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    /// Store has not been migrated to the schema this build serves.
    SchemaBehind { found: u32, expected: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::Migration { version, name, .. } => {
                write!(f, "org tree migration {version:04} ({name}) failed")
            }
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "org tree store is at schema {found}, this build supports up to {supported}"
            ),
            Self::SchemaBehind { found, expected } => write!(
                f,
                "org tree store is at schema {found}, expected {expected}; open it with migrations first"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::SchemaBehind { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
