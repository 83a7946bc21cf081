//! Org tree schema migrations.
//!
//! # Invariants
//! - `version` values increase strictly and match the file prefix.
//! - Pending migrations run in one transaction; a failure leaves the store
//!   at its previous version.
//! - The applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "departments",
        sql: include_str!("0001_departments.sql"),
    },
    Migration {
        version: 2,
        name: "employees",
        sql: include_str!("0002_employees.sql"),
    },
];

/// Schema versions before and after [`apply_migrations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
}

impl MigrationReport {
    /// Returns true when the store was already current.
    pub fn is_noop(&self) -> bool {
        self.from_version == self.to_version
    }
}

/// Returns the latest schema version known by this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version, rejecting stores newer than this build.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let found = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::UnsupportedSchemaVersion { found, supported });
    }
    Ok(found)
}

/// Brings the store up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from_version = schema_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(MigrationReport {
            from_version,
            to_version: from_version,
        });
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
    }
    tx.commit()?;

    Ok(MigrationReport {
        from_version,
        to_version: latest_version(),
    })
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, MigrationReport, MIGRATIONS};
    use rusqlite::Connection;

    #[test]
    fn migration_versions_are_strictly_increasing() {
        let versions: Vec<u32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(latest_version(), *versions.last().unwrap());
    }

    #[test]
    fn reapplying_migrations_reports_noop() {
        let mut conn = Connection::open_in_memory().unwrap();

        let first = apply_migrations(&mut conn).unwrap();
        assert_eq!(
            first,
            MigrationReport {
                from_version: 0,
                to_version: latest_version()
            }
        );
        assert!(!first.is_noop());
        assert!(apply_migrations(&mut conn).unwrap().is_noop());
    }
}
