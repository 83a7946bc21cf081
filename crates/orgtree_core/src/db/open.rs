//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas the hierarchy store relies on.
//! - Migrate the store at startup; verify it on every later connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`, so employee rows follow
//!   their department on delete and parent references cannot dangle.
//! - Returned connections are at the latest schema version.

use super::migrations::{apply_migrations, latest_version, schema_version};
use super::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) a store file and applies pending migrations.
///
/// Meant for process startup. Emits one `db_open` info event.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_and_migrate("file", || Connection::open(path))
}

/// Opens an in-memory store with all migrations applied.
///
/// Each call yields an independent, empty database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_and_migrate("memory", Connection::open_in_memory)
}

/// Connects to an existing, already migrated store file.
///
/// Never creates the file or migrates. Fails with
/// [`DbError::SchemaBehind`] when [`open_db`] has not run on the store.
/// Logs at debug level, so per-request connections stay out of info logs.
pub fn connect_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(DbError::from)
    .and_then(|conn| {
        configure(&conn)?;
        let found = schema_version(&conn)?;
        let expected = latest_version();
        if found < expected {
            return Err(DbError::SchemaBehind { found, expected });
        }
        Ok(conn)
    });

    match &result {
        Ok(_) => debug!(
            "event=db_connect module=db status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_connect module=db status=error duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
    result
}

fn open_and_migrate(
    mode: &'static str,
    opener: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();

    let mut conn = match opener() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let migrated = configure(&conn).and_then(|()| apply_migrations(&mut conn));
    match migrated {
        Ok(report) => {
            info!(
                "event=db_open module=db status=ok mode={mode} from_version={} to_version={} duration_ms={}",
                report.from_version,
                report.to_version,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_migrate_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}
