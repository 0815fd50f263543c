//! Opening the catalog store.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// Private in-memory database, gone when the connection closes.
    Memory,
}

impl StoreLocation {
    fn connect(&self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

impl Display for StoreLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(":memory:"),
        }
    }
}

/// Opens (creating if needed) a catalog file.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_location(&StoreLocation::File(path.as_ref().to_path_buf()))
}

pub fn open_db_in_memory() -> DbResult<Connection> {
    open_location(&StoreLocation::Memory)
}

/// Connects, sets the busy timeout and migrates the schema.
///
/// The returned connection is in autocommit mode; mappers open their own
/// transactions.
pub fn open_location(location: &StoreLocation) -> DbResult<Connection> {
    let started = Instant::now();
    let result = location
        .connect()
        .map_err(DbError::from)
        .and_then(|mut conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            apply_migrations(&mut conn)?;
            Ok(conn)
        });

    let elapsed_ms = started.elapsed().as_millis();
    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok store={location} duration_ms={elapsed_ms}"
        ),
        Err(err) => error!(
            "event=db_open module=db status=error store={location} duration_ms={elapsed_ms} error={err}"
        ),
    }
    result
}
