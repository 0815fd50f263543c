//! Row-level SQL shared by every table-backed mapper.
//!
//! Column names only ever come from the static table description; caller
//! supplied values are always bound as parameters.

use super::{Filter, RepoError, RepoResult};
use crate::model::{EntityId, EntityKind, EntityValidationError};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

/// Static description of one backing table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableSpec {
    pub name: &'static str,
    /// Value columns, excluding `id`, in binding order.
    pub columns: &'static [&'static str],
}

/// Executes mapper SQL for one table against the shared connection.
pub(crate) struct TableGateway<'conn> {
    conn: &'conn Connection,
    kind: EntityKind,
    table: TableSpec,
}

impl<'conn> TableGateway<'conn> {
    pub fn new(conn: &'conn Connection, kind: EntityKind, table: TableSpec) -> Self {
        Self { conn, kind, table }
    }

    pub fn conn(&self) -> &'conn Connection {
        self.conn
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn insert(&self, values: Vec<Value>) -> RepoResult<EntityId> {
        let placeholders = (1..=self.table.columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            self.table.name,
            self.table.columns.join(", ")
        );

        let started = self.begin_if_needed()?;
        self.execute_in(started, &sql, values)?;
        let id = self.conn.last_insert_rowid();
        debug!(
            "event=mapper_create module=repo status=ok table={} id={}",
            self.table.name, id
        );
        Ok(id)
    }

    pub fn update(&self, id: Option<EntityId>, mut values: Vec<Value>) -> RepoResult<()> {
        let id = id.ok_or(RepoError::MissingIdentity(self.kind))?;
        let assignments = self
            .table
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE id = ?{};",
            self.table.name,
            self.table.columns.len() + 1
        );
        values.push(Value::Integer(id));

        let started = self.begin_if_needed()?;
        if self.execute_in(started, &sql, values)? == 0 {
            self.abandon(started);
            return Err(RepoError::NotFound {
                kind: self.kind,
                id,
            });
        }
        debug!(
            "event=mapper_update module=repo status=ok table={} id={}",
            self.table.name, id
        );
        Ok(())
    }

    pub fn delete(&self, id: Option<EntityId>) -> RepoResult<()> {
        let id = id.ok_or(RepoError::MissingIdentity(self.kind))?;
        let sql = format!("DELETE FROM {} WHERE id = ?1;", self.table.name);

        let started = self.begin_if_needed()?;
        if self.execute_in(started, &sql, vec![Value::Integer(id)])? == 0 {
            self.abandon(started);
            return Err(RepoError::NotFound {
                kind: self.kind,
                id,
            });
        }
        debug!(
            "event=mapper_delete module=repo status=ok table={} id={}",
            self.table.name, id
        );
        Ok(())
    }

    pub fn select<T>(
        &self,
        filter: &Filter,
        parse: impl Fn(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<Vec<T>> {
        let mut sql = format!(
            "SELECT id, {} FROM {}",
            self.table.columns.join(", "),
            self.table.name
        );
        let mut bind_values = Vec::with_capacity(filter.clauses().len());

        for (index, (column, value)) in filter.clauses().iter().enumerate() {
            let column = self.known_column(column)?;
            sql.push_str(if index == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!("{column} = ?{}", index + 1));
            bind_values.push(value.clone());
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse(row)?);
        }

        Ok(records)
    }

    pub fn select_one<T>(
        &self,
        id: EntityId,
        parse: impl Fn(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        self.select(&Filter::new().eq("id", id), parse)?
            .into_iter()
            .next()
            .ok_or(RepoError::NotFound {
                kind: self.kind,
                id,
            })
    }

    /// Commits the open transaction, if any.
    pub fn commit(&self) -> RepoResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }

        if let Err(err) = self.conn.execute_batch("COMMIT;") {
            warn!(
                "event=mapper_commit module=repo status=error table={} error={}",
                self.table.name, err
            );
            // A rejected COMMIT leaves the transaction open.
            self.abandon(true);
            return Err(RepoError::Commit(err));
        }
        debug!(
            "event=mapper_commit module=repo status=ok table={}",
            self.table.name
        );
        Ok(())
    }

    /// Discards the open transaction, if any.
    pub fn rollback(&self) -> RepoResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }

        self.conn.execute_batch("ROLLBACK;")?;
        warn!(
            "event=mapper_rollback module=repo status=ok table={}",
            self.table.name
        );
        Ok(())
    }

    /// Opens a transaction unless one is already open.
    ///
    /// Returns whether this call opened it.
    fn begin_if_needed(&self) -> RepoResult<bool> {
        if !self.conn.is_autocommit() {
            return Ok(false);
        }
        self.conn.execute_batch("BEGIN;")?;
        Ok(true)
    }

    /// Runs one write statement. A failure inside a transaction this write
    /// opened releases that transaction.
    fn execute_in(&self, started: bool, sql: &str, values: Vec<Value>) -> RepoResult<usize> {
        match self.conn.execute(sql, params_from_iter(values)) {
            Ok(changed) => Ok(changed),
            Err(err) => {
                self.abandon(started);
                Err(err.into())
            }
        }
    }

    /// Rolls back a transaction opened by the failed write itself. Pending
    /// writes of earlier calls are left to the caller.
    fn abandon(&self, started: bool) {
        if !started {
            return;
        }
        if let Err(err) = self.rollback() {
            warn!(
                "event=mapper_rollback module=repo status=error table={} error={}",
                self.table.name, err
            );
        }
    }

    fn known_column<'a>(&self, column: &'a str) -> RepoResult<&'a str> {
        if column == "id" || self.table.columns.contains(&column) {
            return Ok(column);
        }
        Err(RepoError::UnknownColumn {
            table: self.table.name,
            column: column.to_string(),
        })
    }
}

pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Rejects a row that no longer passes entity validation.
pub(crate) fn checked_row<T>(
    table: &str,
    entity: T,
    validate: impl FnOnce(&T) -> Result<(), EntityValidationError>,
) -> RepoResult<T> {
    validate(&entity)
        .map_err(|err| RepoError::InvalidData(format!("{table} row rejected: {err}")))?;
    Ok(entity)
}
