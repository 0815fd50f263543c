//! Mapper contracts and SQLite implementations.
//!
//! # Responsibility
//! - Translate each entity type to and from its row representation.
//! - Resolve mappers by type tag or by an entity's runtime type.
//!
//! # Invariants
//! - `get_by_id` reports `NotFound` instead of returning an empty entity.
//! - Key/filter lookups bind values as parameters and only accept known
//!   column names.
//! - Write paths validate entities before SQL mutations.

use crate::db::DbError;
use crate::model::{Entity, EntityId, EntityKind, EntityValidationError};
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_mapper;
pub mod course_mapper;
pub mod course_student_mapper;
mod gateway;
pub mod person_mapper;
pub mod registry;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error surfaced by mapper and registry operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntityValidationError),
    Db(DbError),
    NotFound {
        kind: EntityKind,
        id: EntityId,
    },
    /// Update/delete was asked for an entity that was never persisted.
    MissingIdentity(EntityKind),
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    EntityMismatch {
        expected: EntityKind,
        actual: EntityKind,
    },
    MapperNotFound(String),
    /// The store rejected a transaction commit.
    Commit(rusqlite::Error),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} record not found: {id}"),
            Self::MissingIdentity(kind) => write!(f, "{kind} has no identity yet"),
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` for table `{table}`")
            }
            Self::EntityMismatch { expected, actual } => {
                write!(f, "mapper for {expected} cannot handle {actual}")
            }
            Self::MapperNotFound(name) => write!(f, "mapper not found: {name}"),
            Self::Commit(err) => write!(f, "commit failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Commit(err) => Some(err),
            Self::NotFound { .. }
            | Self::MissingIdentity(_)
            | Self::UnknownColumn { .. }
            | Self::EntityMismatch { .. }
            | Self::MapperNotFound(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<EntityValidationError> for RepoError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Equality predicate over one or more columns, combined with `AND`.
///
/// An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `column = value` clause.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((column.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Mapper contract for exactly one entity type over one store connection.
///
/// Mutating operations run inside a store transaction that is opened on
/// demand; nothing is durable until `commit` succeeds. Result ordering of
/// the list operations is whatever the store returns.
pub trait Mapper {
    type Entity;

    fn kind(&self) -> EntityKind;

    /// Inserts a row from the entity's value fields and returns the
    /// store-assigned identity. The passed entity is left untouched.
    fn create(&self, entity: &Self::Entity) -> RepoResult<EntityId>;

    fn get_by_id(&self, id: EntityId) -> RepoResult<Self::Entity>;

    fn get_by_filter(&self, filter: &Filter) -> RepoResult<Vec<Self::Entity>>;

    /// Full-row replace keyed by identity. Reports `NotFound` when no row
    /// has that identity.
    fn update(&self, entity: &Self::Entity) -> RepoResult<()>;

    /// Removes the row keyed by identity. Reports `NotFound` when no row
    /// has that identity.
    fn delete(&self, entity: &Self::Entity) -> RepoResult<()>;

    /// Flushes the pending store transaction.
    ///
    /// A rejected commit reports `Commit` and discards the pending
    /// transaction, leaving the connection usable.
    fn commit(&self) -> RepoResult<()>;

    /// Discards the pending store transaction, if any.
    fn rollback(&self) -> RepoResult<()>;

    fn get_by_key(&self, key: &str, value: Value) -> RepoResult<Vec<Self::Entity>> {
        self.get_by_filter(&Filter::new().eq(key, value))
    }

    fn get_all(&self) -> RepoResult<Vec<Self::Entity>> {
        self.get_by_filter(&Filter::new())
    }
}

/// Entity types that can be borrowed back out of an [`Entity`].
pub trait MappedEntity: Clone + Into<Entity> {
    fn from_entity(entity: &Entity) -> Option<&Self>;
}

/// Type-erased mapper view used by the registry and the unit of work.
pub trait EntityMapper {
    fn entity_kind(&self) -> EntityKind;
    fn create_entity(&self, entity: &Entity) -> RepoResult<EntityId>;
    fn get_entity(&self, id: EntityId) -> RepoResult<Entity>;
    fn get_all_entities(&self) -> RepoResult<Vec<Entity>>;
    fn update_entity(&self, entity: &Entity) -> RepoResult<()>;
    fn delete_entity(&self, entity: &Entity) -> RepoResult<()>;
    /// Same as [`Mapper::commit`].
    fn flush(&self) -> RepoResult<()>;
    /// Same as [`Mapper::rollback`].
    fn discard(&self) -> RepoResult<()>;
}

impl<M> EntityMapper for M
where
    M: Mapper,
    M::Entity: MappedEntity,
{
    fn entity_kind(&self) -> EntityKind {
        self.kind()
    }

    fn create_entity(&self, entity: &Entity) -> RepoResult<EntityId> {
        self.create(downcast(self.kind(), entity)?)
    }

    fn get_entity(&self, id: EntityId) -> RepoResult<Entity> {
        Ok(self.get_by_id(id)?.into())
    }

    fn get_all_entities(&self) -> RepoResult<Vec<Entity>> {
        Ok(self.get_all()?.into_iter().map(Into::into).collect())
    }

    fn update_entity(&self, entity: &Entity) -> RepoResult<()> {
        self.update(downcast(self.kind(), entity)?)
    }

    fn delete_entity(&self, entity: &Entity) -> RepoResult<()> {
        self.delete(downcast(self.kind(), entity)?)
    }

    fn flush(&self) -> RepoResult<()> {
        self.commit()
    }

    fn discard(&self) -> RepoResult<()> {
        self.rollback()
    }
}

fn downcast<T: MappedEntity>(expected: EntityKind, entity: &Entity) -> RepoResult<&T> {
    let actual = entity.kind();
    if actual != expected {
        return Err(RepoError::EntityMismatch { expected, actual });
    }
    T::from_entity(entity).ok_or(RepoError::EntityMismatch { expected, actual })
}
