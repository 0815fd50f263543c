//! Unit of work: per-thread staging of inserts, updates and deletes.
//!
//! # Responsibility
//! - Collect new, dirty and removed entities for the current thread.
//! - Flush them through registry-resolved mappers in a fixed phase order.
//!
//! # Invariants
//! - Each thread has its own current unit of work; nothing is shared.
//! - `commit` runs all new, then all dirty, then all removed entities, each
//!   phase in registration order.
//! - Registration does not deduplicate.
//! - Commit is not atomic across operations: the first failure stops the
//!   commit, and operations already flushed stay in the store. The failed
//!   operation's own transaction is rolled back.
//! - A unit of work is not re-entrant while committing.

use crate::model::{Entity, EntityId, EntityKind};
use crate::repo::registry::MapperRegistry;
use crate::repo::{EntityMapper, RepoError};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub mod domain_object;

pub type UowResult<T> = Result<T, UowError>;

thread_local! {
    static CURRENT: RefCell<Slot> = const { RefCell::new(Slot::Absent) };
}

enum Slot {
    Absent,
    Active(UnitOfWork),
    Committing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    New,
    Dirty,
    Removed,
}

impl CommitPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Dirty => "dirty",
            Self::Removed => "removed",
        }
    }
}

#[derive(Debug)]
pub enum UowError {
    /// No unit of work is bound to the current thread.
    NoActiveUnit,
    /// The current unit of work is being committed.
    CommitInProgress,
    Operation {
        phase: CommitPhase,
        kind: EntityKind,
        id: Option<EntityId>,
        source: RepoError,
    },
}

impl Display for UowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveUnit => write!(f, "no unit of work is active on this thread"),
            Self::CommitInProgress => write!(f, "unit of work is committing"),
            Self::Operation {
                phase,
                kind,
                id,
                source,
            } => match id {
                Some(id) => write!(f, "{} {kind} {id} failed: {source}", phase.as_str()),
                None => write!(f, "{} {kind} failed: {source}", phase.as_str()),
            },
        }
    }
}

impl Error for UowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Operation { source, .. } => Some(source),
            Self::NoActiveUnit | Self::CommitInProgress => None,
        }
    }
}

/// What one successful commit did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Store-assigned identities of created entities, in commit order.
    pub created: Vec<(EntityKind, EntityId)>,
    pub updated: usize,
    pub removed: usize,
}

/// Staging buffer of pending mapper operations.
///
/// Entities are stored as value snapshots taken at registration time.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    new_objects: Vec<Entity>,
    dirty_objects: Vec<Entity>,
    removed_objects: Vec<Entity>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_new(&mut self, entity: Entity) {
        debug!("event=uow_register module=uow list=new kind={}", entity.kind());
        self.new_objects.push(entity);
    }

    pub fn register_dirty(&mut self, entity: Entity) {
        debug!("event=uow_register module=uow list=dirty kind={}", entity.kind());
        self.dirty_objects.push(entity);
    }

    pub fn register_removed(&mut self, entity: Entity) {
        debug!("event=uow_register module=uow list=removed kind={}", entity.kind());
        self.removed_objects.push(entity);
    }

    pub fn new_objects(&self) -> &[Entity] {
        &self.new_objects
    }

    pub fn dirty_objects(&self) -> &[Entity] {
        &self.dirty_objects
    }

    pub fn removed_objects(&self) -> &[Entity] {
        &self.removed_objects
    }

    pub fn pending(&self) -> usize {
        self.new_objects.len() + self.dirty_objects.len() + self.removed_objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Flushes every staged entity and empties the staging lists.
    ///
    /// Each operation is committed through its mapper before the next one
    /// starts. On error, the remaining staged entities are dropped.
    pub fn commit(&mut self, registry: &MapperRegistry<'_>) -> UowResult<CommitSummary> {
        let new_objects = std::mem::take(&mut self.new_objects);
        let dirty_objects = std::mem::take(&mut self.dirty_objects);
        let removed_objects = std::mem::take(&mut self.removed_objects);
        info!(
            "event=uow_commit module=uow status=start new={} dirty={} removed={}",
            new_objects.len(),
            dirty_objects.len(),
            removed_objects.len()
        );

        let mut summary = CommitSummary::default();
        for entity in &new_objects {
            let id = apply(registry, CommitPhase::New, entity, |mapper| {
                mapper.create_entity(entity)
            })?;
            summary.created.push((entity.kind(), id));
        }
        for entity in &dirty_objects {
            apply(registry, CommitPhase::Dirty, entity, |mapper| {
                mapper.update_entity(entity)
            })?;
            summary.updated += 1;
        }
        for entity in &removed_objects {
            apply(registry, CommitPhase::Removed, entity, |mapper| {
                mapper.delete_entity(entity)
            })?;
            summary.removed += 1;
        }

        info!(
            "event=uow_commit module=uow status=ok created={} updated={} removed={}",
            summary.created.len(),
            summary.updated,
            summary.removed
        );
        Ok(summary)
    }

    /// Binds a fresh, empty unit of work to this thread.
    ///
    /// Returns the previously bound unit of work, if any.
    pub fn new_current() -> UowResult<Option<UnitOfWork>> {
        Self::set_current(Some(UnitOfWork::new()))
    }

    /// Binds `unit` to this thread, or clears the binding with `None`.
    ///
    /// Returns the previously bound unit of work, if any.
    pub fn set_current(unit: Option<UnitOfWork>) -> UowResult<Option<UnitOfWork>> {
        CURRENT.with(|slot| {
            let mut slot = slot.borrow_mut();
            if matches!(*slot, Slot::Committing) {
                return Err(UowError::CommitInProgress);
            }
            let next = match unit {
                Some(unit) => Slot::Active(unit),
                None => Slot::Absent,
            };
            match std::mem::replace(&mut *slot, next) {
                Slot::Active(previous) => Ok(Some(previous)),
                Slot::Absent | Slot::Committing => Ok(None),
            }
        })
    }

    pub fn has_current() -> bool {
        CURRENT.with(|slot| matches!(*slot.borrow(), Slot::Active(_)))
    }

    /// Runs `f` against the current unit of work.
    ///
    /// `f` must not call back into the thread's unit-of-work API.
    pub fn with_current<R>(f: impl FnOnce(&mut UnitOfWork) -> R) -> UowResult<R> {
        CURRENT.with(|slot| match &mut *slot.borrow_mut() {
            Slot::Active(unit) => Ok(f(unit)),
            Slot::Absent => Err(UowError::NoActiveUnit),
            Slot::Committing => Err(UowError::CommitInProgress),
        })
    }

    /// Commits the current unit of work.
    ///
    /// While committing, registrations on this thread fail with
    /// `CommitInProgress`. Afterwards the thread keeps an empty, active unit
    /// of work until it is cleared.
    pub fn commit_current(registry: &MapperRegistry<'_>) -> UowResult<CommitSummary> {
        let mut unit = CURRENT.with(|slot| {
            let mut slot = slot.borrow_mut();
            match std::mem::replace(&mut *slot, Slot::Committing) {
                Slot::Active(unit) => Ok(unit),
                Slot::Absent => {
                    *slot = Slot::Absent;
                    Err(UowError::NoActiveUnit)
                }
                Slot::Committing => Err(UowError::CommitInProgress),
            }
        })?;

        let _reactivate = ReactivateOnDrop;
        unit.commit(registry)
    }
}

/// Scoped binding of a unit of work to the current thread.
///
/// Dropping the scope restores whatever was bound before `begin`, on every
/// exit path.
pub struct UnitOfWorkScope {
    previous: Option<UnitOfWork>,
    _thread_bound: PhantomData<*const ()>,
}

impl UnitOfWorkScope {
    pub fn begin() -> UowResult<Self> {
        let previous = UnitOfWork::new_current()?;
        Ok(Self {
            previous,
            _thread_bound: PhantomData,
        })
    }

    pub fn commit(&self, registry: &MapperRegistry<'_>) -> UowResult<CommitSummary> {
        UnitOfWork::commit_current(registry)
    }
}

impl Drop for UnitOfWorkScope {
    fn drop(&mut self) {
        let restored = self.previous.take().map_or(Slot::Absent, Slot::Active);
        let _ = CURRENT.try_with(|slot| {
            *slot.borrow_mut() = restored;
        });
    }
}

struct ReactivateOnDrop;

impl Drop for ReactivateOnDrop {
    fn drop(&mut self) {
        let _ = CURRENT.try_with(|slot| {
            let mut slot = slot.borrow_mut();
            if matches!(*slot, Slot::Committing) {
                *slot = Slot::Active(UnitOfWork::new());
            }
        });
    }
}

fn apply<T>(
    registry: &MapperRegistry<'_>,
    phase: CommitPhase,
    entity: &Entity,
    op: impl FnOnce(&dyn EntityMapper) -> Result<T, RepoError>,
) -> UowResult<T> {
    let result = registry.get_mapper(entity).and_then(|mapper| {
        let outcome = op(mapper.as_ref()).and_then(|value| mapper.flush().map(|()| value));
        if outcome.is_err() {
            if let Err(err) = mapper.discard() {
                warn!(
                    "event=uow_rollback module=uow status=error kind={} error={}",
                    entity.kind(),
                    err
                );
            }
        }
        outcome
    });

    result.map_err(|source| {
        error!(
            "event=uow_commit module=uow status=error phase={} kind={} id={:?} error={}",
            phase.as_str(),
            entity.kind(),
            entity.id(),
            source
        );
        UowError::Operation {
            phase,
            kind: entity.kind(),
            id: entity.id(),
            source,
        }
    })
}
