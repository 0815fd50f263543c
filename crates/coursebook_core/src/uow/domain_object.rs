//! Self-registration of entities into the thread's current unit of work.
//!
//! Marking only stages intent; nothing reaches the store until the unit of
//! work commits. Marking without an active unit of work is an error.

use super::{UnitOfWork, UowResult};
use crate::model::category::Category;
use crate::model::course::Course;
use crate::model::course_student::CourseStudent;
use crate::model::person::Person;
use crate::model::Entity;

pub trait DomainObject: Clone + Into<Entity> {
    /// Stages a snapshot of `self` for insertion.
    fn mark_new(&self) -> UowResult<()> {
        let entity = self.clone().into();
        UnitOfWork::with_current(|unit| unit.register_new(entity))
    }

    /// Stages a snapshot of `self` for a full-row update.
    fn mark_dirty(&self) -> UowResult<()> {
        let entity = self.clone().into();
        UnitOfWork::with_current(|unit| unit.register_dirty(entity))
    }

    /// Stages a snapshot of `self` for deletion.
    fn mark_removed(&self) -> UowResult<()> {
        let entity = self.clone().into();
        UnitOfWork::with_current(|unit| unit.register_removed(entity))
    }
}

impl DomainObject for Entity {}
impl DomainObject for Person {}
impl DomainObject for Category {}
impl DomainObject for Course {}
impl DomainObject for CourseStudent {}
