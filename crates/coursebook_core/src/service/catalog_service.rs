//! Course catalog use cases.
//!
//! Single-entity writes go straight through a mapper. Multi-entity changes
//! are staged in a scoped unit of work and committed together.

use super::{ServiceError, ServiceResult};
use crate::logging::audit;
use crate::model::category::{Category, UNCATEGORIZED_ID};
use crate::model::course::Course;
use crate::model::course_student::CourseStudent;
use crate::model::person::{Person, PersonKind};
use crate::model::{Entity, EntityId};
use crate::observer::Observer;
use crate::repo::category_mapper::CategoryMapper;
use crate::repo::course_mapper::CourseMapper;
use crate::repo::course_student_mapper::{enrolled_students, CourseStudentMapper};
use crate::repo::person_mapper::PersonMapper;
use crate::repo::registry::MapperRegistry;
use crate::repo::{EntityMapper, Mapper, RepoResult};
use crate::uow::domain_object::DomainObject;
use crate::uow::{CommitSummary, UnitOfWorkScope};
use log::error;
use rusqlite::Connection;
use std::sync::Arc;

pub struct CatalogService<'conn> {
    registry: MapperRegistry<'conn>,
}

impl<'conn> CatalogService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_registry(MapperRegistry::new(conn))
    }

    pub fn with_registry(registry: MapperRegistry<'conn>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MapperRegistry<'conn> {
        &self.registry
    }

    /// Subscribes an observer to course changes made through this service.
    pub fn attach_course_observer(&self, observer: Arc<dyn Observer>) -> bool {
        self.registry.course_subject().attach(observer)
    }

    pub fn detach_course_observer(&self, observer: &Arc<dyn Observer>) -> bool {
        self.registry.course_subject().detach(observer)
    }

    pub fn add_person(&self, person: &Person) -> RepoResult<EntityId> {
        let id = self.create(person.clone().into())?;
        audit("catalog", &format!("added {:?} {person} id={id}", person.kind));
        Ok(id)
    }

    pub fn add_category(&self, category: &Category) -> RepoResult<EntityId> {
        let id = self.create(category.clone().into())?;
        audit("catalog", &format!("added category {category} id={id}"));
        Ok(id)
    }

    pub fn add_course(&self, course: &Course) -> RepoResult<EntityId> {
        let id = self.create(course.clone().into())?;
        audit("catalog", &format!("added course {course} id={id}"));
        Ok(id)
    }

    /// Creates a copy of an existing course, optionally under a new title.
    pub fn copy_course(&self, course_id: EntityId, title: Option<&str>) -> RepoResult<EntityId> {
        let mut copy = self.courses().get_by_id(course_id)?.clone_transient();
        if let Some(title) = title {
            copy.title = title.to_string();
        }
        let id = self.create(copy.into())?;
        audit("catalog", &format!("copied course {course_id} into {id}"));
        Ok(id)
    }

    /// Renames a course. Course observers are notified after the commit.
    pub fn rename_course(&self, course_id: EntityId, title: &str) -> ServiceResult<CommitSummary> {
        let mut course = self.courses().get_by_id(course_id)?;
        course.title = title.to_string();
        self.run_batch("rename_course", || Ok(course.mark_dirty()?))
    }

    /// Enrolls a student. Both sides must exist.
    pub fn enroll(&self, course_id: EntityId, student_id: EntityId) -> RepoResult<EntityId> {
        self.courses().get_by_id(course_id)?;
        PersonMapper::students(self.registry.conn()).get_by_id(student_id)?;
        let id = self.create(CourseStudent::new(course_id, student_id).into())?;
        audit(
            "catalog",
            &format!("enrolled student {student_id} in course {course_id}"),
        );
        Ok(id)
    }

    pub fn enrolled_students(&self, course_id: EntityId) -> RepoResult<Vec<Person>> {
        enrolled_students(self.registry.conn(), course_id)
    }

    pub fn list_people(&self, kind: PersonKind) -> RepoResult<Vec<Person>> {
        PersonMapper::new(self.registry.conn(), kind).get_all()
    }

    pub fn list_categories(&self) -> RepoResult<Vec<Category>> {
        CategoryMapper::new(self.registry.conn()).get_all()
    }

    pub fn list_courses(&self) -> RepoResult<Vec<Course>> {
        self.courses().get_all()
    }

    /// Removes a category and moves its courses to [`UNCATEGORIZED_ID`].
    pub fn remove_category(&self, category_id: EntityId) -> ServiceResult<CommitSummary> {
        let category = CategoryMapper::new(self.registry.conn()).get_by_id(category_id)?;
        let orphans = self.courses().in_category(category_id)?;
        self.run_batch("remove_category", || {
            for mut course in orphans {
                course.category_id = UNCATEGORIZED_ID;
                course.mark_dirty()?;
            }
            category.mark_removed()?;
            Ok(())
        })
    }

    /// Removes a course together with its enrollments.
    pub fn remove_course(&self, course_id: EntityId) -> ServiceResult<CommitSummary> {
        let course = self.courses().get_by_id(course_id)?;
        let enrollments = CourseStudentMapper::new(self.registry.conn()).for_course(course_id)?;
        self.run_batch("remove_course", || {
            for link in &enrollments {
                link.mark_removed()?;
            }
            course.mark_removed()?;
            Ok(())
        })
    }

    fn courses(&self) -> CourseMapper<'conn> {
        CourseMapper::with_subject(self.registry.conn(), Arc::clone(self.registry.course_subject()))
    }

    fn create(&self, entity: Entity) -> RepoResult<EntityId> {
        let mapper = self.registry.get_mapper(&entity)?;
        let id = mapper.create_entity(&entity)?;
        mapper.flush()?;
        Ok(id)
    }

    /// Stages through `stage` inside a fresh unit of work and commits it.
    ///
    /// The unit of work is cleared on every exit path; failures are logged.
    fn run_batch(
        &self,
        use_case: &str,
        stage: impl FnOnce() -> ServiceResult<()>,
    ) -> ServiceResult<CommitSummary> {
        let scope = UnitOfWorkScope::begin()?;
        let result = stage().and_then(|()| scope.commit(&self.registry).map_err(ServiceError::from));

        match &result {
            Ok(summary) => audit(
                "catalog",
                &format!(
                    "{use_case} committed created={} updated={} removed={}",
                    summary.created.len(),
                    summary.updated,
                    summary.removed
                ),
            ),
            Err(err) => error!(
                "event=catalog_batch module=service status=error use_case={use_case} error={err}"
            ),
        }
        result
    }
}
