//! Mapper for courses. Also the change source for course observers.
//!
//! # Invariants
//! - `update` only records the changed identity; observers are notified
//!   after `commit` succeeds, once per recorded update.
//! - A failed commit or a rollback discards the recorded notifications.

use super::gateway::{checked_row, text, TableGateway, TableSpec};
use super::{Filter, MappedEntity, Mapper, RepoResult};
use crate::model::course::Course;
use crate::model::{Entity, EntityId, EntityKind};
use crate::observer::{ChangeSubject, NotifyReport, Observer};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use std::cell::RefCell;
use std::sync::Arc;

const COURSES: TableSpec = TableSpec {
    name: "courses",
    columns: &["title", "category_id", "description"],
};

pub struct CourseMapper<'conn> {
    gateway: TableGateway<'conn>,
    subject: Arc<ChangeSubject>,
    pending_notifications: RefCell<Vec<EntityId>>,
}

impl<'conn> CourseMapper<'conn> {
    /// Mapper with its own, initially empty, observer set.
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_subject(conn, Arc::new(ChangeSubject::new()))
    }

    /// Mapper notifying through a shared observer set.
    pub fn with_subject(conn: &'conn Connection, subject: Arc<ChangeSubject>) -> Self {
        Self {
            gateway: TableGateway::new(conn, EntityKind::Course, COURSES),
            subject,
            pending_notifications: RefCell::new(Vec::new()),
        }
    }

    pub fn subject(&self) -> &Arc<ChangeSubject> {
        &self.subject
    }

    pub fn attach(&self, observer: Arc<dyn Observer>) -> bool {
        self.subject.attach(observer)
    }

    pub fn detach(&self, observer: &Arc<dyn Observer>) -> bool {
        self.subject.detach(observer)
    }

    /// Courses filed under one category.
    pub fn in_category(&self, category_id: EntityId) -> RepoResult<Vec<Course>> {
        self.get_by_key("category_id", Value::Integer(category_id))
    }

    fn notify_pending(&self) -> NotifyReport {
        let pending = std::mem::take(&mut *self.pending_notifications.borrow_mut());
        let mut total = NotifyReport::default();
        for course_id in pending {
            let report = self.subject.notify(self.gateway.conn(), course_id);
            total.delivered += report.delivered;
            total.failed += report.failed;
        }
        total
    }
}

impl Mapper for CourseMapper<'_> {
    type Entity = Course;

    fn kind(&self) -> EntityKind {
        EntityKind::Course
    }

    fn create(&self, course: &Course) -> RepoResult<EntityId> {
        course.validate()?;
        self.gateway.insert(course_values(course))
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<Course> {
        self.gateway.select_one(id, parse_course_row)
    }

    fn get_by_filter(&self, filter: &Filter) -> RepoResult<Vec<Course>> {
        self.gateway.select(filter, parse_course_row)
    }

    fn update(&self, course: &Course) -> RepoResult<()> {
        course.validate()?;
        self.gateway.update(course.id, course_values(course))?;
        if let Some(id) = course.id {
            self.pending_notifications.borrow_mut().push(id);
        }
        Ok(())
    }

    fn delete(&self, course: &Course) -> RepoResult<()> {
        self.gateway.delete(course.id)
    }

    fn commit(&self) -> RepoResult<()> {
        if let Err(err) = self.gateway.commit() {
            self.pending_notifications.borrow_mut().clear();
            return Err(err);
        }
        let report = self.notify_pending();
        if report.delivered + report.failed > 0 {
            debug!(
                "event=course_notify module=repo status=done delivered={} failed={}",
                report.delivered, report.failed
            );
        }
        Ok(())
    }

    fn rollback(&self) -> RepoResult<()> {
        self.pending_notifications.borrow_mut().clear();
        self.gateway.rollback()
    }
}

impl MappedEntity for Course {
    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::Course(course) => Some(course),
            _ => None,
        }
    }
}

fn course_values(course: &Course) -> Vec<Value> {
    vec![
        text(&course.title),
        Value::Integer(course.category_id),
        text(&course.description),
    ]
}

fn parse_course_row(row: &Row<'_>) -> RepoResult<Course> {
    let course = Course {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        category_id: row.get("category_id")?,
        description: row.get("description")?,
    };
    checked_row(COURSES.name, course, Course::validate)
}
