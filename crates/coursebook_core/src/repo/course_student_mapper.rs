//! Mapper for course enrollments.

use super::gateway::{checked_row, TableGateway, TableSpec};
use super::{Filter, MappedEntity, Mapper, RepoResult};
use super::person_mapper::PersonMapper;
use crate::model::course_student::CourseStudent;
use crate::model::person::Person;
use crate::model::{Entity, EntityId, EntityKind};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

const COURSES_STUDENTS: TableSpec = TableSpec {
    name: "courses_students",
    columns: &["course_id", "student_id"],
};

pub struct CourseStudentMapper<'conn> {
    gateway: TableGateway<'conn>,
}

impl<'conn> CourseStudentMapper<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            gateway: TableGateway::new(conn, EntityKind::CourseStudent, COURSES_STUDENTS),
        }
    }

    /// Enrollments of one course.
    pub fn for_course(&self, course_id: EntityId) -> RepoResult<Vec<CourseStudent>> {
        self.get_by_key("course_id", Value::Integer(course_id))
    }
}

impl Mapper for CourseStudentMapper<'_> {
    type Entity = CourseStudent;

    fn kind(&self) -> EntityKind {
        EntityKind::CourseStudent
    }

    fn create(&self, link: &CourseStudent) -> RepoResult<EntityId> {
        link.validate()?;
        self.gateway.insert(link_values(link))
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<CourseStudent> {
        self.gateway.select_one(id, parse_link_row)
    }

    fn get_by_filter(&self, filter: &Filter) -> RepoResult<Vec<CourseStudent>> {
        self.gateway.select(filter, parse_link_row)
    }

    fn update(&self, link: &CourseStudent) -> RepoResult<()> {
        link.validate()?;
        self.gateway.update(link.id, link_values(link))
    }

    fn delete(&self, link: &CourseStudent) -> RepoResult<()> {
        self.gateway.delete(link.id)
    }

    fn commit(&self) -> RepoResult<()> {
        self.gateway.commit()
    }

    fn rollback(&self) -> RepoResult<()> {
        self.gateway.rollback()
    }
}

impl MappedEntity for CourseStudent {
    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::CourseStudent(link) => Some(link),
            _ => None,
        }
    }
}

fn link_values(link: &CourseStudent) -> Vec<Value> {
    vec![Value::Integer(link.course_id), Value::Integer(link.student_id)]
}

fn parse_link_row(row: &Row<'_>) -> RepoResult<CourseStudent> {
    let link = CourseStudent {
        id: Some(row.get("id")?),
        course_id: row.get("course_id")?,
        student_id: row.get("student_id")?,
    };
    checked_row(COURSES_STUDENTS.name, link, CourseStudent::validate)
}

/// Students enrolled in `course_id`, resolved through `courses_students`.
///
/// A dangling enrollment surfaces as `NotFound` for the missing student.
pub fn enrolled_students(conn: &Connection, course_id: EntityId) -> RepoResult<Vec<Person>> {
    let students = PersonMapper::students(conn);
    CourseStudentMapper::new(conn)
        .for_course(course_id)?
        .into_iter()
        .map(|link| students.get_by_id(link.student_id))
        .collect()
}
