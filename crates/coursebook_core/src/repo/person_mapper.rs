//! Mapper for students and teachers.
//!
//! Both variants share one row shape; the variant selects the backing table.

use super::gateway::{checked_row, text, TableGateway, TableSpec};
use super::{Filter, MappedEntity, Mapper, RepoResult};
use crate::model::person::{Person, PersonKind};
use crate::model::{Entity, EntityId, EntityKind};
use rusqlite::{Connection, Row};

const PERSON_COLUMNS: &[&str] = &["firstname", "lastname", "email"];

const STUDENTS: TableSpec = TableSpec {
    name: "students",
    columns: PERSON_COLUMNS,
};

const TEACHERS: TableSpec = TableSpec {
    name: "teachers",
    columns: PERSON_COLUMNS,
};

pub struct PersonMapper<'conn> {
    person_kind: PersonKind,
    table: &'static str,
    gateway: TableGateway<'conn>,
}

impl<'conn> PersonMapper<'conn> {
    pub fn new(conn: &'conn Connection, person_kind: PersonKind) -> Self {
        let (kind, table) = match person_kind {
            PersonKind::Student => (EntityKind::Student, STUDENTS),
            PersonKind::Teacher => (EntityKind::Teacher, TEACHERS),
        };
        Self {
            person_kind,
            table: table.name,
            gateway: TableGateway::new(conn, kind, table),
        }
    }

    pub fn students(conn: &'conn Connection) -> Self {
        Self::new(conn, PersonKind::Student)
    }

    pub fn teachers(conn: &'conn Connection) -> Self {
        Self::new(conn, PersonKind::Teacher)
    }

    fn parse_row(&self, row: &Row<'_>) -> RepoResult<Person> {
        let person = Person {
            id: Some(row.get("id")?),
            kind: self.person_kind,
            firstname: row.get("firstname")?,
            lastname: row.get("lastname")?,
            email: row.get("email")?,
        };
        checked_row(self.table, person, Person::validate)
    }
}

impl Mapper for PersonMapper<'_> {
    type Entity = Person;

    fn kind(&self) -> EntityKind {
        self.gateway.kind()
    }

    fn create(&self, person: &Person) -> RepoResult<EntityId> {
        person.validate()?;
        self.gateway.insert(vec![
            text(&person.firstname),
            text(&person.lastname),
            text(&person.email),
        ])
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<Person> {
        self.gateway.select_one(id, |row| self.parse_row(row))
    }

    fn get_by_filter(&self, filter: &Filter) -> RepoResult<Vec<Person>> {
        self.gateway.select(filter, |row| self.parse_row(row))
    }

    fn update(&self, person: &Person) -> RepoResult<()> {
        person.validate()?;
        self.gateway.update(
            person.id,
            vec![
                text(&person.firstname),
                text(&person.lastname),
                text(&person.email),
            ],
        )
    }

    fn delete(&self, person: &Person) -> RepoResult<()> {
        self.gateway.delete(person.id)
    }

    fn commit(&self) -> RepoResult<()> {
        self.gateway.commit()
    }

    fn rollback(&self) -> RepoResult<()> {
        self.gateway.rollback()
    }
}

impl MappedEntity for Person {
    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::Person(person) => Some(person),
            _ => None,
        }
    }
}
