//! Mapper registry: type tag to mapper constructor.
//!
//! # Responsibility
//! - Resolve a fresh mapper by typed tag, by type name, or by an entity's
//!   runtime type.
//! - Share one course observer set across every course mapper it builds.
//!
//! # Invariants
//! - Unregistered tags fail with `MapperNotFound`; there is no fallback mapper.
//! - Mapper instances are never cached; each lookup constructs a new one
//!   bound to the registry's connection.
//! - The built-in constructor table is initialized on first use and never
//!   mutated; registries copy it and may extend their own copy.

use super::category_mapper::CategoryMapper;
use super::course_mapper::CourseMapper;
use super::course_student_mapper::CourseStudentMapper;
use super::person_mapper::PersonMapper;
use super::{EntityMapper, RepoError, RepoResult};
use crate::model::{Entity, EntityKind};
use crate::observer::ChangeSubject;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor for a type-erased mapper bound to `conn`.
///
/// The subject argument is the registry-wide course observer set; mappers
/// that do not emit changes ignore it.
pub type MapperFactory =
    for<'c> fn(&'c Connection, &Arc<ChangeSubject>) -> Box<dyn EntityMapper + 'c>;

static BUILTIN_FACTORIES: Lazy<HashMap<EntityKind, MapperFactory>> = Lazy::new(|| {
    let mut factories: HashMap<EntityKind, MapperFactory> = HashMap::new();
    factories.insert(EntityKind::Student, student_mapper);
    factories.insert(EntityKind::Teacher, teacher_mapper);
    factories.insert(EntityKind::Category, category_mapper);
    factories.insert(EntityKind::Course, course_mapper);
    factories.insert(EntityKind::CourseStudent, course_student_mapper);
    factories
});

/// Built-in constructors for every catalog entity type.
pub fn builtin_factories() -> &'static HashMap<EntityKind, MapperFactory> {
    &BUILTIN_FACTORIES
}

pub struct MapperRegistry<'conn> {
    conn: &'conn Connection,
    factories: HashMap<EntityKind, MapperFactory>,
    course_subject: Arc<ChangeSubject>,
}

impl<'conn> MapperRegistry<'conn> {
    /// Registry with every built-in mapper registered.
    pub fn new(conn: &'conn Connection) -> Self {
        let mut registry = Self::empty(conn);
        registry.factories = builtin_factories().clone();
        registry
    }

    /// Registry with no mappers registered.
    pub fn empty(conn: &'conn Connection) -> Self {
        Self {
            conn,
            factories: HashMap::new(),
            course_subject: Arc::new(ChangeSubject::new()),
        }
    }

    /// Registers or replaces the constructor for `kind`.
    ///
    /// Returns the replaced constructor, if any.
    pub fn register(&mut self, kind: EntityKind, factory: MapperFactory) -> Option<MapperFactory> {
        self.factories.insert(kind, factory)
    }

    pub fn is_registered(&self, kind: EntityKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Registered tags in declaration order of `EntityKind`.
    pub fn registered_kinds(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = self.factories.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn conn(&self) -> &'conn Connection {
        self.conn
    }

    /// Observer set notified by every course mapper this registry builds.
    pub fn course_subject(&self) -> &Arc<ChangeSubject> {
        &self.course_subject
    }

    pub fn get_mapper_by_kind(&self, kind: EntityKind) -> RepoResult<Box<dyn EntityMapper + 'conn>> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| RepoError::MapperNotFound(kind.as_str().to_string()))?;
        Ok(factory(self.conn, &self.course_subject))
    }

    /// Resolves a mapper from a type name such as `"Course"`.
    pub fn get_mapper_by_name(&self, name: &str) -> RepoResult<Box<dyn EntityMapper + 'conn>> {
        let kind =
            EntityKind::parse(name).ok_or_else(|| RepoError::MapperNotFound(name.to_string()))?;
        self.get_mapper_by_kind(kind)
    }

    /// Resolves a mapper from the entity's runtime type.
    pub fn get_mapper(&self, entity: &Entity) -> RepoResult<Box<dyn EntityMapper + 'conn>> {
        self.get_mapper_by_kind(entity.kind())
    }
}

fn student_mapper<'c>(conn: &'c Connection, _: &Arc<ChangeSubject>) -> Box<dyn EntityMapper + 'c> {
    Box::new(PersonMapper::students(conn))
}

fn teacher_mapper<'c>(conn: &'c Connection, _: &Arc<ChangeSubject>) -> Box<dyn EntityMapper + 'c> {
    Box::new(PersonMapper::teachers(conn))
}

fn category_mapper<'c>(
    conn: &'c Connection,
    _: &Arc<ChangeSubject>,
) -> Box<dyn EntityMapper + 'c> {
    Box::new(CategoryMapper::new(conn))
}

fn course_mapper<'c>(
    conn: &'c Connection,
    subject: &Arc<ChangeSubject>,
) -> Box<dyn EntityMapper + 'c> {
    Box::new(CourseMapper::with_subject(conn, Arc::clone(subject)))
}

fn course_student_mapper<'c>(
    conn: &'c Connection,
    _: &Arc<ChangeSubject>,
) -> Box<dyn EntityMapper + 'c> {
    Box::new(CourseStudentMapper::new(conn))
}

#[cfg(test)]
mod tests {
    use super::MapperRegistry;
    use crate::db::open_db_in_memory;
    use crate::model::category::Category;
    use crate::model::person::Person;
    use crate::model::{Entity, EntityKind};
    use crate::repo::RepoError;

    #[test]
    fn unknown_name_fails_with_mapper_not_found() {
        let conn = open_db_in_memory().unwrap();
        let registry = MapperRegistry::new(&conn);

        let err = registry.get_mapper_by_name("Bogus").err().unwrap();
        assert!(matches!(err, RepoError::MapperNotFound(name) if name == "Bogus"));
    }

    #[test]
    fn resolves_by_name_and_by_runtime_type() {
        let conn = open_db_in_memory().unwrap();
        let registry = MapperRegistry::new(&conn);

        let by_name = registry.get_mapper_by_name("Category").unwrap();
        assert_eq!(by_name.entity_kind(), EntityKind::Category);

        let teacher = Entity::from(Person::teacher("Alan", "Turing", "alan@example.com"));
        let by_entity = registry.get_mapper(&teacher).unwrap();
        assert_eq!(by_entity.entity_kind(), EntityKind::Teacher);
    }

    #[test]
    fn empty_registry_never_falls_back() {
        let conn = open_db_in_memory().unwrap();
        let registry = MapperRegistry::empty(&conn);

        let entity = Entity::from(Category::new("Math", "MTH", "Algebra"));
        let err = registry.get_mapper(&entity).err().unwrap();
        assert!(matches!(err, RepoError::MapperNotFound(name) if name == "Category"));
        assert!(registry.registered_kinds().is_empty());
    }

    #[test]
    fn type_erased_mapper_round_trips_entities() {
        let conn = open_db_in_memory().unwrap();
        let registry = MapperRegistry::new(&conn);
        let entity = Entity::from(Category::new("Math", "MTH", "Algebra"));

        let mapper = registry.get_mapper(&entity).unwrap();
        let id = mapper.create_entity(&entity).unwrap();
        mapper.flush().unwrap();

        let loaded = mapper.get_entity(id).unwrap();
        assert_eq!(loaded.kind(), EntityKind::Category);
        assert_eq!(loaded.id(), Some(id));
        assert_eq!(mapper.get_all_entities().unwrap(), vec![loaded]);
    }

    #[test]
    fn type_erased_mapper_rejects_other_entity_types() {
        let conn = open_db_in_memory().unwrap();
        let registry = MapperRegistry::new(&conn);
        let mapper = registry.get_mapper_by_kind(EntityKind::Course).unwrap();

        let student = Entity::from(Person::student("Ada", "Lovelace", "ada@example.com"));
        let err = mapper.create_entity(&student).unwrap_err();
        assert!(matches!(
            err,
            RepoError::EntityMismatch {
                expected: EntityKind::Course,
                actual: EntityKind::Student,
            }
        ));
        mapper.discard().unwrap();
    }

    #[test]
    fn register_extends_an_empty_registry() {
        let conn = open_db_in_memory().unwrap();
        let mut registry = MapperRegistry::empty(&conn);
        let factory = super::builtin_factories()[&EntityKind::Category];

        assert!(registry.register(EntityKind::Category, factory).is_none());
        assert!(registry.is_registered(EntityKind::Category));
        assert!(registry.get_mapper_by_name("Category").is_ok());
        assert!(registry.get_mapper_by_name("Course").is_err());
    }
}
