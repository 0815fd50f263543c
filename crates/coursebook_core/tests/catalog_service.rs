use coursebook_core::db::open_db_in_memory;
use coursebook_core::{
    CatalogService, Category, CategoryMapper, Course, CourseMapper, CourseStudentMapper,
    EntityId, Mapper, Observer, Person, PersonKind, RepoError, RepoResult, ServiceError,
    UnitOfWork, UNCATEGORIZED_ID,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<EntityId>>,
}

impl Observer for RecordingObserver {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_update(&self, _store: &Connection, subject_id: EntityId) -> RepoResult<()> {
        self.seen.lock().unwrap().push(subject_id);
        Ok(())
    }
}

#[test]
fn add_and_list_catalog_entries() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(&conn);

    let maths = service
        .add_category(&Category::new("Mathematics", "MATH", "Numbers"))
        .unwrap();
    let course = service
        .add_course(&Course::new("Algebra I", maths, "Groups and rings"))
        .unwrap();
    service
        .add_person(&Person::teacher("Emmy", "Noether", "emmy@example.com"))
        .unwrap();
    service
        .add_person(&Person::student("Ada", "Lovelace", "ada@example.com"))
        .unwrap();

    let categories = service.list_categories().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].short_title, "MATH");

    let courses = service.list_courses().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].id, Some(course));
    assert_eq!(courses[0].category_id, maths);

    assert_eq!(service.list_people(PersonKind::Teacher).unwrap().len(), 1);
    assert_eq!(service.list_people(PersonKind::Student).unwrap().len(), 1);
}

#[test]
fn invalid_entity_is_rejected_before_insert() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(&conn);

    let err = service
        .add_person(&Person::student("Ada", "Lovelace", "not-an-email"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(service.list_people(PersonKind::Student).unwrap().is_empty());
}

#[test]
fn rename_course_commits_and_notifies_observers() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(&conn);
    let observer = Arc::new(RecordingObserver::default());
    assert!(service.attach_course_observer(observer.clone()));

    let id = service
        .add_course(&Course::new("Algebra I", 2, ""))
        .unwrap();
    assert!(observer.seen.lock().unwrap().is_empty());

    let summary = service.rename_course(id, "Algebra II").unwrap();
    assert_eq!(summary.updated, 1);
    assert!(summary.created.is_empty());
    assert_eq!(summary.removed, 0);

    assert_eq!(CourseMapper::new(&conn).get_by_id(id).unwrap().title, "Algebra II");
    assert_eq!(*observer.seen.lock().unwrap(), vec![id]);
    assert!(!UnitOfWork::has_current());
}

#[test]
fn detached_course_observer_is_not_notified() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(&conn);
    let observer: Arc<dyn Observer> = Arc::new(RecordingObserver::default());
    service.attach_course_observer(observer.clone());
    assert!(service.detach_course_observer(&observer));
    assert!(!service.detach_course_observer(&observer));

    let id = service
        .add_course(&Course::new("Algebra I", 2, ""))
        .unwrap();
    service.rename_course(id, "Algebra II").unwrap();
    assert!(service.registry().course_subject().is_empty());
}

#[test]
fn rename_unknown_course_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(&conn);

    let err = service.rename_course(42, "Nothing").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::NotFound { id: 42, .. })
    ));
    assert!(!UnitOfWork::has_current());
}

#[test]
fn copy_course_keeps_fields_and_gets_new_identity() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(&conn);
    let original = service
        .add_course(&Course::new("Algebra I", 3, "Groups"))
        .unwrap();

    let same_title = service.copy_course(original, None).unwrap();
    let renamed = service.copy_course(original, Some("Algebra I (copy)")).unwrap();
    assert_ne!(same_title, original);
    assert_ne!(renamed, same_title);

    let mapper = CourseMapper::new(&conn);
    let copy = mapper.get_by_id(same_title).unwrap();
    assert_eq!(copy.title, "Algebra I");
    assert_eq!(copy.category_id, 3);
    assert_eq!(copy.description, "Groups");
    assert_eq!(mapper.get_by_id(renamed).unwrap().title, "Algebra I (copy)");
    assert_eq!(mapper.get_all().unwrap().len(), 3);
}

#[test]
fn enroll_requires_existing_course_and_student() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(&conn);
    let course = service
        .add_course(&Course::new("Algebra I", 1, ""))
        .unwrap();
    let student = service
        .add_person(&Person::student("Ada", "Lovelace", "ada@example.com"))
        .unwrap();

    assert!(matches!(
        service.enroll(course + 100, student),
        Err(RepoError::NotFound { .. })
    ));
    assert!(matches!(
        service.enroll(course, student + 100),
        Err(RepoError::NotFound { .. })
    ));

    service.enroll(course, student).unwrap();
    let enrolled = service.enrolled_students(course).unwrap();
    assert_eq!(enrolled.len(), 1);
    assert_eq!(enrolled[0].email, "ada@example.com");
}

#[test]
fn remove_category_moves_courses_to_uncategorized() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(&conn);
    let maths = service
        .add_category(&Category::new("Mathematics", "MATH", ""))
        .unwrap();
    let arts = service
        .add_category(&Category::new("Arts", "ART", ""))
        .unwrap();
    let algebra = service
        .add_course(&Course::new("Algebra", maths, ""))
        .unwrap();
    let geometry = service
        .add_course(&Course::new("Geometry", maths, ""))
        .unwrap();
    let painting = service
        .add_course(&Course::new("Painting", arts, ""))
        .unwrap();

    let summary = service.remove_category(maths).unwrap();
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.removed, 1);

    let categories = CategoryMapper::new(&conn).get_all().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, Some(arts));

    let courses = CourseMapper::new(&conn);
    assert_eq!(courses.get_by_id(algebra).unwrap().category_id, UNCATEGORIZED_ID);
    assert_eq!(courses.get_by_id(geometry).unwrap().category_id, UNCATEGORIZED_ID);
    assert_eq!(courses.get_by_id(painting).unwrap().category_id, arts);
}

#[test]
fn remove_course_drops_its_enrollments() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(&conn);
    let algebra = service
        .add_course(&Course::new("Algebra", 1, ""))
        .unwrap();
    let geometry = service
        .add_course(&Course::new("Geometry", 1, ""))
        .unwrap();
    let ada = service
        .add_person(&Person::student("Ada", "Lovelace", "ada@example.com"))
        .unwrap();
    let grace = service
        .add_person(&Person::student("Grace", "Hopper", "grace@example.com"))
        .unwrap();
    service.enroll(algebra, ada).unwrap();
    service.enroll(algebra, grace).unwrap();
    service.enroll(geometry, ada).unwrap();

    let summary = service.remove_course(algebra).unwrap();
    assert_eq!(summary.removed, 3);

    assert!(matches!(
        CourseMapper::new(&conn).get_by_id(algebra),
        Err(RepoError::NotFound { .. })
    ));
    let links = CourseStudentMapper::new(&conn);
    assert!(links.for_course(algebra).unwrap().is_empty());
    assert_eq!(links.for_course(geometry).unwrap().len(), 1);
    assert_eq!(service.list_people(PersonKind::Student).unwrap().len(), 2);
}
