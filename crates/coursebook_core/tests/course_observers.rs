use coursebook_core::db::open_db_in_memory;
use coursebook_core::{
    enrolled_students, ChannelMessage, ChannelObserver, Course, CourseMapper, CourseStudent,
    CourseStudentMapper, EntityId, Mapper, MessageSink, NotificationChannel, Observer, Person,
    PersonMapper, RepoError, RepoResult,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    messages: Mutex<Vec<ChannelMessage>>,
}

impl CollectingSink {
    fn take(&self) -> Vec<ChannelMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }
}

impl MessageSink for CollectingSink {
    fn deliver(&self, message: ChannelMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

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

/// Course 5 "Algebra I" in category 2 with two enrolled students and one
/// student enrolled elsewhere.
fn seed_course_five(conn: &Connection) -> (EntityId, EntityId) {
    conn.execute(
        "INSERT INTO courses (id, title, category_id, description) VALUES (5, 'Algebra I', 2, '');",
        [],
    )
    .unwrap();
    let students = PersonMapper::students(conn);
    let ada = students
        .create(&Person::student("Ada", "Lovelace", "ada@example.com"))
        .unwrap();
    let grace = students
        .create(&Person::student("Grace", "Hopper", "grace@example.com"))
        .unwrap();
    let other = students
        .create(&Person::student("Edsger", "Dijkstra", "ewd@example.com"))
        .unwrap();

    let links = CourseStudentMapper::new(conn);
    links.create(&CourseStudent::new(5, ada)).unwrap();
    links.create(&CourseStudent::new(5, grace)).unwrap();
    links.create(&CourseStudent::new(6, other)).unwrap();
    links.commit().unwrap();
    (ada, grace)
}

#[test]
fn course_update_notifies_every_channel_per_enrolled_student() {
    let conn = open_db_in_memory().unwrap();
    let (ada, grace) = seed_course_five(&conn);

    let sink = Arc::new(CollectingSink::default());
    let mapper = CourseMapper::new(&conn);
    mapper.attach(Arc::new(ChannelObserver::new(
        NotificationChannel::Sms,
        sink.clone(),
    )));
    mapper.attach(Arc::new(ChannelObserver::new(
        NotificationChannel::Email,
        sink.clone(),
    )));

    let mut course = mapper.get_by_id(5).unwrap();
    course.title = "Algebra II".to_string();
    mapper.update(&course).unwrap();
    assert!(sink.take().is_empty(), "no notification before commit");

    mapper.commit().unwrap();
    let mut messages = sink.take();
    messages.sort_by_key(|message| (message.channel.as_str(), message.student_id));

    assert_eq!(messages.len(), 4);
    assert!(messages.iter().all(|message| message.course_id == 5));
    assert!(messages
        .iter()
        .all(|message| message.body.contains("\"Algebra II\"")));

    let email: Vec<_> = messages
        .iter()
        .filter(|message| message.channel == NotificationChannel::Email)
        .map(|message| (message.student_id, message.recipient.as_str()))
        .collect();
    assert_eq!(
        email,
        vec![
            (Some(ada), "ada@example.com"),
            (Some(grace), "grace@example.com")
        ]
    );

    let sms: Vec<_> = messages
        .iter()
        .filter(|message| message.channel == NotificationChannel::Sms)
        .map(|message| message.recipient.as_str())
        .collect();
    assert_eq!(sms, vec!["Lovelace", "Hopper"]);
}

#[test]
fn both_observers_receive_changed_identity() {
    let conn = open_db_in_memory().unwrap();
    seed_course_five(&conn);

    let first = Arc::new(RecordingObserver::default());
    let second = Arc::new(RecordingObserver::default());
    let mapper = CourseMapper::new(&conn);
    mapper.attach(first.clone());
    mapper.attach(second.clone());

    let mut course = mapper.get_by_id(5).unwrap();
    course.title = "Algebra II".to_string();
    mapper.update(&course).unwrap();
    mapper.commit().unwrap();

    assert_eq!(*first.seen.lock().unwrap(), vec![5]);
    assert_eq!(*second.seen.lock().unwrap(), vec![5]);
}

#[test]
fn notifications_are_sent_once_per_commit() {
    let conn = open_db_in_memory().unwrap();
    seed_course_five(&conn);

    let observer = Arc::new(RecordingObserver::default());
    let mapper = CourseMapper::new(&conn);
    mapper.attach(observer.clone());

    let course = mapper.get_by_id(5).unwrap();
    mapper.update(&course).unwrap();
    mapper.commit().unwrap();
    mapper.commit().unwrap();

    assert_eq!(*observer.seen.lock().unwrap(), vec![5]);
}

#[test]
fn failed_update_does_not_notify() {
    let conn = open_db_in_memory().unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let mapper = CourseMapper::new(&conn);
    mapper.attach(observer.clone());

    let mut ghost = Course::new("Ghost", 1, "");
    ghost.id = Some(77);
    assert!(matches!(
        mapper.update(&ghost),
        Err(RepoError::NotFound { id: 77, .. })
    ));
    mapper.commit().unwrap();

    assert!(observer.seen.lock().unwrap().is_empty());
}

#[test]
fn creating_or_deleting_courses_does_not_notify() {
    let conn = open_db_in_memory().unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let mapper = CourseMapper::new(&conn);
    mapper.attach(observer.clone());

    let id = mapper.create(&Course::new("Algebra I", 1, "")).unwrap();
    let course = mapper.get_by_id(id).unwrap();
    mapper.delete(&course).unwrap();
    mapper.commit().unwrap();

    assert!(observer.seen.lock().unwrap().is_empty());
}

#[test]
fn detached_observer_is_skipped() {
    let conn = open_db_in_memory().unwrap();
    seed_course_five(&conn);

    let kept = Arc::new(RecordingObserver::default());
    let dropped: Arc<dyn Observer> = Arc::new(RecordingObserver::default());
    let mapper = CourseMapper::new(&conn);
    mapper.attach(kept.clone());
    mapper.attach(dropped.clone());
    assert!(mapper.detach(&dropped));

    let course = mapper.get_by_id(5).unwrap();
    mapper.update(&course).unwrap();
    mapper.commit().unwrap();

    assert_eq!(mapper.subject().len(), 1);
    assert_eq!(*kept.seen.lock().unwrap(), vec![5]);
}

#[test]
fn enrolled_students_follow_course_student_rows() {
    let conn = open_db_in_memory().unwrap();
    let (ada, grace) = seed_course_five(&conn);

    let mut ids: Vec<_> = enrolled_students(&conn, 5)
        .unwrap()
        .into_iter()
        .filter_map(|student| student.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec![ada, grace]);
    assert!(enrolled_students(&conn, 9).unwrap().is_empty());
}

#[test]
fn channel_observer_fails_for_missing_course() {
    let conn = open_db_in_memory().unwrap();
    let observer = ChannelObserver::new(
        NotificationChannel::Sms,
        Arc::new(CollectingSink::default()),
    );

    let err = observer.on_update(&conn, 123).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 123, .. }));
}

#[test]
fn rejected_commit_drops_queued_notifications() {
    let conn = open_db_in_memory().unwrap();
    seed_course_five(&conn);
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE course_guard (
             course_id INTEGER NOT NULL REFERENCES courses(id) DEFERRABLE INITIALLY DEFERRED
         );
         CREATE TRIGGER course_guard_dangling AFTER UPDATE ON courses BEGIN
             INSERT INTO course_guard (course_id) VALUES (9999);
         END;",
    )
    .unwrap();

    let observer = Arc::new(RecordingObserver::default());
    let mapper = CourseMapper::new(&conn);
    mapper.attach(observer.clone());

    let mut course = mapper.get_by_id(5).unwrap();
    course.title = "Algebra II".to_string();
    mapper.update(&course).unwrap();
    assert!(matches!(mapper.commit(), Err(RepoError::Commit(_))));
    assert!(observer.seen.lock().unwrap().is_empty());

    conn.execute_batch("DROP TRIGGER course_guard_dangling;").unwrap();
    mapper.commit().unwrap();
    assert!(
        observer.seen.lock().unwrap().is_empty(),
        "a rejected change is never announced later"
    );

    mapper.update(&course).unwrap();
    mapper.commit().unwrap();
    assert_eq!(*observer.seen.lock().unwrap(), vec![5]);
    assert_eq!(mapper.get_by_id(5).unwrap().title, "Algebra II");
}

#[test]
fn rollback_discards_queued_notifications() {
    let conn = open_db_in_memory().unwrap();
    seed_course_five(&conn);
    let observer = Arc::new(RecordingObserver::default());
    let mapper = CourseMapper::new(&conn);
    mapper.attach(observer.clone());

    let mut course = mapper.get_by_id(5).unwrap();
    course.title = "Algebra II".to_string();
    mapper.update(&course).unwrap();
    mapper.rollback().unwrap();
    mapper.commit().unwrap();

    assert!(observer.seen.lock().unwrap().is_empty());
    assert_eq!(mapper.get_by_id(5).unwrap().title, "Algebra I");
}
