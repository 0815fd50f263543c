//! Course catalog persistence core.
//!
//! Plain entities are kept apart from the SQLite store by one mapper per
//! entity type. A registry resolves mappers by type, a per-thread unit of
//! work batches inserts/updates/deletes, and course updates fan out to
//! observers once committed.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod observer;
pub mod repo;
pub mod service;
pub mod uow;

pub use config::{ConfigError, CoreConfig};
pub use logging::{audit, default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, UNCATEGORIZED_ID};
pub use model::course::Course;
pub use model::course_student::CourseStudent;
pub use model::person::{Person, PersonKind};
pub use model::{Entity, EntityId, EntityKind, EntityValidationError};
pub use observer::channel::{
    ChannelMessage, ChannelObserver, LogSink, MessageSink, NotificationChannel, UnknownChannel,
};
pub use observer::{ChangeSubject, NotifyReport, Observer};
pub use repo::category_mapper::CategoryMapper;
pub use repo::course_mapper::CourseMapper;
pub use repo::course_student_mapper::{enrolled_students, CourseStudentMapper};
pub use repo::person_mapper::PersonMapper;
pub use repo::registry::{MapperFactory, MapperRegistry};
pub use repo::{EntityMapper, Filter, MappedEntity, Mapper, RepoError, RepoResult};
pub use service::catalog_service::CatalogService;
pub use service::{ServiceError, ServiceResult};
pub use uow::domain_object::DomainObject;
pub use uow::{CommitPhase, CommitSummary, UnitOfWork, UnitOfWorkScope, UowError, UowResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
