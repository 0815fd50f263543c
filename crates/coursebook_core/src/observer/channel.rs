//! Notification-channel observers for course changes.
//!
//! Each channel observer emits one message per enrolled student of the
//! changed course.

use super::Observer;
use crate::model::person::Person;
use crate::model::EntityId;
use crate::repo::course_mapper::CourseMapper;
use crate::repo::course_student_mapper::enrolled_students;
use crate::repo::{Mapper, RepoResult};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationChannel {
    Sms,
    Email,
}

impl NotificationChannel {
    pub fn from_tag(tag: &str) -> Result<Self, UnknownChannel> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            other => Err(UnknownChannel(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }

    fn recipient(self, student: &Person) -> String {
        match self {
            Self::Sms => student.lastname.clone(),
            Self::Email => student.email.clone(),
        }
    }

    fn render(self, student: &Person, course_title: &str) -> String {
        match self {
            Self::Sms => format!(
                "SMS for {}. Course \"{course_title}\" was changed",
                student.lastname
            ),
            Self::Email => format!(
                "Email to {}. Course \"{course_title}\" was changed",
                student.email
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl Display for UnknownChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown notification channel `{}`", self.0)
    }
}

impl Error for UnknownChannel {}

/// One outgoing course-change message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub channel: NotificationChannel,
    pub course_id: EntityId,
    pub student_id: Option<EntityId>,
    pub recipient: String,
    pub body: String,
}

/// Delivery backend for channel messages.
pub trait MessageSink: Send + Sync {
    fn deliver(&self, message: ChannelMessage);
}

/// Sink that writes messages to the `notify` log target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn deliver(&self, message: ChannelMessage) {
        info!(
            target: "notify",
            "event=course_change_message channel={} course_id={} recipient={} body={}",
            message.channel.as_str(),
            message.course_id,
            message.recipient,
            message.body
        );
    }
}

pub struct ChannelObserver {
    channel: NotificationChannel,
    sink: Arc<dyn MessageSink>,
}

impl ChannelObserver {
    pub fn new(channel: NotificationChannel, sink: Arc<dyn MessageSink>) -> Self {
        Self { channel, sink }
    }

    /// Builds an observer from a channel tag (`sms` / `email`), logging messages.
    pub fn from_tag(tag: &str) -> Result<Self, UnknownChannel> {
        Ok(Self::new(NotificationChannel::from_tag(tag)?, Arc::new(LogSink)))
    }

    pub fn channel(&self) -> NotificationChannel {
        self.channel
    }
}

impl Observer for ChannelObserver {
    fn name(&self) -> &str {
        self.channel.as_str()
    }

    fn on_update(&self, store: &Connection, course_id: EntityId) -> RepoResult<()> {
        let course = CourseMapper::new(store).get_by_id(course_id)?;
        for student in enrolled_students(store, course_id)? {
            self.sink.deliver(ChannelMessage {
                channel: self.channel,
                course_id,
                student_id: student.id,
                recipient: self.channel.recipient(&student),
                body: self.channel.render(&student, &course.title),
            });
        }
        Ok(())
    }
}
