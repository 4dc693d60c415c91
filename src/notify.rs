use std::{cell::RefCell, fmt, rc::Rc};

use crate::error::ReferenceError;

pub const ERROR_TITLE: &str = "Custom Reference Field Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: ERROR_TITLE.to_string(),
            description: description.into(),
        }
    }

    pub fn warning(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            title: ERROR_TITLE.to_string(),
            description: description.into(),
        }
    }
}

/// Only a degraded stored value is a warning; every other fault goes to the
/// error surface.
impl From<&ReferenceError> for Notification {
    fn from(err: &ReferenceError) -> Self {
        match err {
            ReferenceError::ValueInvalid(_) => Notification::warning(err.to_string()),
            _ => Notification::error(err.to_string()),
        }
    }
}

/// The host's toast/notification surface.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

impl<F> Notifier for F
where
    F: FnMut(Notification),
{
    fn notify(&mut self, notification: Notification) {
        self(notification)
    }
}

/// Keeps every notification in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Rc<RefCell<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.borrow().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Notifier for NotificationLog {
    fn notify(&mut self, notification: Notification) {
        self.entries.borrow_mut().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationReport;

    #[test]
    fn faults_become_error_notifications() {
        let err = ReferenceError::ConfigInvalid(ValidationReport::single("", "bad"));
        let note = Notification::from(&err);
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.title, ERROR_TITLE);
        assert!(note.description.starts_with("invalid field configuration."));

        let note = Notification::from(&ReferenceError::listing("timeout"));
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.description, "timeout");

        let note = Notification::from(&ReferenceError::PopupBlocked);
        assert_eq!(note.level, NotificationLevel::Error);
    }

    #[test]
    fn invalid_stored_value_is_only_a_warning() {
        let err = ReferenceError::ValueInvalid(ValidationReport::single("/uid", "not a string"));
        let note = Notification::from(&err);
        assert_eq!(note.level, NotificationLevel::Warning);
        assert_eq!(note.title, ERROR_TITLE);
    }

    #[test]
    fn log_clones_share_entries() {
        let log = NotificationLog::new();
        let mut sink = log.clone();
        sink.notify(Notification::error("boom"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().unwrap().description, "boom");
    }
}
