use std::fmt;

use thiserror::Error;

/// A single schema violation, located by a JSON pointer into the checked value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub pointer: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    /// Human readable location, e.g. `content_type_columns[0].id`.
    pub fn location(&self) -> String {
        if self.pointer.is_empty() {
            return "<root>".to_string();
        }
        let mut out = String::new();
        for segment in self.pointer.trim_start_matches('/').split('/') {
            let segment = segment.replace("~1", "/").replace("~0", "~");
            if !segment.is_empty() && segment.chars().all(|ch| ch.is_ascii_digit()) {
                out.push('[');
                out.push_str(&segment);
                out.push(']');
            } else {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(&segment);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn single(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue::new(pointer, message)])
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "Validation error");
        }
        write!(f, "Validation error: ")?;
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} at \"{}\"", issue.message, issue.location())?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("invalid field configuration. {0}")]
    ConfigInvalid(ValidationReport),

    #[error("existing field data has an invalid format. {0}")]
    ValueInvalid(ValidationReport),

    #[error("{reason}")]
    ListingFailed { reason: String },

    #[error("extension initialized with unexpected type (expected: FIELD, got: {0})")]
    UnexpectedHostType(String),

    #[error("the popup window could not be opened")]
    PopupBlocked,

    #[error("failed to connect to the host platform: {reason}")]
    HostUnavailable { reason: String },
}

impl ReferenceError {
    pub fn listing(reason: impl Into<String>) -> Self {
        Self::ListingFailed {
            reason: reason.into(),
        }
    }

    /// Fatal errors leave the field unable to render.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReferenceError::ConfigInvalid(_)
                | ReferenceError::UnexpectedHostType(_)
                | ReferenceError::HostUnavailable { .. }
        )
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ReferenceError::ConfigInvalid(report) | ReferenceError::ValueInvalid(report) => {
                Some(report)
            }
            _ => None,
        }
    }
}
