//! # Validation Report
//!
//! A [`ValidationReport`] accumulates the messages produced by one
//! validation call, in traversal order, together with a status whose merge
//! is monotonic: `Error > Failure > Success`.
//!
//! Reports are never shared between calls. Every child node and every
//! combinator member is validated into a sub-report, and the sub-reports
//! that matter are merged back into the parent.
//!
//! A fatal resolution error aborts the branch it occurs in:
//! [`ValidationReport::abort`] drops the failures that branch accumulated
//! and leaves the fatal message alone. Once merged, the branch lifts every
//! enclosing report to `Error`; sibling branches keep their messages.

use std::fmt;

use jsv_core::JsonPointer;
use serde::Serialize;

use crate::context::ValidationContext;
use crate::error::FatalError;

/// Overall outcome of a validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// The instance satisfies the schema.
    #[default]
    Success,
    /// At least one constraint failed.
    Failure,
    /// Validation could not be carried out.
    Error,
}

impl ValidationStatus {
    /// The worse of two statuses.
    pub fn worst(self, other: ValidationStatus) -> ValidationStatus {
        self.max(other)
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Success => "success",
            ValidationStatus::Failure => "failure",
            ValidationStatus::Error => "error",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationMessage {
    /// `Failure` for constraint failures, `Error` for fatal errors.
    pub level: ValidationStatus,
    /// Location in the instance.
    pub instance_path: JsonPointer,
    /// Location of the schema node that produced the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Keyword that produced the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Branch failures behind a combinator message.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<ValidationMessage>,
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)?;
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)?;
        }
        if let Some(keyword) = &self.keyword {
            write!(f, " [{keyword}]")?;
        }
        Ok(())
    }
}

/// Per-call accumulator of validation messages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    status: ValidationStatus,
    messages: Vec<ValidationMessage>,
}

impl ValidationReport {
    /// An empty, successful report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    /// True while nothing has failed.
    pub fn is_success(&self) -> bool {
        self.status == ValidationStatus::Success
    }

    /// True once a fatal error has been recorded here or in a merged branch.
    pub fn is_error(&self) -> bool {
        self.status == ValidationStatus::Error
    }

    /// Messages in the order they were produced.
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Number of top-level messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the report holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, raising the status to the message level.
    pub fn push(&mut self, message: ValidationMessage) {
        self.status = self.status.worst(message.level);
        self.messages.push(message);
    }

    /// Append every message of `other` and merge statuses.
    pub fn merge(&mut self, other: ValidationReport) {
        self.status = self.status.worst(other.status);
        self.messages.extend(other.messages);
    }

    /// Record a constraint failure at the context's current location.
    pub fn fail(&mut self, ctx: &ValidationContext, message: impl Into<String>) {
        self.fail_with(ctx, message, Vec::new());
    }

    /// Record a constraint failure with the branch messages that caused it.
    pub fn fail_with(
        &mut self,
        ctx: &ValidationContext,
        message: impl Into<String>,
        causes: Vec<ValidationMessage>,
    ) {
        self.push(ValidationMessage {
            level: ValidationStatus::Failure,
            instance_path: ctx.path().clone(),
            schema: ctx.schema_location().map(str::to_string),
            keyword: ctx.keyword().map(str::to_string),
            message: message.into(),
            causes,
        });
    }

    /// Replace this branch's messages with the fatal error.
    pub fn abort(&mut self, fatal: FatalError) {
        self.messages.clear();
        self.status = ValidationStatus::Error;
        self.messages.push(ValidationMessage {
            level: ValidationStatus::Error,
            instance_path: fatal.instance_path,
            schema: None,
            keyword: None,
            message: fatal.error.to_string(),
            causes: Vec::new(),
        });
    }

    /// Consume the report, keeping its messages.
    pub fn into_messages(self) -> Vec<ValidationMessage> {
        self.messages
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        for message in &self.messages {
            write!(f, "\n{message}")?;
            for cause in &message.causes {
                write!(f, "\n  {cause}")?;
            }
        }
        Ok(())
    }
}
