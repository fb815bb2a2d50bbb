use serde::Serialize;
use snafu::{Location, Snafu};

use crate::database::DatabaseQueryError;
use crate::model::EnrollmentStatus;
use crate::Located;

/// Broad category of a [ServiceError], used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    Unauthenticated,
    Validation,
    Internal,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ServiceError {
    #[snafu(display("{entity} `{id}` does not exist"))]
    NotFound {
        entity: &'static str,
        id: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("already enrolled in course `{course}`"))]
    AlreadyEnrolled {
        course: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("course `{course}` is not published"))]
    CourseNotPublished {
        course: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("instructors cannot enroll in their own course `{course}`"))]
    OwnCourse {
        course: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("enrollment `{enrollment}` is already completed"))]
    AlreadyCompleted {
        enrollment: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("enrollment `{enrollment}` is {status}, not active"))]
    NotActive {
        enrollment: String,
        status: EnrollmentStatus,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("enrollment `{enrollment}` kept changing underneath the update, giving up"))]
    WriteConflict {
        enrollment: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("access denied: {reason}"))]
    Forbidden {
        reason: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("authentication required"))]
    Unauthenticated {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid input: {source}"))]
    Validation {
        source: validator::ValidationErrors,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(context(false), display("database error: {source}"))]
    Database {
        source: DatabaseQueryError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::AlreadyEnrolled { .. }
            | ServiceError::CourseNotPublished { .. }
            | ServiceError::OwnCourse { .. }
            | ServiceError::AlreadyCompleted { .. }
            | ServiceError::NotActive { .. }
            | ServiceError::WriteConflict { .. } => ErrorKind::Conflict,
            ServiceError::Forbidden { .. } => ErrorKind::Forbidden,
            ServiceError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            ServiceError::Validation { .. } => ErrorKind::Validation,
            ServiceError::Database { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the operation lost a race on the enrollment and may be retried from a fresh read.
    pub fn is_write_conflict(&self) -> bool {
        matches!(self, ServiceError::WriteConflict { .. })
    }
}

impl Located for ServiceError {
    fn location(&self) -> Location {
        match self {
            ServiceError::NotFound { location, .. }
            | ServiceError::AlreadyEnrolled { location, .. }
            | ServiceError::CourseNotPublished { location, .. }
            | ServiceError::OwnCourse { location, .. }
            | ServiceError::AlreadyCompleted { location, .. }
            | ServiceError::NotActive { location, .. }
            | ServiceError::WriteConflict { location, .. }
            | ServiceError::Forbidden { location, .. }
            | ServiceError::Unauthenticated { location }
            | ServiceError::Validation { location, .. }
            | ServiceError::Database { location, .. } => *location,
        }
    }
}
