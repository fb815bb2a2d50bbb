use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::{jitter, FixedInterval};
use tokio_retry::RetryIf;

use crate::prelude::*;
use crate::model::{Course, Enrollment, Lesson, Principal, User};

pub mod access;
pub mod certificate;
pub mod commands;
pub mod error;
pub mod progress;
pub mod stats;

mod courses;
mod enrollments;

pub use courses::{CourseDetail, EnrollmentSummary, LessonListing, LessonView};
pub use error::{ErrorKind, ServiceError};
pub use progress::ProgressSummary;
pub use stats::EnrollmentStats;

use error::{NotFoundSnafu, UnauthenticatedSnafu, WriteConflictSnafu};

/// How a conflicting enrollment write is retried: `retries` more attempts after the first, `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct RetryPolicy {
    pub retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(3, Duration::from_millis(10))
    }
}

impl RetryPolicy {
    /// At least one retry is always made.
    pub fn strategy(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.delay).map(jitter).take(self.retries.max(1))
    }
}

/// The enrollment core. Every operation takes the caller explicitly and works on freshly read documents.
#[derive(Debug, Clone, new)]
pub struct Service {
    database: Database,
    #[new(default)]
    retry: RetryPolicy,
}

impl Service {
    pub fn with_retry(database: Database, retry: RetryPolicy) -> Self {
        Service { database, retry }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Resolves the user behind a request. Unknown and deactivated users are not authenticated.
    #[tracing::instrument(skip(self))]
    pub async fn principal(&self, user: &Record<User>) -> Result<Principal, ServiceError> {
        let user = User::get(user, &self.database).await?;

        match user {
            Some(user) if user.is_active => Ok(Principal::from(&user)),
            _ => UnauthenticatedSnafu.fail(),
        }
    }

    async fn course(&self, id: &Record<Course>) -> Result<Course, ServiceError> {
        Course::get(id, &self.database)
            .await?
            .context(NotFoundSnafu { entity: "course", id: id.key() })
    }

    async fn lesson(&self, id: &Record<Lesson>) -> Result<Lesson, ServiceError> {
        Lesson::get(id, &self.database)
            .await?
            .context(NotFoundSnafu { entity: "lesson", id: id.key() })
    }

    async fn enrollment(&self, id: &Record<Enrollment>) -> Result<Enrollment, ServiceError> {
        Enrollment::get(id, &self.database)
            .await?
            .context(NotFoundSnafu { entity: "enrollment", id: id.key() })
    }

    /// The caller's own enrollment in `course`, if they are signed in and have one.
    async fn enrollment_of(
        &self,
        principal: Option<&Principal>,
        course: &Record<Course>,
    ) -> Result<Option<Enrollment>, ServiceError> {
        match principal {
            Some(principal) => Ok(Enrollment::find(&principal.id, course, &self.database).await?),
            None => Ok(None),
        }
    }

    /// Read-modify-write on one enrollment.
    ///
    /// Each attempt reads the current document, applies `change` and writes it back only if nobody else wrote
    /// in between. A lost race starts over from a fresh read until the retry policy runs out.
    async fn modify<F>(&self, id: &Record<Enrollment>, change: F) -> Result<Enrollment, ServiceError>
    where
        F: Fn(&mut Enrollment) -> Result<(), ServiceError>,
    {
        let change = &change;

        retry_on_conflict(self.retry, || async move {
            let mut enrollment = self.enrollment(id).await?;
            let issued_before = enrollment.certificate.is_issued;

            change(&mut enrollment)?;

            let issuing = !issued_before && enrollment.certificate.is_issued;
            self.persist(enrollment, issuing).await
        })
        .await
    }

    /// Conditional write of `enrollment`. A write that issues a certificate additionally requires that none
    /// was issued in the meantime.
    async fn persist(&self, mut enrollment: Enrollment, issuing: bool) -> Result<Enrollment, ServiceError> {
        let expected = enrollment.version;
        enrollment.version = expected + 1;

        let id = enrollment.id.clone();
        let stored = if issuing {
            Enrollment::replace_issuing(&id, &enrollment, expected, &self.database).await?
        } else {
            Enrollment::replace(&id, &enrollment, expected, &self.database).await?
        };

        let stored = stored.context(WriteConflictSnafu { enrollment: id.key() })?;

        if issuing {
            tracing::info!(
                enrollment = %stored.id,
                certificate = ?stored.certificate.certificate_id,
                "issued certificate"
            );
        }

        Ok(stored)
    }
}

/// Runs `attempt` until it succeeds, fails with something other than a write conflict, or `policy` runs out.
pub async fn retry_on_conflict<T, A, Fut>(policy: RetryPolicy, attempt: A) -> Result<T, ServiceError>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    RetryIf::start(policy.strategy(), attempt, |error: &ServiceError| {
        let retry = error.is_write_conflict();
        if retry {
            tracing::warn!(%error, "write conflict, retrying from a fresh read");
        }
        retry
    })
    .await
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };

        Pagination {
            current_page: page,
            total_pages,
            total,
            has_next_page: u64::from(page) < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, new)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::service::error::ForbiddenSnafu;

    fn quick(retries: usize) -> RetryPolicy {
        RetryPolicy::new(retries, Duration::from_millis(1))
    }

    #[test]
    fn pagination_reports_neighbours() {
        let middle = Pagination::new(2, 10, 25);
        assert_eq!(middle.total_pages, 3);
        assert!(middle.has_next_page && middle.has_prev_page);

        let last = Pagination::new(3, 10, 25);
        assert!(!last.has_next_page);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page && !empty.has_prev_page);
    }

    #[test]
    fn zero_retries_still_retries_once() {
        assert_eq!(quick(0).strategy().count(), 1);
        assert_eq!(quick(3).strategy().count(), 3);
    }

    #[tokio::test]
    async fn conflicts_are_retried_until_success() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result = retry_on_conflict(quick(3), || async move {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                WriteConflictSnafu { enrollment: "e1" }.fail()
            } else {
                Ok("written")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "written");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_conflict() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result: Result<(), _> = retry_on_conflict(quick(2), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            WriteConflictSnafu { enrollment: "e1" }.fail()
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Conflict);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result: Result<(), _> = retry_on_conflict(quick(3), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            ForbiddenSnafu { reason: "not yours" }.fail()
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Forbidden);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
