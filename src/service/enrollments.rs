//! Enrollment lifecycle and progress operations.

use tracing::instrument;
use validator::Validate;

use crate::database::Count;
use crate::model::{Course, Enrollment, EnrollmentStatus, Lesson, Note, Payment, Principal};
use crate::prelude::*;

use super::commands::{
    CompleteLessonCommand, LessonProgress, NoteCommand, PageQuery, DEFAULT_COURSE_PAGE_SIZE,
    DEFAULT_PAGE_SIZE,
};
use super::error::{
    AlreadyCompletedSnafu, AlreadyEnrolledSnafu, CourseNotPublishedSnafu, ForbiddenSnafu, NotActiveSnafu,
    NotFoundSnafu, OwnCourseSnafu, ValidationSnafu,
};
use super::{EnrollmentStats, Page, Pagination, ProgressSummary, Service, ServiceError};

impl Service {
    /// Enrolls the caller in a published course they don't teach and aren't already enrolled in.
    #[instrument(skip(self), fields(student = %principal.id))]
    pub async fn enroll(&self, principal: &Principal, course: &Record<Course>) -> Result<Enrollment, ServiceError> {
        let course = self.course(course).await?;
        ensure!(course.is_published, CourseNotPublishedSnafu { course: course.id.key() });

        let existing = Enrollment::find(&principal.id, &course.id, &self.database).await?;
        ensure!(existing.is_none(), AlreadyEnrolledSnafu { course: course.id.key() });
        ensure!(!course.is_instructor(&principal.id), OwnCourseSnafu { course: course.id.key() });

        let enrollment = Enrollment::new(principal.id.clone(), course.id.clone(), Payment::for_course(&course));
        let enrollment = match self.database.insert(&enrollment).await {
            Ok(enrollment) => enrollment,
            Err(error) => {
                // the unique (student, course) index turns a concurrent duplicate into a failed insert
                if Enrollment::find(&principal.id, &course.id, &self.database).await?.is_some() {
                    return AlreadyEnrolledSnafu { course: course.id.key() }.fail();
                }
                return Err(error.into());
            }
        };

        if let Err(error) = Course::adjust_enrollment_count(&course.id, 1, &self.database).await {
            tracing::warn!(course = %course.id, %error, "could not increment the enrollment count");
        }

        tracing::info!(enrollment = %enrollment.id, course = %course.id, "enrolled");
        Ok(enrollment)
    }

    /// Records a lesson as completed without recomputing the completion state.
    #[instrument(skip(self, command), fields(student = %principal.id))]
    pub async fn complete_lesson(
        &self,
        principal: &Principal,
        enrollment: &Record<Enrollment>,
        command: &CompleteLessonCommand,
    ) -> Result<Enrollment, ServiceError> {
        command.validate().context(ValidationSnafu)?;

        let lesson = Record::new(command.lesson_id.as_str());
        self.progress_on(principal, enrollment, &lesson, &command.into(), false).await
    }

    /// Recomputes the completion state of an enrollment from its completed lessons.
    #[instrument(skip(self), fields(caller = %principal.id))]
    pub async fn update_progress(
        &self,
        principal: &Principal,
        enrollment: &Record<Enrollment>,
    ) -> Result<ProgressSummary, ServiceError> {
        let current = self.enrollment(enrollment).await?;
        ensure!(
            current.is_owned_by(&principal.id) || principal.is_admin(),
            ForbiddenSnafu { reason: "not your enrollment" }
        );

        let total = self.course(&current.course).await?.lesson_count();
        let stored = self
            .modify(enrollment, |enrollment| {
                enrollment.recompute_progress(total, now());
                Ok(())
            })
            .await?;

        Ok(ProgressSummary::from(&stored))
    }

    /// Completes a lesson and recomputes the completion state in one write.
    #[instrument(skip(self, command), fields(student = %principal.id))]
    pub async fn record_progress(
        &self,
        principal: &Principal,
        enrollment: &Record<Enrollment>,
        command: &CompleteLessonCommand,
    ) -> Result<ProgressSummary, ServiceError> {
        command.validate().context(ValidationSnafu)?;

        let lesson = Record::new(command.lesson_id.as_str());
        let stored = self.progress_on(principal, enrollment, &lesson, &command.into(), true).await?;

        Ok(ProgressSummary::from(&stored))
    }

    /// Completes a lesson on the caller's own enrollment in the lesson's course.
    #[instrument(skip(self, progress), fields(student = %principal.id))]
    pub async fn mark_lesson_completed(
        &self,
        principal: &Principal,
        lesson: &Record<Lesson>,
        progress: &LessonProgress,
    ) -> Result<ProgressSummary, ServiceError> {
        progress.validate().context(ValidationSnafu)?;

        let course = self.lesson(lesson).await?.course;
        let enrollment = Enrollment::find(&principal.id, &course, &self.database)
            .await?
            .context(ForbiddenSnafu { reason: "not enrolled in this course" })?;

        let stored = self.progress_on(principal, &enrollment.id, lesson, progress, true).await?;
        Ok(ProgressSummary::from(&stored))
    }

    async fn progress_on(
        &self,
        principal: &Principal,
        enrollment: &Record<Enrollment>,
        lesson: &Record<Lesson>,
        progress: &LessonProgress,
        recompute: bool,
    ) -> Result<Enrollment, ServiceError> {
        let current = self.enrollment(enrollment).await?;
        ensure!(current.is_owned_by(&principal.id), ForbiddenSnafu { reason: "not your enrollment" });

        let lesson = self.lesson(lesson).await?;
        ensure!(
            lesson.belongs_to(&current.course),
            NotFoundSnafu { entity: "lesson", id: lesson.id.key() }
        );

        let total = if recompute {
            Some(self.course(&current.course).await?.lesson_count())
        } else {
            None
        };

        let score = progress.score;
        let time_spent = progress.time_spent.unwrap_or_default();

        let stored = self
            .modify(enrollment, |enrollment| {
                ensure!(
                    enrollment.status.accepts_progress(),
                    ForbiddenSnafu { reason: format!("enrollment is {}", enrollment.status) }
                );

                let at = now();
                enrollment.complete_lesson(lesson.id.clone(), score, time_spent, at);
                if let Some(total) = total {
                    enrollment.recompute_progress(total, at);
                }
                Ok(())
            })
            .await?;

        tracing::info!(
            enrollment = %stored.id,
            lesson = %lesson.id,
            completion = stored.completion.completion_percentage,
            "lesson completed"
        );
        if stored.completion.is_completed && !current.completion.is_completed {
            tracing::info!(enrollment = %stored.id, course = %stored.course, "course completed");
        }

        Ok(stored)
    }

    /// Drops an active enrollment of the caller. Completed enrollments can't be dropped.
    #[instrument(skip(self), fields(student = %principal.id))]
    pub async fn drop_enrollment(
        &self,
        principal: &Principal,
        enrollment: &Record<Enrollment>,
    ) -> Result<Enrollment, ServiceError> {
        let current = self.enrollment(enrollment).await?;
        ensure!(current.is_owned_by(&principal.id), ForbiddenSnafu { reason: "not your enrollment" });

        let stored = self
            .modify(enrollment, |enrollment| {
                let key = enrollment.id.key();
                ensure!(!enrollment.completion.is_completed, AlreadyCompletedSnafu { enrollment: key.clone() });
                ensure!(
                    enrollment.status == EnrollmentStatus::Active,
                    NotActiveSnafu { enrollment: key, status: enrollment.status }
                );

                enrollment.status = EnrollmentStatus::Dropped;
                Ok(())
            })
            .await?;

        if let Err(error) = Course::adjust_enrollment_count(&stored.course, -1, &self.database).await {
            tracing::warn!(course = %stored.course, %error, "could not decrement the enrollment count");
        }

        tracing::info!(enrollment = %stored.id, course = %stored.course, "dropped");
        Ok(stored)
    }

    /// Appends a note to the caller's own enrollment.
    #[instrument(skip(self, command), fields(student = %principal.id))]
    pub async fn add_note(
        &self,
        principal: &Principal,
        enrollment: &Record<Enrollment>,
        command: &NoteCommand,
    ) -> Result<Enrollment, ServiceError> {
        command.validate().context(ValidationSnafu)?;

        let current = self.enrollment(enrollment).await?;
        ensure!(current.is_owned_by(&principal.id), ForbiddenSnafu { reason: "not your enrollment" });

        self.modify(enrollment, |enrollment| {
            enrollment.notes.push(Note::new(command.content.clone()));
            Ok(())
        })
        .await
    }

    /// An enrollment as seen by its student or an admin.
    #[instrument(skip(self), fields(caller = %principal.id))]
    pub async fn details(
        &self,
        principal: &Principal,
        enrollment: &Record<Enrollment>,
    ) -> Result<Enrollment, ServiceError> {
        let enrollment = self.enrollment(enrollment).await?;
        ensure!(
            enrollment.is_owned_by(&principal.id) || principal.is_admin(),
            ForbiddenSnafu { reason: "not your enrollment" }
        );

        Ok(enrollment)
    }

    /// The caller's enrollments, newest first.
    #[instrument(skip(self), fields(student = %principal.id))]
    pub async fn list_for_student(
        &self,
        principal: &Principal,
        query: &PageQuery,
    ) -> Result<Page<Enrollment>, ServiceError> {
        query.validate().context(ValidationSnafu)?;

        let (start, limit) = query.window(DEFAULT_PAGE_SIZE);
        let (items, count) = futures::try_join!(
            Enrollment::page_of_student(&principal.id, query.status, start, limit, &self.database),
            Enrollment::count_of_student(&principal.id, query.status, &self.database),
        )?;

        Ok(Page::new(items, Pagination::new(query.page, limit, Count::total(count))))
    }

    /// Enrollments of a course, for its instructor or an admin.
    #[instrument(skip(self), fields(caller = %principal.id))]
    pub async fn course_enrollments(
        &self,
        principal: &Principal,
        course: &Record<Course>,
        query: &PageQuery,
    ) -> Result<Page<Enrollment>, ServiceError> {
        query.validate().context(ValidationSnafu)?;

        let course = self.course(course).await?;
        ensure!(
            course.is_instructor(&principal.id) || principal.is_admin(),
            ForbiddenSnafu { reason: "only the instructor can list enrollments" }
        );

        let (start, limit) = query.window(DEFAULT_COURSE_PAGE_SIZE);
        let (items, count) = futures::try_join!(
            Enrollment::page_of_course(&course.id, query.status, start, limit, &self.database),
            Enrollment::count_of_course(&course.id, query.status, &self.database),
        )?;

        Ok(Page::new(items, Pagination::new(query.page, limit, Count::total(count))))
    }

    #[instrument(skip(self), fields(student = %principal.id))]
    pub async fn stats(&self, principal: &Principal) -> Result<EnrollmentStats, ServiceError> {
        let enrollments = Enrollment::of_student(&principal.id, &self.database).await?;
        Ok(EnrollmentStats::from_enrollments(enrollments))
    }
}
