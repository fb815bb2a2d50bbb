//! Read side of course content, filtered through the access rules.

use tracing::instrument;

use crate::model::{in_course_order, Course, Enrollment, EnrollmentStatus, Lesson, Principal};
use crate::prelude::*;

use super::access::{can_access_lesson, can_view_course_lessons, visible_lessons};
use super::error::{ForbiddenSnafu, NotFoundSnafu};
use super::{ProgressSummary, Service, ServiceError};

/// A lesson together with the caller's completion of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonView {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub is_completed: bool,
    pub completed_at: Option<Timestamp>,
    pub user_score: Option<f64>,
}

impl LessonView {
    pub fn new(lesson: Lesson, enrollment: Option<&Enrollment>) -> Self {
        let completion = enrollment.and_then(|enrollment| enrollment.lesson_completion(&lesson.id));

        LessonView {
            is_completed: completion.is_some(),
            completed_at: completion.map(|completion| completion.completed_at),
            user_score: completion.and_then(|completion| completion.score),
            lesson,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonListing {
    pub lessons: Vec<LessonView>,
    pub has_access: bool,
    /// Every lesson of the course, hidden ones included.
    pub total_lessons: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentSummary {
    pub id: Record<Enrollment>,
    pub status: EnrollmentStatus,
    pub enrolled_at: Timestamp,
    #[serde(flatten)]
    pub progress: ProgressSummary,
}

impl From<&Enrollment> for EnrollmentSummary {
    fn from(enrollment: &Enrollment) -> Self {
        EnrollmentSummary {
            id: enrollment.id.clone(),
            status: enrollment.status,
            enrolled_at: enrollment.enrolled_at,
            progress: ProgressSummary::from(enrollment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseDetail {
    pub course: Course,
    pub is_enrolled: bool,
    pub enrollment: Option<EnrollmentSummary>,
    pub lessons: Vec<LessonView>,
}

impl Service {
    #[instrument(skip(self))]
    pub async fn can_access_lesson(
        &self,
        principal: Option<&Principal>,
        course: &Record<Course>,
        lesson: &Record<Lesson>,
    ) -> Result<bool, ServiceError> {
        let (course, lesson) = futures::try_join!(self.course(course), self.lesson(lesson))?;
        let enrollment = self.enrollment_of(principal, &course.id).await?;

        Ok(can_access_lesson(principal, &course, &lesson, enrollment.as_ref()))
    }

    /// Lessons of a course in order. Without access only the preview lessons are listed.
    #[instrument(skip(self))]
    pub async fn course_lessons(
        &self,
        principal: Option<&Principal>,
        course: &Record<Course>,
    ) -> Result<LessonListing, ServiceError> {
        let course = self.course(course).await?;
        let (lessons, enrollment) = futures::try_join!(
            async { Ok::<_, ServiceError>(Lesson::of_course(&course.id, &self.database).await?) },
            self.enrollment_of(principal, &course.id),
        )?;

        let has_access = can_view_course_lessons(principal, &course, enrollment.as_ref());
        let lessons = visible_lessons(in_course_order(lessons), has_access)
            .into_iter()
            .map(|lesson| LessonView::new(lesson, enrollment.as_ref()))
            .collect();

        Ok(LessonListing {
            lessons,
            has_access,
            total_lessons: course.lesson_count(),
        })
    }

    #[instrument(skip(self))]
    pub async fn view_lesson(
        &self,
        principal: Option<&Principal>,
        lesson: &Record<Lesson>,
    ) -> Result<LessonView, ServiceError> {
        let lesson = self.lesson(lesson).await?;
        let course = self.course(&lesson.course).await?;
        let enrollment = self.enrollment_of(principal, &course.id).await?;

        ensure!(
            can_access_lesson(principal, &course, &lesson, enrollment.as_ref()),
            ForbiddenSnafu { reason: "enroll in the course to access this lesson" }
        );

        Ok(LessonView::new(lesson, enrollment.as_ref()))
    }

    /// A course with the caller's enrollment and the lessons they may see.
    ///
    /// Unpublished courses only exist for their instructor and admins.
    #[instrument(skip(self))]
    pub async fn course_detail(
        &self,
        principal: Option<&Principal>,
        course: &Record<Course>,
    ) -> Result<CourseDetail, ServiceError> {
        let course = self.course(course).await?;
        let is_staff = principal
            .is_some_and(|principal| principal.is_admin() || course.is_instructor(&principal.id));
        ensure!(
            course.is_published || is_staff,
            NotFoundSnafu { entity: "course", id: course.id.key() }
        );

        let listing = self.course_lessons(principal, &course.id).await?;
        let enrollment = self.enrollment_of(principal, &course.id).await?;

        Ok(CourseDetail {
            is_enrolled: enrollment
                .as_ref()
                .is_some_and(|enrollment| enrollment.status.grants_access()),
            enrollment: enrollment.as_ref().map(EnrollmentSummary::from),
            lessons: listing.lessons,
            course,
        })
    }
}
