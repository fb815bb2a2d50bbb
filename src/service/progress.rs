//! Progress tracking on a single enrollment document.
//!
//! Recording a lesson and recomputing completion are separate steps: the percentage needs the course's
//! lesson count, which lives on another document.

use serde::Serialize;

use crate::database::Record;
use crate::model::{Enrollment, EnrollmentStatus, Lesson, LessonCompletion, Timestamp};

/// What a recomputation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recomputed {
    pub completion_percentage: u8,
    pub is_completed: bool,
    /// The enrollment crossed into completion during this call.
    pub completed_now: bool,
    /// A certificate was issued during this call. The write that persists it must be guarded on
    /// `certificate.is_issued` still being false.
    pub certificate_issued: bool,
}

/// The progress figures handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completion_percentage: u8,
    pub is_completed: bool,
    pub certificate_id: Option<String>,
}

impl From<&Enrollment> for ProgressSummary {
    fn from(enrollment: &Enrollment) -> Self {
        ProgressSummary {
            completion_percentage: enrollment.completion.completion_percentage,
            is_completed: enrollment.completion.is_completed,
            certificate_id: enrollment.certificate.certificate_id.clone(),
        }
    }
}

/// `round(100 * completed / total)` with halves rounded up, clamped to 100. `None` when the course has no lessons.
pub fn completion_percentage(completed: usize, total: usize) -> Option<u8> {
    if total == 0 {
        return None;
    }

    let (completed, total) = (completed as u64, total as u64);
    let rounded = (200 * completed + total) / (2 * total);
    Some(rounded.min(100) as u8)
}

impl Enrollment {
    pub fn is_lesson_completed(&self, lesson: &Record<Lesson>) -> bool {
        self.progress
            .completed_lessons
            .iter()
            .any(|completion| &completion.lesson == lesson)
    }

    pub fn completed_lesson_count(&self) -> usize {
        self.progress.completed_lessons.len()
    }

    pub fn lesson_completion(&self, lesson: &Record<Lesson>) -> Option<&LessonCompletion> {
        self.progress
            .completed_lessons
            .iter()
            .find(|completion| &completion.lesson == lesson)
    }

    /// Records `lesson` as completed. Completing a lesson again refreshes its entry instead of adding a second one:
    /// the timestamp always moves, the score only when one is given, the time spent only when it is positive.
    /// Only the first completion adds to the running total.
    pub fn complete_lesson(
        &mut self,
        lesson: Record<Lesson>,
        score: Option<f64>,
        time_spent: u64,
        at: Timestamp,
    ) {
        let existing = self
            .progress
            .completed_lessons
            .iter_mut()
            .find(|completion| completion.lesson == lesson);

        match existing {
            Some(completion) => {
                completion.completed_at = at;
                if score.is_some() {
                    completion.score = score;
                }
                if time_spent > 0 {
                    completion.time_spent = time_spent;
                }
            }
            None => {
                self.progress.completed_lessons.push(LessonCompletion {
                    lesson,
                    completed_at: at,
                    score,
                    time_spent,
                });
                self.progress.total_time_spent += time_spent;
            }
        }

        self.progress.last_accessed_at = at;
    }

    /// Derives the completion state from the completed set against `total_lessons`.
    ///
    /// The first time every lesson is done on an active enrollment it becomes completed and the certificate is
    /// issued. Dropped and suspended enrollments only get their percentage refreshed.
    /// Later calls never move `completed_at` nor touch the certificate.
    pub fn recompute_progress(&mut self, total_lessons: usize, at: Timestamp) -> Recomputed {
        let completed = self.completed_lesson_count();
        let mut completed_now = false;
        let mut certificate_issued = false;

        if let Some(percentage) = completion_percentage(completed, total_lessons) {
            self.completion.completion_percentage = percentage;

            if completed >= total_lessons
                && !self.completion.is_completed
                && self.status == EnrollmentStatus::Active
            {
                self.completion.is_completed = true;
                self.completion.completed_at = Some(at);
                self.status = EnrollmentStatus::Completed;
                completed_now = true;

                certificate_issued = self.certificate.issue(at);
            }
        }

        Recomputed {
            completion_percentage: self.completion.completion_percentage,
            is_completed: self.completion.is_completed,
            completed_now,
            certificate_issued,
        }
    }
}
