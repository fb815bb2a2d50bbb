use crate::database::Count;
use crate::prelude::*;

use super::{Course, Lesson, User};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Dropped,
    Suspended,
}

impl EnrollmentStatus {
    /// Only active enrollments keep their course content unlocked.
    pub fn grants_access(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Lessons may still be recorded on a completed enrollment. Re-completion never reopens it.
    pub fn accepts_progress(self) -> bool {
        matches!(self, Self::Active | Self::Completed)
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Dropped => "dropped",
            Self::Suspended => "suspended",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    BankTransfer,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// What the student paid at enrollment time. Copied from the course so later price changes don't rewrite history.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Payment {
    pub amount: f64,
    pub currency: String,
    pub method: PaymentMethod,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub paid_at: Timestamp,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn for_course(course: &Course) -> Self {
        let (method, status) = if course.is_free() {
            (PaymentMethod::Free, PaymentStatus::Completed)
        } else {
            (PaymentMethod::CreditCard, PaymentStatus::Pending)
        };

        Payment {
            amount: course.price.max(0.0),
            currency: course.currency.clone(),
            method,
            transaction_id: None,
            paid_at: now(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LessonCompletion {
    pub lesson: Record<Lesson>,
    pub completed_at: Timestamp,
    #[serde(default)]
    pub score: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub time_spent: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Progress {
    #[serde(default)]
    pub completed_lessons: Vec<LessonCompletion>,
    /// Seconds.
    #[serde(default)]
    pub total_time_spent: u64,
    pub last_accessed_at: Timestamp,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Completion {
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub completion_percentage: u8,
    #[serde(default)]
    pub final_score: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Certificate {
    #[serde(default)]
    pub is_issued: bool,
    #[serde(default)]
    pub issued_at: Option<Timestamp>,
    #[serde(default)]
    pub certificate_id: Option<String>,
    #[serde(default)]
    pub certificate_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Note {
    pub content: String,
    #[new(default)]
    pub created_at: Timestamp,
}

/// One student's membership in one course. At most one exists per (student, course) pair.
///
/// `version` is bumped by every write and checked by the next one, see [Enrollment::replace].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Enrollment {
    #[new(default)]
    pub id: Record<Enrollment>,
    pub student: Record<User>,
    pub course: Record<Course>,
    #[new(default)]
    pub enrolled_at: Timestamp,
    #[new(default)]
    pub status: EnrollmentStatus,
    #[new(default)]
    pub progress: Progress,
    #[new(default)]
    pub completion: Completion,
    #[new(default)]
    pub certificate: Certificate,
    pub payment: Payment,
    #[new(default)]
    #[serde(default)]
    pub notes: Vec<Note>,
    #[new(default)]
    #[serde(default)]
    pub version: u64,
}

define_table!("enrollments" : Enrollment = id);

define_relation! {
    Enrollment > get(id: &Record<Enrollment>) > Option<Enrollment>
        where "SELECT * FROM $id"
}

define_relation! {
    Enrollment > find(student: &Record<User>, course: &Record<Course>) > Option<Enrollment>
        where "SELECT * FROM enrollments WHERE student = $student AND course = $course LIMIT 1"
}

define_relation! {
    Enrollment > of_student(student: &Record<User>) > Vec<Enrollment>
        where "SELECT * FROM enrollments WHERE student = $student"
}

define_relation! {
    Enrollment > page_of_student(student: &Record<User>, status: Option<EnrollmentStatus>, start: u64, limit: u64) > Vec<Enrollment>
        where "SELECT * FROM enrollments WHERE student = $student AND ($status = NONE OR status = $status) ORDER BY enrolled_at DESC LIMIT $limit START $start"
}

define_relation! {
    Enrollment > count_of_student(student: &Record<User>, status: Option<EnrollmentStatus>) > Option<Count>
        where "SELECT count() FROM enrollments WHERE student = $student AND ($status = NONE OR status = $status) GROUP ALL"
}

define_relation! {
    Enrollment > page_of_course(course: &Record<Course>, status: Option<EnrollmentStatus>, start: u64, limit: u64) > Vec<Enrollment>
        where "SELECT * FROM enrollments WHERE course = $course AND ($status = NONE OR status = $status) ORDER BY enrolled_at DESC LIMIT $limit START $start"
}

define_relation! {
    Enrollment > count_of_course(course: &Record<Course>, status: Option<EnrollmentStatus>) > Option<Count>
        where "SELECT count() FROM enrollments WHERE course = $course AND ($status = NONE OR status = $status) GROUP ALL"
}

// Conditional writes. Nothing comes back when `version` moved on since the document was read.

define_relation! {
    Enrollment > replace(id: &Record<Enrollment>, content: &Enrollment, expected: u64) > Option<Enrollment>
        where "UPDATE $id CONTENT $content WHERE version = $expected RETURN AFTER"
}

define_relation! {
    Enrollment > replace_issuing(id: &Record<Enrollment>, content: &Enrollment, expected: u64) > Option<Enrollment>
        where "UPDATE $id CONTENT $content WHERE version = $expected AND certificate.is_issued = false RETURN AFTER"
}

impl Enrollment {
    pub fn is_owned_by(&self, user: &Record<User>) -> bool {
        &self.student == user
    }

    /// Total time spent rendered as `"1h 5m"`, or `"12m"` below an hour.
    pub fn formatted_time_spent(&self) -> String {
        let total = self.progress.total_time_spent;
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;

        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }

    /// Whole days since enrollment, rounded up.
    pub fn duration_days(&self, at: Timestamp) -> i64 {
        let seconds = (at - self.enrolled_at).num_seconds().abs();
        (seconds + 86_399) / 86_400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(price: f64) -> Course {
        let mut course = Course::new("Rust for Pythonistas".into(), Record::new("ferris"));
        course.price = price;
        course.currency = "EUR".into();
        course
    }

    fn enrollment() -> Enrollment {
        let course = course(0.0);
        Enrollment::new(Record::new("alice"), course.id.clone(), Payment::for_course(&course))
    }

    #[test]
    fn free_course_is_paid_in_full_up_front() {
        let payment = Payment::for_course(&course(0.0));
        assert_eq!(payment.method, PaymentMethod::Free);
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.currency, "EUR");
    }

    #[test]
    fn paid_course_starts_pending() {
        let payment = Payment::for_course(&course(49.5));
        assert_eq!(payment.method, PaymentMethod::CreditCard);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount, 49.5);
    }

    #[test]
    fn new_enrollment_is_active_and_empty() {
        let enrollment = enrollment();
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert_eq!(enrollment.completion.completion_percentage, 0);
        assert!(!enrollment.certificate.is_issued);
        assert_eq!(enrollment.version, 0);
    }

    #[test]
    fn time_spent_is_formatted_in_hours_and_minutes() {
        let mut enrollment = enrollment();

        enrollment.progress.total_time_spent = 12 * 60 + 30;
        assert_eq!(enrollment.formatted_time_spent(), "12m");

        enrollment.progress.total_time_spent = 3600 + 5 * 60;
        assert_eq!(enrollment.formatted_time_spent(), "1h 5m");
    }

    #[test]
    fn duration_rounds_partial_days_up() {
        let enrollment = enrollment();
        let later = Timestamp::from(*enrollment.enrolled_at.as_datetime() + chrono::Duration::hours(25));
        assert_eq!(enrollment.duration_days(later), 2);
        assert_eq!(enrollment.duration_days(enrollment.enrolled_at), 0);
    }

    #[test]
    fn only_active_unlocks_content() {
        assert!(EnrollmentStatus::Active.grants_access());
        assert!(!EnrollmentStatus::Completed.grants_access());
        assert!(!EnrollmentStatus::Dropped.grants_access());
        assert!(!EnrollmentStatus::Suspended.grants_access());
    }

    #[test]
    fn completed_enrollments_still_take_progress() {
        assert!(EnrollmentStatus::Active.accepts_progress());
        assert!(EnrollmentStatus::Completed.accepts_progress());
        assert!(!EnrollmentStatus::Dropped.accepts_progress());
        assert!(!EnrollmentStatus::Suspended.accepts_progress());
    }
}
