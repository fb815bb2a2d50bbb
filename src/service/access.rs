//! Who may see which lessons. Pure functions over already loaded documents.

use crate::model::{Course, Enrollment, Lesson, Principal};

/// Whether `principal` may see every lesson of `course` rather than only the preview ones.
///
/// Admins and the course's instructor always can. Students need an enrollment whose status keeps access open.
pub fn can_view_course_lessons(
    principal: Option<&Principal>,
    course: &Course,
    enrollment: Option<&Enrollment>,
) -> bool {
    let Some(principal) = principal else {
        return false;
    };

    if principal.is_admin() || course.is_instructor(&principal.id) {
        return true;
    }

    enrollment.is_some_and(|enrollment| {
        enrollment.is_owned_by(&principal.id)
            && enrollment.course == course.id
            && enrollment.status.grants_access()
    })
}

/// Whether `principal` may open `lesson`. Preview lessons are open to anyone, anonymous callers included.
pub fn can_access_lesson(
    principal: Option<&Principal>,
    course: &Course,
    lesson: &Lesson,
    enrollment: Option<&Enrollment>,
) -> bool {
    if lesson.is_preview {
        return true;
    }

    lesson.belongs_to(&course.id) && can_view_course_lessons(principal, course, enrollment)
}

/// The lessons a caller gets to see: all of them with access, the previews otherwise.
pub fn visible_lessons(lessons: Vec<Lesson>, has_access: bool) -> Vec<Lesson> {
    if has_access {
        return lessons;
    }

    lessons.into_iter().filter(|lesson| lesson.is_preview).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Record;
    use crate::model::{EnrollmentStatus, Payment, Role};

    struct Fixture {
        instructor: Principal,
        student: Principal,
        course: Course,
        lesson: Lesson,
        preview: Lesson,
    }

    fn fixture() -> Fixture {
        let instructor = Principal::new(Record::new("ferris"), Role::Instructor);
        let student = Principal::new(Record::new("alice"), Role::Student);
        let mut course = Course::new("Async Rust".into(), instructor.id.clone());
        course.is_published = true;

        let lesson = Lesson::new(course.id.clone(), "Pinning".into(), 2);
        let mut preview = Lesson::new(course.id.clone(), "Welcome".into(), 1);
        preview.is_preview = true;

        Fixture { instructor, student, course, lesson, preview }
    }

    fn enrollment(fixture: &Fixture, status: EnrollmentStatus) -> Enrollment {
        let mut enrollment = Enrollment::new(
            fixture.student.id.clone(),
            fixture.course.id.clone(),
            Payment::for_course(&fixture.course),
        );
        enrollment.status = status;
        enrollment
    }

    #[test]
    fn preview_lessons_are_open_to_anyone() {
        let fixture = fixture();
        assert!(can_access_lesson(None, &fixture.course, &fixture.preview, None));
        assert!(can_access_lesson(Some(&fixture.student), &fixture.course, &fixture.preview, None));
    }

    #[test]
    fn anonymous_callers_only_see_previews() {
        let fixture = fixture();
        assert!(!can_view_course_lessons(None, &fixture.course, None));
        assert!(!can_access_lesson(None, &fixture.course, &fixture.lesson, None));
    }

    #[test]
    fn staff_see_everything() {
        let fixture = fixture();
        let admin = Principal::new(Record::new("root"), Role::Admin);

        assert!(can_access_lesson(Some(&fixture.instructor), &fixture.course, &fixture.lesson, None));
        assert!(can_access_lesson(Some(&admin), &fixture.course, &fixture.lesson, None));
    }

    #[test]
    fn enrolled_students_need_an_active_status() {
        let fixture = fixture();
        let student = Some(&fixture.student);

        for (status, allowed) in [
            (EnrollmentStatus::Active, true),
            (EnrollmentStatus::Completed, false),
            (EnrollmentStatus::Dropped, false),
            (EnrollmentStatus::Suspended, false),
        ] {
            let enrollment = enrollment(&fixture, status);
            assert_eq!(
                can_access_lesson(student, &fixture.course, &fixture.lesson, Some(&enrollment)),
                allowed,
                "{status}"
            );
        }

        assert!(!can_access_lesson(student, &fixture.course, &fixture.lesson, None));
    }

    #[test]
    fn someone_elses_enrollment_does_not_count() {
        let fixture = fixture();
        let bob = Principal::new(Record::new("bob"), Role::Student);
        let enrollment = enrollment(&fixture, EnrollmentStatus::Active);

        assert!(!can_view_course_lessons(Some(&bob), &fixture.course, Some(&enrollment)));
    }

    #[test]
    fn lessons_of_other_courses_are_refused() {
        let fixture = fixture();
        let enrollment = enrollment(&fixture, EnrollmentStatus::Active);
        let stray = Lesson::new(Record::new("other"), "Elsewhere".into(), 1);

        assert!(!can_access_lesson(Some(&fixture.student), &fixture.course, &stray, Some(&enrollment)));
    }

    #[test]
    fn without_access_only_previews_remain() {
        let fixture = fixture();
        let lessons = vec![fixture.preview.clone(), fixture.lesson.clone()];

        assert_eq!(visible_lessons(lessons.clone(), true).len(), 2);
        assert_eq!(visible_lessons(lessons, false), vec![fixture.preview]);
    }
}
