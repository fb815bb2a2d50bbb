use crate::prelude::*;

use super::Course;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    #[default]
    Video,
    Text,
    Quiz,
    Assignment,
    Document,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Lesson {
    #[new(default)]
    pub id: Record<Lesson>,
    #[new(default)]
    pub created_at: Timestamp,

    pub course: Record<Course>,
    pub title: String,
    /// Position inside the course, unique per course and starting at 1.
    pub order: u32,
    #[new(default)]
    #[serde(rename = "type", default)]
    pub kind: LessonKind,
    /// Preview lessons are visible to everyone, enrolled or not.
    #[new(default)]
    #[serde(default)]
    pub is_preview: bool,
    /// Duration in seconds.
    #[new(default)]
    #[serde(default)]
    pub duration: u64,
}

define_table!("lessons" : Lesson = id);

define_relation! {
    Lesson > get(id: &Record<Lesson>) > Option<Lesson>
        where "SELECT * FROM $id"
}

define_relation! {
    Lesson > of_course(course: &Record<Course>) > Vec<Lesson>
        where "SELECT * FROM lessons WHERE course = $course"
}

impl Lesson {
    pub fn belongs_to(&self, course: &Record<Course>) -> bool {
        &self.course == course
    }
}

/// Lessons of a course in their `order`.
pub fn in_course_order(mut lessons: Vec<Lesson>) -> Vec<Lesson> {
    lessons.sort_by_key(|lesson| lesson.order);
    lessons
}
