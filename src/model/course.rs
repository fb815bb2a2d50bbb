use crate::prelude::*;

use super::{Lesson, User};

/// A course as seen by the enrollment core. Course authoring lives elsewhere, this side only reads it
/// and bumps `enrollment_count`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Course {
    #[new(default)]
    pub id: Record<Course>,
    #[new(default)]
    pub created_at: Timestamp,

    pub title: String,
    pub instructor: Record<User>,
    #[new(default)]
    #[serde(default)]
    pub price: f64,
    #[new(value = "\"USD\".to_string()")]
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Ordered lesson references. Their count is the denominator of every completion percentage.
    #[new(default)]
    #[serde(default)]
    pub lessons: Vec<Record<Lesson>>,
    #[new(default)]
    #[serde(default)]
    pub is_published: bool,
    #[new(default)]
    #[serde(default)]
    pub enrollment_count: i64,
}

define_table!("courses" : Course = id);

define_relation! {
    Course > get(id: &Record<Course>) > Option<Course>
        where "SELECT * FROM $id"
}

define_relation! {
    Course > adjust_enrollment_count(id: &Record<Course>, delta: i64) > Option<Course>
        where "UPDATE $id SET enrollment_count += $delta RETURN AFTER"
}

impl Course {
    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_instructor(&self, user: &Record<User>) -> bool {
        &self.instructor == user
    }

    pub fn is_free(&self) -> bool {
        self.price <= 0.0
    }
}

fn default_currency() -> String {
    "USD".to_string()
}
