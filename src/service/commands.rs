//! Typed request payloads, validated before they reach the service.

use serde::Deserialize;
use validator::Validate;

use crate::model::EnrollmentStatus;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_COURSE_PAGE_SIZE: u32 = 20;

/// Completes a lesson on an enrollment.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct CompleteLessonCommand {
    pub lesson_id: String,
    #[validate(range(min = 0.0))]
    pub score: Option<f64>,
    pub time_spent: Option<u64>,
}

/// Score and time reported when a lesson is marked done.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Validate)]
pub struct LessonProgress {
    #[validate(range(min = 0.0))]
    pub score: Option<f64>,
    pub time_spent: Option<u64>,
}

impl From<&CompleteLessonCommand> for LessonProgress {
    fn from(command: &CompleteLessonCommand) -> Self {
        LessonProgress {
            score: command.score,
            time_spent: command.time_spent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct NoteCommand {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    pub status: Option<EnrollmentStatus>,
}

impl Default for PageQuery {
    fn default() -> Self {
        PageQuery {
            page: first_page(),
            limit: None,
            status: None,
        }
    }
}

impl PageQuery {
    /// `(start, limit)` with `default_limit` standing in for a missing limit.
    pub fn window(&self, default_limit: u32) -> (u64, u64) {
        let limit = u64::from(self.limit.unwrap_or(default_limit));
        let start = u64::from(self.page.saturating_sub(1)) * limit;
        (start, limit)
    }
}

fn first_page() -> u32 {
    1
}
