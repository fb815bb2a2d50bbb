use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Enrollment, EnrollmentStatus};

const RECENT_ACTIVITY: usize = 5;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StatusStats {
    pub count: u64,
    pub total_time_spent: u64,
    pub average_completion: f64,
}

/// A student's enrollments summarised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentStats {
    pub by_status: BTreeMap<EnrollmentStatus, StatusStats>,
    pub completed_courses: u64,
    pub recent_activity: Vec<Enrollment>,
}

impl EnrollmentStats {
    pub fn from_enrollments(enrollments: Vec<Enrollment>) -> Self {
        let mut by_status: BTreeMap<EnrollmentStatus, StatusStats> = BTreeMap::new();
        let mut completion_sums: BTreeMap<EnrollmentStatus, u64> = BTreeMap::new();

        for enrollment in &enrollments {
            let stats = by_status.entry(enrollment.status).or_default();
            stats.count += 1;
            stats.total_time_spent += enrollment.progress.total_time_spent;

            *completion_sums.entry(enrollment.status).or_default() +=
                u64::from(enrollment.completion.completion_percentage);
        }

        for (status, stats) in by_status.iter_mut() {
            let sum = completion_sums.get(status).copied().unwrap_or_default();
            stats.average_completion = sum as f64 / stats.count as f64;
        }

        let completed_courses = enrollments
            .iter()
            .filter(|enrollment| enrollment.completion.is_completed)
            .count() as u64;

        let mut recent_activity = enrollments;
        recent_activity.sort_by(|a, b| b.progress.last_accessed_at.cmp(&a.progress.last_accessed_at));
        recent_activity.truncate(RECENT_ACTIVITY);

        EnrollmentStats {
            by_status,
            completed_courses,
            recent_activity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Record;
    use crate::model::{Course, Payment, Timestamp};

    fn enrollment(status: EnrollmentStatus, percentage: u8, time: u64, minutes_ago: i64) -> Enrollment {
        let course = Course::new("Traits".into(), Record::new("ferris"));
        let mut enrollment = Enrollment::new(Record::new("alice"), course.id.clone(), Payment::for_course(&course));
        enrollment.status = status;
        enrollment.completion.completion_percentage = percentage;
        enrollment.completion.is_completed = status == EnrollmentStatus::Completed;
        enrollment.progress.total_time_spent = time;
        enrollment.progress.last_accessed_at =
            Timestamp::from(chrono::Utc::now() - chrono::Duration::minutes(minutes_ago));
        enrollment
    }

    #[test]
    fn groups_by_status() {
        let stats = EnrollmentStats::from_enrollments(vec![
            enrollment(EnrollmentStatus::Active, 20, 100, 3),
            enrollment(EnrollmentStatus::Active, 50, 200, 2),
            enrollment(EnrollmentStatus::Completed, 100, 900, 1),
        ]);

        let active = &stats.by_status[&EnrollmentStatus::Active];
        assert_eq!(active.count, 2);
        assert_eq!(active.total_time_spent, 300);
        assert_eq!(active.average_completion, 35.0);

        assert_eq!(stats.by_status[&EnrollmentStatus::Completed].count, 1);
        assert!(!stats.by_status.contains_key(&EnrollmentStatus::Dropped));
        assert_eq!(stats.completed_courses, 1);
    }

    #[test]
    fn recent_activity_keeps_the_latest_five() {
        let enrollments = (0..7)
            .map(|minutes_ago| enrollment(EnrollmentStatus::Active, 0, 0, minutes_ago))
            .collect();

        let stats = EnrollmentStats::from_enrollments(enrollments);

        assert_eq!(stats.recent_activity.len(), 5);
        assert!(stats
            .recent_activity
            .windows(2)
            .all(|pair| pair[0].progress.last_accessed_at >= pair[1].progress.last_accessed_at));
    }

    #[test]
    fn no_enrollments_means_empty_stats() {
        let stats = EnrollmentStats::from_enrollments(Vec::new());
        assert!(stats.by_status.is_empty());
        assert_eq!(stats.completed_courses, 0);
        assert!(stats.recent_activity.is_empty());
    }
}
