//! Progress Service - lesson watch-time telemetry and completion

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::GamificationService;
use crate::domain::{
    DomainError, LessonRepository, ProgressRepository, ProgressUpdate, UserRepository,
};
use crate::models::lesson_progress;

/// `floor(watched * 100 / total)`, capped at 100; 0 when nothing is known about the length
pub fn progress_percentage(watched_seconds: i64, total_seconds: i64) -> i32 {
    if total_seconds <= 0 {
        return 0;
    }
    let pct = i128::from(watched_seconds.max(0)) * 100 / i128::from(total_seconds);
    pct.min(100) as i32
}

/// Integer mean of lesson percentages; 0 for no lessons.
///
/// Lessons are weighted equally regardless of their length.
pub fn average_progress(percentages: &[i32]) -> i32 {
    if percentages.is_empty() {
        return 0;
    }
    let sum: i64 = percentages.iter().map(|p| i64::from(*p)).sum();
    (sum / percentages.len() as i64) as i32
}

/// Learning time a completion is worth: the reported length, never more than
/// the lesson's own duration.
pub fn credited_seconds(total_seconds: i64, lesson_duration_seconds: i64) -> i64 {
    total_seconds.min(lesson_duration_seconds).max(0)
}

pub struct ProgressService {
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
    users: Arc<dyn UserRepository>,
    gamification: Arc<GamificationService>,
    completion_threshold: i32,
}

impl ProgressService {
    pub fn new(
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
        users: Arc<dyn UserRepository>,
        gamification: Arc<GamificationService>,
        completion_threshold: i32,
    ) -> Self {
        Self {
            lessons,
            progress,
            users,
            gamification,
            completion_threshold,
        }
    }

    /// Record how far the user has watched a lesson.
    ///
    /// Does not touch the enrollment; see `EnrollmentService::sync_progress`.
    pub async fn track_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
        watched_seconds: i64,
        total_seconds: i64,
    ) -> Result<lesson_progress::Model, DomainError> {
        if watched_seconds < 0 || total_seconds < 0 {
            return Err(DomainError::InvalidRange(
                "watched and total seconds must not be negative".to_string(),
            ));
        }

        let lesson = self
            .lessons
            .find_by_id(lesson_id)
            .await?
            .filter(|l| l.course_id == course_id)
            .ok_or(DomainError::NotFound("lesson"))?;

        let percentage = progress_percentage(watched_seconds, total_seconds);
        let now = Utc::now();
        let was_completed = self
            .progress
            .find(user_id, course_id, lesson.id)
            .await?
            .is_some_and(|p| p.is_completed);

        let saved = self
            .progress
            .save(ProgressUpdate {
                user_id,
                course_id,
                lesson_id: lesson.id,
                watched_seconds,
                total_seconds,
                progress_percentage: percentage,
                reaches_completion: percentage >= self.completion_threshold,
                credited_seconds: credited_seconds(total_seconds, lesson.duration_seconds),
                at: now,
            })
            .await?;

        let newly_completed = saved.is_completed && !was_completed;
        let activity = self
            .gamification
            .record_activity(user_id, now.date_naive())
            .await?;

        if newly_completed || activity.streak_updated {
            self.gamification.check_and_award_badges(user_id).await?;
        }

        Ok(saved)
    }

    pub async fn get_lesson_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<lesson_progress::Model, DomainError> {
        self.progress
            .find(user_id, course_id, lesson_id)
            .await?
            .ok_or(DomainError::NotFound("lesson progress"))
    }

    pub async fn get_course_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Vec<lesson_progress::Model>, DomainError> {
        self.progress.list_for_course(user_id, course_id).await
    }

    pub async fn calculate_course_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<i32, DomainError> {
        let rows = self.progress.list_for_course(user_id, course_id).await?;
        let percentages: Vec<i32> = rows.iter().map(|r| r.progress_percentage).collect();
        Ok(average_progress(&percentages))
    }

    /// Hours of completed lessons
    pub async fn learning_hours(&self, user_id: Uuid) -> Result<f64, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;
        Ok(user.total_learning_seconds as f64 / 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_floors_and_caps() {
        assert_eq!(progress_percentage(0, 600), 0);
        assert_eq!(progress_percentage(539, 600), 89);
        assert_eq!(progress_percentage(540, 600), 90);
        assert_eq!(progress_percentage(900, 600), 100);
        assert_eq!(progress_percentage(120, 0), 0);
        assert_eq!(progress_percentage(i64::MAX, 1), 100);
    }

    #[test]
    fn credit_never_exceeds_lesson_duration() {
        assert_eq!(credited_seconds(600, 600), 600);
        assert_eq!(credited_seconds(3_600_000, 600), 600);
        assert_eq!(credited_seconds(300, 600), 300);
        assert_eq!(credited_seconds(600, 0), 0);
    }

    #[test]
    fn course_progress_is_mean_of_lessons() {
        assert_eq!(average_progress(&[]), 0);
        assert_eq!(average_progress(&[100, 50]), 75);
        assert_eq!(average_progress(&[100, 0, 0]), 33);
    }
}
