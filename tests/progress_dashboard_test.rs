mod common;

use common::*;
use lms_backend::domain::{DomainError, NewCourse};
use lms_backend::models::EnrollmentStatus;

#[tokio::test]
async fn test_lesson_completion_is_first_write_wins() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Video Course")).await;
    let lesson = create_lesson(&state, course.id, 1, 600).await;

    let partial = state
        .progress
        .track_progress(learner.id, course.id, lesson.id, 300, 600)
        .await
        .unwrap();
    assert_eq!(partial.progress_percentage, 50);
    assert!(!partial.is_completed);

    let done = state
        .progress
        .track_progress(learner.id, course.id, lesson.id, 540, 600)
        .await
        .unwrap();
    assert_eq!(done.progress_percentage, 90);
    assert!(done.is_completed);
    let completed_at = done.completed_at.expect("completion time");

    // Rewatching from the start keeps the completion
    let rewatch = state
        .progress
        .track_progress(learner.id, course.id, lesson.id, 60, 600)
        .await
        .unwrap();
    assert!(rewatch.is_completed);
    assert_eq!(rewatch.completed_at, Some(completed_at));
    assert_eq!(rewatch.progress_percentage, 10);

    // Learning time counted once
    let hours = state.progress.learning_hours(learner.id).await.unwrap();
    assert!((hours - 600.0 / 3600.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_learning_time_capped_at_lesson_duration() {
    let state = setup_state().await;
    let inflated = create_learner(&state, "inflated@lms.test").await;
    let honest = create_learner(&state, "honest@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Short Video")).await;
    let lesson = create_lesson(&state, course.id, 1, 600).await;

    let done = state
        .progress
        .track_progress(inflated.id, course.id, lesson.id, 3_600_000, 3_600_000)
        .await
        .unwrap();
    assert!(done.is_completed);
    state
        .progress
        .track_progress(honest.id, course.id, lesson.id, 600, 600)
        .await
        .unwrap();

    let inflated_hours = state.progress.learning_hours(inflated.id).await.unwrap();
    let honest_hours = state.progress.learning_hours(honest.id).await.unwrap();
    assert!((inflated_hours - 600.0 / 3600.0).abs() < f64::EPSILON);
    assert!((inflated_hours - honest_hours).abs() < f64::EPSILON);

    let dashboard = state.dashboard.get_dashboard(inflated.id).await.unwrap();
    assert_eq!(dashboard.leaderboard_rank, 1);
    let dashboard = state.dashboard.get_dashboard(honest.id).await.unwrap();
    assert_eq!(dashboard.leaderboard_rank, 1);
}

#[tokio::test]
async fn test_track_progress_validation() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("One")).await;
    let other = create_course(&state, NewCourse::titled("Two")).await;
    let lesson = create_lesson(&state, course.id, 1, 600).await;

    let negative = state
        .progress
        .track_progress(learner.id, course.id, lesson.id, -1, 600)
        .await;
    assert!(matches!(negative, Err(DomainError::InvalidRange(_))));

    // Lesson of another course
    let mismatched = state
        .progress
        .track_progress(learner.id, other.id, lesson.id, 10, 600)
        .await;
    assert!(matches!(mismatched, Err(DomainError::NotFound("lesson"))));

    let missing = state
        .progress
        .get_lesson_progress(learner.id, course.id, lesson.id)
        .await;
    assert!(matches!(missing, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_sync_progress_averages_lessons() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Two Lessons")).await;
    let first = create_lesson(&state, course.id, 1, 100).await;
    let second = create_lesson(&state, course.id, 2, 100).await;
    state
        .enrollments
        .enroll_user(learner.id, course.id)
        .await
        .unwrap();

    state
        .progress
        .track_progress(learner.id, course.id, first.id, 100, 100)
        .await
        .unwrap();
    state
        .progress
        .track_progress(learner.id, course.id, second.id, 40, 100)
        .await
        .unwrap();

    let rows = state
        .progress
        .get_course_progress(learner.id, course.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].lesson_id, first.id);

    let enrollment = state
        .enrollments
        .sync_progress(learner.id, course.id)
        .await
        .unwrap();
    assert_eq!(enrollment.overall_progress, 70);
    assert_eq!(enrollment.completion_status, EnrollmentStatus::InProgress);
}

#[tokio::test]
async fn test_dashboard_summarises_the_learner() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let busier = create_learner(&state, "b@lms.test").await;

    let mandatory = create_course(
        &state,
        NewCourse {
            is_mandatory: true,
            mandatory_due_date: Some(chrono::Utc::now() + chrono::Duration::days(7)),
            ..NewCourse::titled("Compliance")
        },
    )
    .await;
    let optional = create_course(
        &state,
        NewCourse {
            coins_reward: 120,
            ..NewCourse::titled("Optional")
        },
    )
    .await;
    let started = create_course(&state, NewCourse::titled("Started")).await;
    let lesson = create_lesson(&state, started.id, 1, 3600).await;

    for course in [&mandatory, &optional, &started] {
        state
            .enrollments
            .enroll_user(learner.id, course.id)
            .await
            .unwrap();
    }
    state
        .enrollments
        .mark_started(learner.id, started.id)
        .await
        .unwrap();
    state
        .enrollments
        .complete_course(learner.id, optional.id, 88)
        .await
        .unwrap();
    state
        .progress
        .track_progress(learner.id, started.id, lesson.id, 3600, 3600)
        .await
        .unwrap();

    // Someone with more learning time ranks first
    state
        .enrollments
        .enroll_user(busier.id, started.id)
        .await
        .unwrap();
    let long = create_lesson(&state, started.id, 2, 7200).await;
    state
        .progress
        .track_progress(busier.id, started.id, long.id, 7200, 7200)
        .await
        .unwrap();

    let dashboard = state.dashboard.get_dashboard(learner.id).await.unwrap();
    assert_eq!(dashboard.user_id, learner.id);
    assert_eq!(dashboard.mandatory_courses.len(), 1);
    assert_eq!(dashboard.mandatory_courses[0].course.id, mandatory.id);
    assert_eq!(dashboard.in_progress_courses.len(), 1);
    assert_eq!(dashboard.in_progress_courses[0].course.id, started.id);
    assert_eq!(dashboard.completed_courses, 1);
    assert_eq!(dashboard.certificates, 1);
    assert_eq!(dashboard.coins, 120);
    assert!((dashboard.learning_hours - 1.0).abs() < f64::EPSILON);
    assert_eq!(dashboard.current_streak, 1);
    assert_eq!(dashboard.leaderboard_rank, 2);
    assert_eq!(dashboard.recent_transactions.len(), 1);
    assert_eq!(dashboard.recent_transactions[0].amount, 120);

    let missing = state.dashboard.get_dashboard(uuid::Uuid::new_v4()).await;
    assert!(matches!(missing, Err(DomainError::NotFound("user"))));
}
