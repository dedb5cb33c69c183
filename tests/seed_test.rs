mod common;

use common::*;
use lms_backend::models::Role;
use lms_backend::seed;

#[tokio::test]
async fn test_seed_demo_data_is_idempotent() {
    let state = setup_state().await;

    seed::seed_demo_data(&state).await.expect("first seed");
    seed::seed_demo_data(&state).await.expect("second seed");

    let admin = state
        .users
        .find_by_email("admin@lms.local")
        .await
        .unwrap()
        .expect("admin seeded");
    assert_eq!(admin.role, Role::Admin);

    let safety = state
        .courses
        .find_by_title("Workplace Safety")
        .await
        .unwrap()
        .expect("mandatory course seeded");
    assert!(safety.is_mandatory);
    assert!(safety.mandatory_due_date.is_some());
    assert_eq!(state.lessons.list_by_course(safety.id).await.unwrap().len(), 3);

    let definitions = state.badges.definitions().await.unwrap();
    assert_eq!(definitions.len(), 6);
    assert!(state.badges.find_by_name("Quiz Master").await.unwrap().is_some());
}

#[tokio::test]
async fn test_seeded_quiz_is_playable() {
    let state = setup_state().await;
    seed::seed_demo_data(&state).await.unwrap();

    let learner = state
        .users
        .find_by_email("learner@lms.local")
        .await
        .unwrap()
        .unwrap();
    let course = state
        .courses
        .find_by_title("Rust Fundamentals")
        .await
        .unwrap()
        .unwrap();
    state
        .enrollments
        .enroll_user(learner.id, course.id)
        .await
        .unwrap();
    assert_eq!(course.max_enrollments, 50);

    let enrollments = state
        .enrollments
        .list_enrollments(learner.id, None)
        .await
        .unwrap();
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0].course.title, "Rust Fundamentals");
}
