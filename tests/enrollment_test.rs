mod common;

use std::collections::HashMap;

use common::*;
use lms_backend::domain::{DomainError, NewCourse, Principal};
use lms_backend::models::{EnrollmentStatus, Role, TransactionType};

#[tokio::test]
async fn test_second_enrollment_is_rejected() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Onboarding")).await;

    let enrollment = state
        .enrollments
        .enroll_user(learner.id, course.id)
        .await
        .expect("first enrollment");
    assert_eq!(enrollment.completion_status, EnrollmentStatus::NotStarted);
    assert_eq!(enrollment.overall_progress, 0);

    let second = state.enrollments.enroll_user(learner.id, course.id).await;
    assert!(matches!(second, Err(DomainError::AlreadyEnrolled)));

    let course = state.courses.find_by_id(course.id).await.unwrap().unwrap();
    assert_eq!(course.enrollment_count, 1);
}

#[tokio::test]
async fn test_enroll_unknown_course() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;

    let result = state
        .enrollments
        .enroll_user(learner.id, uuid::Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(DomainError::NotFound("course"))));
}

#[tokio::test]
async fn test_full_course_rejects_second_learner() {
    let state = setup_state().await;
    let a = create_learner(&state, "a@lms.test").await;
    let b = create_learner(&state, "b@lms.test").await;
    let course = create_course(
        &state,
        NewCourse {
            max_enrollments: 1,
            ..NewCourse::titled("Small Group")
        },
    )
    .await;

    state
        .enrollments
        .enroll_user(a.id, course.id)
        .await
        .expect("A enrolls");
    let result = state.enrollments.enroll_user(b.id, course.id).await;
    assert!(matches!(result, Err(DomainError::CourseFull)));

    let course = state.courses.find_by_id(course.id).await.unwrap().unwrap();
    assert_eq!(course.enrollment_count, 1);
}

#[tokio::test]
async fn test_passing_scenario_awards_coins_and_certificate() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(
        &state,
        NewCourse {
            passing_score: 70,
            coins_reward: 150,
            ..NewCourse::titled("Security Basics")
        },
    )
    .await;
    let quiz = create_quiz(&state, course.id, 3, 0).await;
    let questions = add_choice_questions(&state, quiz.id, 10).await;

    state
        .enrollments
        .enroll_user(learner.id, course.id)
        .await
        .unwrap();
    state
        .enrollments
        .mark_started(learner.id, course.id)
        .await
        .unwrap();

    // 8 of 10 right
    let answers: HashMap<_, _> = questions
        .iter()
        .enumerate()
        .map(|(i, (question, right, wrong))| {
            let pick = if i < 8 { right } else { wrong };
            (*question, pick.to_string())
        })
        .collect();
    let attempt = state.quiz.start_attempt(learner.id, quiz.id).await.unwrap();
    let submitted = state
        .quiz
        .submit_attempt(learner.id, quiz.id, attempt.id, answers, 300)
        .await
        .unwrap();
    assert_eq!(submitted.submission.attempt.percentage, 80);
    assert!(submitted.submission.attempt.is_passed);

    let result = state
        .enrollments
        .complete_course(learner.id, course.id, 85)
        .await
        .unwrap();
    let completion = result.completion;
    assert!(completion.newly_completed);
    assert_eq!(
        completion.enrollment.completion_status,
        EnrollmentStatus::Completed
    );
    assert_eq!(completion.enrollment.overall_progress, 100);
    assert_eq!(completion.enrollment.final_score, Some(85));
    assert!(completion.enrollment.is_passed);

    let transaction = completion.transaction.expect("reward row");
    assert_eq!(transaction.amount, 150);
    assert_eq!(transaction.transaction_type, TransactionType::Earned);
    assert_eq!(transaction.reason, "Course Completion: Security Basics");

    let certificate = completion.certificate.expect("certificate");
    assert!(certificate.certificate_number.starts_with("CERT-"));
    assert_eq!(state.gamification.balance(learner.id).await.unwrap(), 150);

    let certificates = state
        .enrollments
        .list_certificates(learner.id)
        .await
        .unwrap();
    assert_eq!(certificates.len(), 1);
    let verified = state
        .enrollments
        .verify_certificate(&certificate.certificate_number)
        .await
        .unwrap();
    assert_eq!(verified.id, certificate.id);
}

#[tokio::test]
async fn test_completion_is_monotonic() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(
        &state,
        NewCourse {
            coins_reward: 50,
            ..NewCourse::titled("Ethics")
        },
    )
    .await;
    state
        .enrollments
        .enroll_user(learner.id, course.id)
        .await
        .unwrap();

    state
        .enrollments
        .complete_course(learner.id, course.id, 90)
        .await
        .unwrap();

    // Nothing below may reopen the enrollment
    let after_update = state
        .enrollments
        .update_progress(learner.id, course.id, 10)
        .await
        .unwrap();
    assert_eq!(after_update.completion_status, EnrollmentStatus::Completed);
    assert_eq!(after_update.overall_progress, 100);

    let after_start = state
        .enrollments
        .mark_started(learner.id, course.id)
        .await
        .unwrap();
    assert_eq!(after_start.completion_status, EnrollmentStatus::Completed);

    let again = state
        .enrollments
        .complete_course(learner.id, course.id, 40)
        .await
        .unwrap();
    assert!(!again.completion.newly_completed);
    assert!(again.completion.transaction.is_none());
    assert_eq!(again.completion.enrollment.final_score, Some(90));

    assert_eq!(state.gamification.balance(learner.id).await.unwrap(), 50);
    let course = state.courses.find_by_id(course.id).await.unwrap().unwrap();
    assert_eq!(course.completion_count, 1);
}

#[tokio::test]
async fn test_failed_completion_has_no_reward() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Hard Course")).await;
    state
        .enrollments
        .enroll_user(learner.id, course.id)
        .await
        .unwrap();

    let result = state
        .enrollments
        .complete_course(learner.id, course.id, 50)
        .await
        .unwrap();
    assert!(!result.completion.enrollment.is_passed);
    assert!(result.completion.transaction.is_none());
    assert!(result.completion.certificate.is_none());
    assert_eq!(state.gamification.balance(learner.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_progress_is_held_below_100_until_completion() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Spreadsheets")).await;
    state
        .enrollments
        .enroll_user(learner.id, course.id)
        .await
        .unwrap();

    let enrollment = state
        .enrollments
        .update_progress(learner.id, course.id, 100)
        .await
        .unwrap();
    assert_eq!(enrollment.overall_progress, 99);
    assert_eq!(enrollment.completion_status, EnrollmentStatus::InProgress);

    let invalid = state
        .enrollments
        .update_progress(learner.id, course.id, 101)
        .await;
    assert!(matches!(invalid, Err(DomainError::InvalidRange(_))));
    let invalid = state
        .enrollments
        .complete_course(learner.id, course.id, -1)
        .await;
    assert!(matches!(invalid, Err(DomainError::InvalidRange(_))));
}

#[tokio::test]
async fn test_mandatory_and_overdue_lists() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let hr = create_user(&state, "hr@lms.test", Role::HrPersonnel).await;
    let overdue = create_course(
        &state,
        NewCourse {
            is_mandatory: true,
            mandatory_due_date: Some(chrono::Utc::now() - chrono::Duration::days(1)),
            ..NewCourse::titled("Overdue Compliance")
        },
    )
    .await;
    let upcoming = create_course(
        &state,
        NewCourse {
            is_mandatory: true,
            mandatory_due_date: Some(chrono::Utc::now() + chrono::Duration::days(10)),
            ..NewCourse::titled("Upcoming Compliance")
        },
    )
    .await;
    let optional = create_course(&state, NewCourse::titled("Optional")).await;
    for course in [&overdue, &upcoming, &optional] {
        state
            .enrollments
            .enroll_user(learner.id, course.id)
            .await
            .unwrap();
    }

    let mandatory = state
        .enrollments
        .list_mandatory(learner.id, true)
        .await
        .unwrap();
    let titles: Vec<_> = mandatory.iter().map(|e| e.course.title.as_str()).collect();
    assert_eq!(titles, vec!["Overdue Compliance", "Upcoming Compliance"]);

    let learner_principal = Principal::new(learner.id, Role::Learner);
    assert!(matches!(
        state.enrollments.list_overdue(&learner_principal).await,
        Err(DomainError::Forbidden)
    ));

    let report = state
        .enrollments
        .list_overdue(&Principal::new(hr.id, hr.role))
        .await
        .unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].course.id, overdue.id);

    // Completing the overdue course takes it off both lists
    state
        .enrollments
        .complete_course(learner.id, overdue.id, 95)
        .await
        .unwrap();
    let mandatory = state
        .enrollments
        .list_mandatory(learner.id, true)
        .await
        .unwrap();
    assert_eq!(mandatory.len(), 1);
    let report = state
        .enrollments
        .list_overdue(&Principal::new(hr.id, hr.role))
        .await
        .unwrap();
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_only_reporting_roles_record_completion() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let instructor = create_user(&state, "instructor@lms.test", Role::Instructor).await;
    let course = create_course(
        &state,
        NewCourse {
            coins_reward: 100,
            ..NewCourse::titled("Signed Off")
        },
    )
    .await;
    state
        .enrollments
        .enroll_user(learner.id, course.id)
        .await
        .unwrap();

    let own = state
        .enrollments
        .record_completion(
            &Principal::new(learner.id, learner.role),
            learner.id,
            course.id,
            100,
        )
        .await;
    assert!(matches!(own, Err(DomainError::Forbidden)));
    assert!(
        state
            .enrollments
            .list_certificates(learner.id)
            .await
            .unwrap()
            .is_empty()
    );

    let signed = state
        .enrollments
        .record_completion(
            &Principal::new(instructor.id, instructor.role),
            learner.id,
            course.id,
            80,
        )
        .await
        .unwrap();
    assert!(signed.completion.newly_completed);
    assert_eq!(
        signed.completion.enrollment.completion_status,
        EnrollmentStatus::Completed
    );
    assert_eq!(state.gamification.balance(learner.id).await.unwrap(), 100);
}
