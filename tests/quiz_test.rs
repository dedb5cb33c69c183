mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::*;
use lms_backend::domain::{DomainError, NewAcceptedAnswer, NewCourse, NewQuestion, Principal};
use lms_backend::infrastructure::AppState;
use lms_backend::models::{QuestionType, Role};
use lms_backend::services::TextAnswerGrader;
use uuid::Uuid;

#[tokio::test]
async fn test_attempt_numbers_and_limit() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Networking")).await;
    let quiz = create_quiz(&state, course.id, 3, 0).await;

    for expected in 1..=3 {
        let attempt = state.quiz.start_attempt(learner.id, quiz.id).await.unwrap();
        assert_eq!(attempt.attempt_number, expected);
        assert!(attempt.submitted_at.is_none());
    }

    let fourth = state.quiz.start_attempt(learner.id, quiz.id).await;
    assert!(matches!(fourth, Err(DomainError::AttemptLimitExceeded)));
    assert_eq!(state.quiz.attempt_count(learner.id, quiz.id).await.unwrap(), 3);

    // Another learner has their own counter
    let other = create_learner(&state, "b@lms.test").await;
    let attempt = state.quiz.start_attempt(other.id, quiz.id).await.unwrap();
    assert_eq!(attempt.attempt_number, 1);
}

#[tokio::test]
async fn test_concurrent_starts_stay_contiguous() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Databases")).await;
    let quiz = create_quiz(&state, course.id, 0, 0).await;

    let quiz_service = Arc::clone(&state.quiz);
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let service = Arc::clone(&quiz_service);
            let (user_id, quiz_id) = (learner.id, quiz.id);
            tokio::spawn(async move { service.start_attempt(user_id, quiz_id).await })
        })
        .collect();

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().attempt_number);
    }
    numbers.sort();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_submit_grades_and_rewards_once() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Cloud")).await;
    let quiz = create_quiz(&state, course.id, 3, 40).await;
    let questions = add_choice_questions(&state, quiz.id, 10).await;

    let answers: HashMap<Uuid, String> = questions
        .iter()
        .enumerate()
        .map(|(i, (question, right, wrong))| {
            let pick = if i < 8 { right } else { wrong };
            (*question, pick.to_string())
        })
        .collect();

    let attempt = state.quiz.start_attempt(learner.id, quiz.id).await.unwrap();
    let result = state
        .quiz
        .submit_attempt(learner.id, quiz.id, attempt.id, answers.clone(), 120)
        .await
        .unwrap();

    let graded = &result.submission.attempt;
    assert_eq!(graded.score, 8);
    assert_eq!(graded.max_score, 10);
    assert_eq!(graded.percentage, 80);
    assert!(graded.is_passed);
    assert!(graded.submitted_at.is_some());
    assert_eq!(result.submission.answers.len(), 10);
    let reward = result.submission.transaction.as_ref().expect("reward row");
    assert_eq!(reward.amount, 40);
    assert_eq!(reward.reason, "Quiz Passed: Checkpoint");

    let again = state
        .quiz
        .submit_attempt(learner.id, quiz.id, attempt.id, answers, 120)
        .await;
    assert!(matches!(again, Err(DomainError::AlreadySubmitted)));
    assert_eq!(state.gamification.balance(learner.id).await.unwrap(), 40);
}

#[tokio::test]
async fn test_failed_attempt_and_missing_answers() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Excel")).await;
    let quiz = create_quiz(&state, course.id, 3, 40).await;
    let questions = add_choice_questions(&state, quiz.id, 4).await;

    // Two right, two unanswered
    let answers: HashMap<Uuid, String> = questions
        .iter()
        .take(2)
        .map(|(question, right, _)| (*question, right.to_string()))
        .collect();

    let attempt = state.quiz.start_attempt(learner.id, quiz.id).await.unwrap();
    let result = state
        .quiz
        .submit_attempt(learner.id, quiz.id, attempt.id, answers, 60)
        .await
        .unwrap();
    assert_eq!(result.submission.attempt.percentage, 50);
    assert!(!result.submission.attempt.is_passed);
    assert!(result.submission.transaction.is_none());
    assert_eq!(state.gamification.balance(learner.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_foreign_attempt_is_not_found() {
    let state = setup_state().await;
    let owner = create_learner(&state, "a@lms.test").await;
    let intruder = create_learner(&state, "b@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Privacy")).await;
    let quiz = create_quiz(&state, course.id, 3, 0).await;

    let attempt = state.quiz.start_attempt(owner.id, quiz.id).await.unwrap();
    let result = state
        .quiz
        .submit_attempt(intruder.id, quiz.id, attempt.id, HashMap::new(), 10)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));

    let negative = state
        .quiz
        .submit_attempt(owner.id, quiz.id, attempt.id, HashMap::new(), -5)
        .await;
    assert!(matches!(negative, Err(DomainError::InvalidRange(_))));
}

#[tokio::test]
async fn test_quiz_view_hides_correct_answers() {
    let state = setup_state().await;
    let course = create_course(&state, NewCourse::titled("Secrets")).await;
    let quiz = create_quiz(&state, course.id, 3, 0).await;
    add_choice_questions(&state, quiz.id, 2).await;

    let view = state.quiz.get_quiz(quiz.id).await.unwrap();
    assert_eq!(view.questions.len(), 2);

    let json = serde_json::to_value(&view).unwrap();
    let option = &json["questions"][0]["options"][0];
    assert!(option.get("option_text").is_some());
    assert!(option.get("is_correct").is_none());
    assert!(json["questions"][0].get("accepted_answers").is_none());
}

#[tokio::test]
async fn test_quiz_stats_require_reporting_role() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let instructor = create_user(&state, "i@lms.test", Role::Instructor).await;
    let course = create_course(&state, NewCourse::titled("Stats")).await;
    let quiz = create_quiz(&state, course.id, 3, 0).await;
    let questions = add_choice_questions(&state, quiz.id, 2).await;

    for picks_right in [true, false] {
        let answers: HashMap<Uuid, String> = questions
            .iter()
            .map(|(q, right, wrong)| (*q, if picks_right { right } else { wrong }.to_string()))
            .collect();
        let attempt = state.quiz.start_attempt(learner.id, quiz.id).await.unwrap();
        state
            .quiz
            .submit_attempt(learner.id, quiz.id, attempt.id, answers, 30)
            .await
            .unwrap();
    }

    let denied = state
        .quiz
        .quiz_stats(&Principal::new(learner.id, Role::Learner), quiz.id)
        .await;
    assert!(matches!(denied, Err(DomainError::Forbidden)));

    let stats = state
        .quiz
        .quiz_stats(&Principal::new(instructor.id, Role::Instructor), quiz.id)
        .await
        .unwrap();
    assert_eq!(stats.total_attempts, 2);
    assert_eq!(stats.passed_attempts, 1);
}

#[tokio::test]
async fn test_text_answers_with_text_grader() {
    let db = lms_backend::db::init_db(TEST_DB).await.unwrap();
    let state = AppState::with_grader(
        db,
        &lms_backend::config::Config::for_database(TEST_DB),
        Arc::new(TextAnswerGrader),
    );
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Rust")).await;
    let quiz = create_quiz(&state, course.id, 3, 0).await;

    let question = state
        .quizzes
        .add_question(NewQuestion {
            quiz_id: quiz.id,
            text: "What checks references?".to_string(),
            question_type: QuestionType::ShortAnswer,
            order_number: 1,
            options: vec![],
            accepted_answers: vec![NewAcceptedAnswer {
                text: "borrow checker".to_string(),
                is_partial_ok: false,
            }],
        })
        .await
        .unwrap();

    let attempt = state.quiz.start_attempt(learner.id, quiz.id).await.unwrap();
    let answers = HashMap::from([(question.question.id, "  Borrow   Checker ".to_string())]);
    let result = state
        .quiz
        .submit_attempt(learner.id, quiz.id, attempt.id, answers, 15)
        .await
        .unwrap();
    assert_eq!(result.submission.attempt.percentage, 100);
}
