// Shared helpers; each test binary uses a different subset.
#![allow(dead_code)]

use lms_backend::config::Config;
use lms_backend::db;
use lms_backend::domain::{NewCourse, NewLesson, NewOption, NewQuestion, NewQuiz, NewUser};
use lms_backend::infrastructure::AppState;
use lms_backend::models::{QuestionType, Role, course, lesson, question_option, quiz, user};
use uuid::Uuid;

pub const TEST_DB: &str = "sqlite::memory:";

// Fresh in-memory database with every repository and service wired
pub async fn setup_state() -> AppState {
    let db = db::init_db(TEST_DB).await.expect("Failed to init DB");
    AppState::new(db, &Config::for_database(TEST_DB))
}

pub async fn create_user(state: &AppState, email: &str, role: Role) -> user::Model {
    state
        .users
        .create(NewUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            department: None,
            role,
        })
        .await
        .expect("Failed to create user")
}

pub async fn create_learner(state: &AppState, email: &str) -> user::Model {
    create_user(state, email, Role::Learner).await
}

pub async fn create_course(state: &AppState, input: NewCourse) -> course::Model {
    state
        .courses
        .create(input)
        .await
        .expect("Failed to create course")
}

pub async fn create_lesson(
    state: &AppState,
    course_id: Uuid,
    order_number: i32,
    duration_seconds: i64,
) -> lesson::Model {
    state
        .lessons
        .create(NewLesson {
            course_id,
            title: format!("Lesson {}", order_number),
            order_number,
            duration_seconds,
        })
        .await
        .expect("Failed to create lesson")
}

pub async fn create_quiz(
    state: &AppState,
    course_id: Uuid,
    max_attempts: i32,
    coins_reward: i64,
) -> quiz::Model {
    state
        .quizzes
        .create(NewQuiz {
            course_id,
            lesson_id: None,
            title: "Checkpoint".to_string(),
            passing_score: 70,
            max_attempts,
            time_limit_minutes: None,
            coins_reward,
        })
        .await
        .expect("Failed to create quiz")
}

/// Adds `count` two-option questions; returns (question id, correct option, wrong option)
pub async fn add_choice_questions(
    state: &AppState,
    quiz_id: Uuid,
    count: i32,
) -> Vec<(Uuid, Uuid, Uuid)> {
    let mut ids = Vec::new();
    for n in 1..=count {
        let added = state
            .quizzes
            .add_question(NewQuestion {
                quiz_id,
                text: format!("Question {}", n),
                question_type: QuestionType::Mcq,
                order_number: n,
                options: vec![
                    NewOption {
                        text: "right".to_string(),
                        is_correct: true,
                    },
                    NewOption {
                        text: "wrong".to_string(),
                        is_correct: false,
                    },
                ],
                accepted_answers: vec![],
            })
            .await
            .expect("Failed to add question");

        let pick = |correct: bool| -> Uuid {
            added
                .options
                .iter()
                .find(|o: &&question_option::Model| o.is_correct == correct)
                .map(|o| o.id)
                .expect("option missing")
        };
        ids.push((added.question.id, pick(true), pick(false)));
    }
    ids
}
