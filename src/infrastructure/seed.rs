//! Demo data and the standard badge catalogue.
//!
//! Every step looks its record up first, so seeding twice is harmless.

use chrono::{Duration, Utc};

use crate::domain::{
    BadgeCriteria, BadgeRepository, DomainError, NewAcceptedAnswer, NewBadge, NewCourse,
    NewLesson, NewOption, NewQuestion, NewQuiz, NewUser,
};
use crate::infrastructure::AppState;
use crate::models::{BadgeLevel, QuestionType, Role};

pub fn standard_badges() -> Vec<NewBadge> {
    let badge = |name: &str, description: &str, level, criteria| NewBadge {
        name: name.to_string(),
        description: description.to_string(),
        level,
        criteria,
    };

    vec![
        badge(
            "Bronze Learner",
            "Complete your first course",
            BadgeLevel::Bronze,
            BadgeCriteria::CoursesCompleted {
                value: 1,
                avg_score: None,
            },
        ),
        badge(
            "Silver Learner",
            "Complete 5 courses",
            BadgeLevel::Silver,
            BadgeCriteria::CoursesCompleted {
                value: 5,
                avg_score: None,
            },
        ),
        badge(
            "Gold Learner",
            "Complete 10 courses",
            BadgeLevel::Gold,
            BadgeCriteria::CoursesCompleted {
                value: 10,
                avg_score: None,
            },
        ),
        badge(
            "Platinum Expert",
            "Complete 20 courses with an average score of 90",
            BadgeLevel::Platinum,
            BadgeCriteria::CoursesCompleted {
                value: 20,
                avg_score: Some(90),
            },
        ),
        badge(
            "Quiz Master",
            "Score 100% on 5 quizzes",
            BadgeLevel::Gold,
            BadgeCriteria::PerfectQuizzes { value: 5 },
        ),
        badge(
            "Consistent Learner",
            "Learn 30 days in a row",
            BadgeLevel::Silver,
            BadgeCriteria::StreakDays { days: 30 },
        ),
    ]
}

/// Insert the standard badges that do not exist yet
pub async fn seed_badges(badges: &dyn BadgeRepository) -> Result<usize, DomainError> {
    let mut created = 0;
    for badge in standard_badges() {
        if badges.find_by_name(&badge.name).await?.is_none() {
            badges.create(badge).await?;
            created += 1;
        }
    }
    Ok(created)
}

pub async fn seed_demo_data(state: &AppState) -> Result<(), DomainError> {
    // 1. Users
    let people = [
        ("admin@lms.local", "Ada", "Admin", Role::Admin),
        ("hr@lms.local", "Harper", "Reyes", Role::HrPersonnel),
        ("instructor@lms.local", "Ivan", "Teach", Role::Instructor),
        ("learner@lms.local", "Lee", "Learner", Role::Learner),
    ];
    let mut instructor_id = None;
    for (email, first_name, last_name, role) in people {
        let user = match state.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                state
                    .users
                    .create(NewUser {
                        email: email.to_string(),
                        first_name: first_name.to_string(),
                        last_name: last_name.to_string(),
                        department: Some("Engineering".to_string()),
                        role,
                    })
                    .await?
            }
        };
        if role == Role::Instructor {
            instructor_id = Some(user.id);
        }
    }

    // 2. Courses with lessons
    let courses = [
        (
            NewCourse {
                description: Some("Required yearly safety training".to_string()),
                category: Some("Compliance".to_string()),
                instructor_id,
                is_mandatory: true,
                mandatory_due_date: Some(Utc::now() + Duration::days(30)),
                coins_reward: 150,
                ..NewCourse::titled("Workplace Safety")
            },
            ["Hazards", "Emergency Procedures", "Reporting"],
        ),
        (
            NewCourse {
                description: Some("Ownership, borrowing and lifetimes".to_string()),
                category: Some("Engineering".to_string()),
                instructor_id,
                max_enrollments: 50,
                ..NewCourse::titled("Rust Fundamentals")
            },
            ["Ownership", "Borrowing", "Lifetimes"],
        ),
    ];

    for (new_course, lesson_titles) in courses {
        if state.courses.find_by_title(&new_course.title).await?.is_some() {
            continue;
        }
        let course = state.courses.create(new_course).await?;
        for (index, title) in lesson_titles.iter().enumerate() {
            state
                .lessons
                .create(NewLesson {
                    course_id: course.id,
                    title: title.to_string(),
                    order_number: index as i32 + 1,
                    duration_seconds: 600,
                })
                .await?;
        }

        if course.title == "Rust Fundamentals" {
            seed_rust_quiz(state, course.id).await?;
        }
        tracing::info!("Seeded course '{}'", course.title);
    }

    // 3. Badges
    let created = seed_badges(state.badges.as_ref()).await?;
    tracing::info!("Seeded {} badges", created);

    Ok(())
}

async fn seed_rust_quiz(state: &AppState, course_id: uuid::Uuid) -> Result<(), DomainError> {
    let quiz = state
        .quizzes
        .create(NewQuiz {
            course_id,
            lesson_id: None,
            title: "Rust Fundamentals Quiz".to_string(),
            passing_score: 70,
            max_attempts: 3,
            time_limit_minutes: Some(15),
            coins_reward: 50,
        })
        .await?;

    let choice = |text: &str, is_correct: bool| NewOption {
        text: text.to_string(),
        is_correct,
    };

    let questions = vec![
        (
            "Which keyword makes a binding mutable?",
            QuestionType::Mcq,
            vec![choice("mut", true), choice("var", false), choice("let", false)],
            vec![],
        ),
        (
            "A value can have several mutable references at once.",
            QuestionType::TrueFalse,
            vec![choice("True", false), choice("False", true)],
            vec![],
        ),
        (
            "What checks references at compile time?",
            QuestionType::ShortAnswer,
            vec![],
            vec![NewAcceptedAnswer {
                text: "borrow checker".to_string(),
                is_partial_ok: true,
            }],
        ),
    ];

    for (index, (text, question_type, options, accepted_answers)) in
        questions.into_iter().enumerate()
    {
        state
            .quizzes
            .add_question(NewQuestion {
                quiz_id: quiz.id,
                text: text.to_string(),
                question_type,
                order_number: index as i32 + 1,
                options,
                accepted_answers,
            })
            .await?;
    }

    Ok(())
}
