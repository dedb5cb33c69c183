mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use common::*;
use lms_backend::config::Config;
use lms_backend::domain::{NewCourse, NewQuiz, Principal};
use lms_backend::infrastructure::AppState;
use lms_backend::models::{EnrollmentStatus, Role, user};
use lms_backend::{auth, server};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(state: &AppState) -> Router {
    server::build_router(state.clone(), &Config::for_database(TEST_DB))
}

fn token_for(state: &AppState, user: &user::Model) -> String {
    auth::create_jwt(
        state.jwt_secret(),
        &Principal::new(user.id, user.role),
        Duration::hours(1),
    )
    .expect("Failed to sign token")
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn test_health_is_public() {
    let state = setup_state().await;
    let (status, body) = send(&app(&state), request("GET", "/api/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let state = setup_state().await;
    let app = app(&state);

    let (status, body) = send(&app, request("GET", "/api/dashboard", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        request("GET", "/api/dashboard", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_enroll_and_complete_over_http() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let token = token_for(&state, &learner);
    let course = create_course(
        &state,
        NewCourse {
            coins_reward: 150,
            ..NewCourse::titled("HTTP Basics")
        },
    )
    .await;
    let app = app(&state);
    let enroll_uri = format!("/api/courses/{}/enroll", course.id);

    let (status, body) = send(&app, request("POST", &enroll_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["completion_status"], "not_started");
    assert_eq!(body["overall_progress"], 0);

    let (status, body) = send(&app, request("POST", &enroll_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_ENROLLED");

    // Learners cannot sign off their own course
    let complete_uri = format!("/api/users/{}/courses/{}/complete", learner.id, course.id);
    let (status, body) = send(
        &app,
        request(
            "POST",
            &complete_uri,
            Some(&token),
            Some(json!({ "final_score": 100 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    let enrollment = state
        .enrollments
        .get_enrollment(learner.id, course.id)
        .await
        .unwrap();
    assert_eq!(enrollment.completion_status, EnrollmentStatus::NotStarted);
    assert_eq!(state.gamification.balance(learner.id).await.unwrap(), 0);

    let instructor = create_user(&state, "instructor@lms.test", Role::Instructor).await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            &complete_uri,
            Some(&token_for(&state, &instructor)),
            Some(json!({ "final_score": 85 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollment"]["completion_status"], "completed");
    assert_eq!(body["enrollment"]["final_score"], 85);
    assert_eq!(body["enrollment"]["is_passed"], true);
    assert_eq!(body["newly_completed"], true);
    assert_eq!(body["transaction"]["amount"], 150);
    assert_eq!(body["transaction"]["transaction_type"], "earned");

    let (status, body) = send(
        &app,
        request("GET", "/api/coins/balance", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 150);
    assert_eq!(body["consistent"], true);

    let (status, body) = send(&app, request("GET", "/api/dashboard", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed_courses"], 1);
    assert_eq!(body["certificates"], 1);
}

#[tokio::test]
async fn test_error_kinds_map_to_status_codes() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let token = token_for(&state, &learner);
    let app = app(&state);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/coins/spend",
            Some(&token),
            Some(json!({ "amount": 100, "reason": "Headphones" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_BALANCE");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/coins/spend",
            Some(&token),
            Some(json!({ "amount": 0, "reason": "Nothing" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_AMOUNT");

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/quizzes/{}", uuid::Uuid::new_v4()),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = send(
        &app,
        request("GET", "/api/enrollments/overdue", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_adjusts_learner_coins() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let admin = create_user(&state, "admin@lms.test", Role::Admin).await;
    let app = app(&state);
    let uri = format!("/api/users/{}/coins/adjust", learner.id);
    let payload = json!({ "amount": 25, "reason": "Event prize" });

    let (status, _) = send(
        &app,
        request(
            "POST",
            &uri,
            Some(&token_for(&state, &learner)),
            Some(payload.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request("POST", &uri, Some(&token_for(&state, &admin)), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction_type"], "admin_adjustment");
    assert_eq!(state.gamification.balance(learner.id).await.unwrap(), 25);
}

#[tokio::test]
async fn test_reviews_are_unique_per_learner() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let token = token_for(&state, &learner);
    let course = create_course(&state, NewCourse::titled("Reviewed")).await;
    let app = app(&state);
    let uri = format!("/api/courses/{}/reviews", course.id);

    let (status, _) = send(
        &app,
        request("POST", &uri, Some(&token), Some(json!({ "rating": 6 }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        request(
            "POST",
            &uri,
            Some(&token),
            Some(json!({ "rating": 4, "review_text": "Clear and short" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rating"], 4);

    let (status, body) = send(
        &app,
        request("POST", &uri, Some(&token), Some(json!({ "rating": 5 }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_REVIEW");

    let (status, body) = send(&app, request("GET", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let course = state.courses.find_by_id(course.id).await.unwrap().unwrap();
    assert!((course.average_rating - 4.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_catalogue_exposes_course_ids() {
    let state = setup_state().await;
    let learner = create_learner(&state, "a@lms.test").await;
    let course = create_course(&state, NewCourse::titled("Discoverable")).await;
    let lesson = create_lesson(&state, course.id, 1, 300).await;
    let quiz = state
        .quizzes
        .create(NewQuiz {
            course_id: course.id,
            lesson_id: Some(lesson.id),
            title: "Lesson check".to_string(),
            passing_score: 70,
            max_attempts: 0,
            time_limit_minutes: None,
            coins_reward: 0,
        })
        .await
        .unwrap();
    let app = app(&state);

    let (status, body) = send(&app, request("GET", "/api/courses?q=discover", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], course.id.to_string());

    let (status, body) = send(
        &app,
        request("GET", &format!("/api/courses/{}", course.id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lessons"][0]["id"], lesson.id.to_string());
    assert_eq!(body["quizzes"][0]["id"], quiz.id.to_string());

    let quiz_uri = format!("/api/lessons/{}/quiz", lesson.id);
    let (status, _) = send(&app, request("GET", &quiz_uri, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send(
        &app,
        request("GET", &quiz_uri, Some(&token_for(&state, &learner)), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], quiz.id.to_string());

    let (status, body) = send(
        &app,
        request("GET", "/api/courses?page=18446744073709551615", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_RANGE");
}
