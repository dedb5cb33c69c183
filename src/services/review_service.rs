//! Review Service - course ratings

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{CourseRepository, DomainError, NewReview, ReviewRepository};
use crate::models::course_review;

pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, courses: Arc<dyn CourseRepository>) -> Self {
        Self { reviews, courses }
    }

    /// One review per user and course; keeps the course's average rating current
    pub async fn add_review(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        rating: i32,
        review_text: Option<String>,
    ) -> Result<course_review::Model, DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::InvalidRange(
                "rating must be between 1 and 5".to_string(),
            ));
        }
        if self.courses.find_by_id(course_id).await?.is_none() {
            return Err(DomainError::NotFound("course"));
        }
        if self.reviews.find_for(user_id, course_id).await?.is_some() {
            return Err(DomainError::DuplicateReview);
        }

        let review = self
            .reviews
            .add(NewReview {
                user_id,
                course_id,
                rating,
                review_text: review_text.filter(|t| !t.trim().is_empty()),
            })
            .await?;
        tracing::info!("User {} rated course {} with {}", user_id, course_id, rating);
        Ok(review)
    }

    pub async fn list_reviews(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<course_review::Model>, DomainError> {
        if self.courses.find_by_id(course_id).await?.is_none() {
            return Err(DomainError::NotFound("course"));
        }
        self.reviews.list_for_course(course_id).await
    }
}
