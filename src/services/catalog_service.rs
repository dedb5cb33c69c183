//! Catalog Service - read-only view of published courses

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    CourseFilter, CoursePage, CourseRepository, DomainError, LessonRepository, QuizRepository,
};
use crate::models::{course, lesson, quiz};

/// A course with its lessons in order and the quizzes attached to it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseDetail {
    #[schema(value_type = Object)]
    pub course: course::Model,
    #[schema(value_type = Vec<Object>)]
    pub lessons: Vec<lesson::Model>,
    #[schema(value_type = Vec<Object>)]
    pub quizzes: Vec<quiz::Model>,
}

pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl CatalogService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        quizzes: Arc<dyn QuizRepository>,
    ) -> Self {
        Self {
            courses,
            lessons,
            quizzes,
        }
    }

    pub async fn list_courses(
        &self,
        filter: CourseFilter,
        page: u64,
        per_page: u64,
    ) -> Result<CoursePage, DomainError> {
        let per_page = super::checked_page(page, per_page)?;
        self.courses.list_published(filter, page, per_page).await
    }

    /// Unpublished courses are reported as missing
    pub async fn get_course(&self, course_id: Uuid) -> Result<CourseDetail, DomainError> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .filter(|c| c.is_published)
            .ok_or(DomainError::NotFound("course"))?;

        let lessons = self.lessons.list_by_course(course.id).await?;
        let quizzes = self.quizzes.list_by_course(course.id).await?;
        Ok(CourseDetail {
            course,
            lessons,
            quizzes,
        })
    }

    pub async fn get_lesson_quiz(&self, lesson_id: Uuid) -> Result<quiz::Model, DomainError> {
        if self.lessons.find_by_id(lesson_id).await?.is_none() {
            return Err(DomainError::NotFound("lesson"));
        }
        self.quizzes
            .find_by_lesson(lesson_id)
            .await?
            .ok_or(DomainError::NotFound("quiz"))
    }
}
