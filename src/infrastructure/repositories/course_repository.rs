//! SeaORM implementations of CourseRepository and LessonRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::{
    CourseFilter, CoursePage, CourseRepository, DomainError, LessonRepository, NewCourse, NewLesson,
};
use crate::models::course::{self, Entity as CourseEntity};
use crate::models::lesson::{self, Entity as LessonEntity};

/// SeaORM-based implementation of CourseRepository
pub struct SeaOrmCourseRepository {
    db: DatabaseConnection,
}

impl SeaOrmCourseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CourseRepository for SeaOrmCourseRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<course::Model>, DomainError> {
        let course = CourseEntity::find_by_id(id)
            .filter(course::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(course)
    }

    async fn list_published(
        &self,
        filter: CourseFilter,
        page: u64,
        per_page: u64,
    ) -> Result<CoursePage, DomainError> {
        let mut query = CourseEntity::find()
            .filter(course::Column::IsPublished.eq(true))
            .filter(course::Column::DeletedAt.is_null());

        if let Some(q) = filter.search.as_deref().map(str::trim)
            && !q.is_empty()
        {
            let cond = Condition::any()
                .add(course::Column::Title.contains(q))
                .add(course::Column::Description.contains(q));
            query = query.filter(cond);
        }

        if let Some(category) = filter.category.as_deref().map(str::trim)
            && !category.is_empty()
        {
            query = query.filter(course::Column::Category.eq(category));
        }

        if filter.mandatory_only {
            query = query.filter(course::Column::IsMandatory.eq(true));
        }

        let per_page = per_page.max(1);
        let paginator = query
            .order_by_desc(course::Column::CreatedAt)
            .order_by_asc(course::Column::Title)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page).await?;

        Ok(CoursePage {
            items,
            total,
            page,
            per_page,
        })
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<course::Model>, DomainError> {
        let course = CourseEntity::find()
            .filter(course::Column::Title.eq(title))
            .filter(course::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(course)
    }

    async fn create(&self, input: NewCourse) -> Result<course::Model, DomainError> {
        if !(0..=100).contains(&input.passing_score) {
            return Err(DomainError::InvalidRange(
                "passing score must be between 0 and 100".to_string(),
            ));
        }
        let now = Utc::now();

        let course = course::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            instructor_id: Set(input.instructor_id),
            is_mandatory: Set(input.is_mandatory),
            mandatory_due_date: Set(input.mandatory_due_date),
            passing_score: Set(input.passing_score),
            coins_reward: Set(input.coins_reward.max(0)),
            max_enrollments: Set(input.max_enrollments.max(0)),
            is_published: Set(input.is_published),
            enrollment_count: Set(0),
            completion_count: Set(0),
            average_rating: Set(0.0),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        Ok(course.insert(&self.db).await?)
    }
}

/// SeaORM-based implementation of LessonRepository
pub struct SeaOrmLessonRepository {
    db: DatabaseConnection,
}

impl SeaOrmLessonRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LessonRepository for SeaOrmLessonRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<lesson::Model>, DomainError> {
        let lesson = LessonEntity::find_by_id(id)
            .filter(lesson::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(lesson)
    }

    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<lesson::Model>, DomainError> {
        let lessons = LessonEntity::find()
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(lesson::Column::DeletedAt.is_null())
            .order_by_asc(lesson::Column::OrderNumber)
            .all(&self.db)
            .await?;
        Ok(lessons)
    }

    async fn create(&self, input: NewLesson) -> Result<lesson::Model, DomainError> {
        let now = Utc::now();

        let lesson = lesson::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(input.course_id),
            title: Set(input.title),
            order_number: Set(input.order_number),
            duration_seconds: Set(input.duration_seconds.max(0)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        Ok(lesson.insert(&self.db).await?)
    }
}
