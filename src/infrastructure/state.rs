//! Application state containing repositories and services

use sea_orm::DatabaseConnection;
use secrecy::SecretString;
use std::sync::Arc;

use crate::domain::{
    BadgeRepository, CertificateRepository, CoinLedgerRepository, CourseRepository,
    EnrollmentRepository, LessonRepository, ProgressRepository, QuizAttemptRepository,
    QuizRepository, ReviewRepository, UserRepository,
};
use crate::infrastructure::config::Config;
use crate::infrastructure::{
    SeaOrmBadgeRepository, SeaOrmCertificateRepository, SeaOrmCoinLedgerRepository,
    SeaOrmCourseRepository, SeaOrmEnrollmentRepository, SeaOrmLessonRepository,
    SeaOrmProgressRepository, SeaOrmQuizAttemptRepository, SeaOrmQuizRepository,
    SeaOrmReviewRepository, SeaOrmUserRepository,
};
use crate::services::{
    AnswerGrader, CatalogService, DashboardService, EnrollmentService, GamificationService, OptionGrader,
    ProgressService, QuizService, ReviewService, TextAnswerGrader,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    jwt_secret: Arc<SecretString>,
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub badges: Arc<dyn BadgeRepository>,
    pub catalog: Arc<CatalogService>,
    pub progress: Arc<ProgressService>,
    pub enrollments: Arc<EnrollmentService>,
    pub quiz: Arc<QuizService>,
    pub gamification: Arc<GamificationService>,
    pub dashboard: Arc<DashboardService>,
    pub reviews: Arc<ReviewService>,
}

impl AppState {
    /// Wire every repository and service over one connection pool
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        let grader: Arc<dyn AnswerGrader> = if config.grade_text_answers {
            Arc::new(TextAnswerGrader)
        } else {
            Arc::new(OptionGrader)
        };
        Self::with_grader(db, config, grader)
    }

    pub fn with_grader(
        db: DatabaseConnection,
        config: &Config,
        grader: Arc<dyn AnswerGrader>,
    ) -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(SeaOrmUserRepository::new(db.clone()));
        let courses: Arc<dyn CourseRepository> = Arc::new(SeaOrmCourseRepository::new(db.clone()));
        let lessons: Arc<dyn LessonRepository> = Arc::new(SeaOrmLessonRepository::new(db.clone()));
        let enrollment_repo: Arc<dyn EnrollmentRepository> =
            Arc::new(SeaOrmEnrollmentRepository::new(db.clone()));
        let progress_repo: Arc<dyn ProgressRepository> =
            Arc::new(SeaOrmProgressRepository::new(db.clone()));
        let quizzes: Arc<dyn QuizRepository> = Arc::new(SeaOrmQuizRepository::new(db.clone()));
        let attempts: Arc<dyn QuizAttemptRepository> =
            Arc::new(SeaOrmQuizAttemptRepository::new(db.clone()));
        let ledger: Arc<dyn CoinLedgerRepository> =
            Arc::new(SeaOrmCoinLedgerRepository::new(db.clone()));
        let badges: Arc<dyn BadgeRepository> = Arc::new(SeaOrmBadgeRepository::new(db.clone()));
        let certificates: Arc<dyn CertificateRepository> =
            Arc::new(SeaOrmCertificateRepository::new(db.clone()));
        let review_repo: Arc<dyn ReviewRepository> =
            Arc::new(SeaOrmReviewRepository::new(db.clone()));

        let catalog = Arc::new(CatalogService::new(
            courses.clone(),
            lessons.clone(),
            quizzes.clone(),
        ));
        let gamification = Arc::new(GamificationService::new(
            users.clone(),
            ledger.clone(),
            badges.clone(),
            enrollment_repo.clone(),
            attempts.clone(),
        ));
        let progress = Arc::new(ProgressService::new(
            lessons.clone(),
            progress_repo,
            users.clone(),
            gamification.clone(),
            config.lesson_completion_threshold,
        ));
        let enrollments = Arc::new(EnrollmentService::new(
            enrollment_repo.clone(),
            courses.clone(),
            certificates.clone(),
            progress.clone(),
            gamification.clone(),
        ));
        let quiz = Arc::new(QuizService::new(
            quizzes.clone(),
            attempts,
            grader,
            gamification.clone(),
        ));
        let dashboard = Arc::new(DashboardService::new(
            users.clone(),
            enrollment_repo,
            certificates,
            ledger,
            badges.clone(),
            config.dashboard_recent_transactions,
        ));
        let reviews = Arc::new(ReviewService::new(review_repo, courses.clone()));

        Self {
            db,
            jwt_secret: Arc::new(config.jwt_secret.clone()),
            users,
            courses,
            lessons,
            quizzes,
            badges,
            catalog,
            progress,
            enrollments,
            quiz,
            gamification,
            dashboard,
            reviews,
        }
    }

    /// Get the database connection
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }
}
