use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    // SQLite allows a single writer; an in-memory database also lives and
    // dies with its one connection.
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn execute(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_owned()))
        .await?;
    Ok(())
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    for table in TABLES {
        execute(db, table).await?;
    }

    // Uniqueness carries the concurrency guarantees of the services
    for index in UNIQUE_INDEXES {
        execute(db, index).await?;
    }

    for index in INDEXES {
        execute(db, index).await?;
    }

    tracing::debug!("Database schema is up to date");
    Ok(())
}

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        department TEXT,
        role TEXT NOT NULL DEFAULT 'learner',
        coins INTEGER NOT NULL DEFAULT 0 CHECK (coins >= 0),
        current_badge_level TEXT NOT NULL DEFAULT 'bronze',
        current_streak INTEGER NOT NULL DEFAULT 0,
        last_activity_on TEXT,
        total_learning_seconds INTEGER NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        id BLOB PRIMARY KEY NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        category TEXT,
        instructor_id BLOB REFERENCES users(id),
        is_mandatory BOOLEAN NOT NULL DEFAULT 0,
        mandatory_due_date TEXT,
        passing_score INTEGER NOT NULL DEFAULT 70,
        coins_reward INTEGER NOT NULL DEFAULT 100,
        max_enrollments INTEGER NOT NULL DEFAULT 0,
        is_published BOOLEAN NOT NULL DEFAULT 0,
        enrollment_count INTEGER NOT NULL DEFAULT 0,
        completion_count INTEGER NOT NULL DEFAULT 0,
        average_rating REAL NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lessons (
        id BLOB PRIMARY KEY NOT NULL,
        course_id BLOB NOT NULL REFERENCES courses(id),
        title TEXT NOT NULL,
        order_number INTEGER NOT NULL DEFAULT 0,
        duration_seconds INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS enrollments (
        id BLOB PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id),
        course_id BLOB NOT NULL REFERENCES courses(id),
        completion_status TEXT NOT NULL DEFAULT 'not_started',
        overall_progress INTEGER NOT NULL DEFAULT 0,
        final_score INTEGER,
        is_passed BOOLEAN NOT NULL DEFAULT 0,
        enrolled_at TEXT NOT NULL,
        last_accessed_at TEXT,
        completed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lesson_progress (
        id BLOB PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id),
        course_id BLOB NOT NULL REFERENCES courses(id),
        lesson_id BLOB NOT NULL REFERENCES lessons(id),
        watched_seconds INTEGER NOT NULL DEFAULT 0,
        total_seconds INTEGER NOT NULL DEFAULT 0,
        progress_percentage INTEGER NOT NULL DEFAULT 0,
        is_completed BOOLEAN NOT NULL DEFAULT 0,
        completed_at TEXT,
        last_accessed_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quizzes (
        id BLOB PRIMARY KEY NOT NULL,
        course_id BLOB NOT NULL REFERENCES courses(id),
        lesson_id BLOB REFERENCES lessons(id),
        title TEXT NOT NULL,
        passing_score INTEGER NOT NULL DEFAULT 70,
        max_attempts INTEGER NOT NULL DEFAULT 3,
        time_limit_minutes INTEGER,
        coins_reward INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS questions (
        id BLOB PRIMARY KEY NOT NULL,
        quiz_id BLOB NOT NULL REFERENCES quizzes(id),
        question_text TEXT NOT NULL,
        question_type TEXT NOT NULL DEFAULT 'mcq',
        order_number INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS question_options (
        id BLOB PRIMARY KEY NOT NULL,
        question_id BLOB NOT NULL REFERENCES questions(id),
        option_text TEXT NOT NULL,
        is_correct BOOLEAN NOT NULL DEFAULT 0,
        order_number INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS question_answers (
        id BLOB PRIMARY KEY NOT NULL,
        question_id BLOB NOT NULL REFERENCES questions(id),
        correct_text TEXT NOT NULL,
        is_partial_ok BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quiz_attempts (
        id BLOB PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id),
        quiz_id BLOB NOT NULL REFERENCES quizzes(id),
        attempt_number INTEGER NOT NULL,
        score INTEGER NOT NULL DEFAULT 0,
        max_score INTEGER NOT NULL DEFAULT 0,
        percentage INTEGER NOT NULL DEFAULT 0,
        is_passed BOOLEAN NOT NULL DEFAULT 0,
        started_at TEXT NOT NULL,
        submitted_at TEXT,
        time_spent_seconds INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quiz_answers (
        id BLOB PRIMARY KEY NOT NULL,
        attempt_id BLOB NOT NULL REFERENCES quiz_attempts(id),
        question_id BLOB NOT NULL REFERENCES questions(id),
        user_answer TEXT NOT NULL,
        is_correct BOOLEAN NOT NULL DEFAULT 0,
        points_earned INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS coin_transactions (
        id BLOB PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id),
        amount INTEGER NOT NULL,
        transaction_type TEXT NOT NULL,
        reason TEXT NOT NULL,
        reference_type TEXT,
        reference_id BLOB,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS badges (
        id BLOB PRIMARY KEY NOT NULL,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL,
        level TEXT NOT NULL DEFAULT 'bronze',
        icon_url TEXT,
        criteria TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS badge_progress (
        id BLOB PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id),
        badge_id BLOB NOT NULL REFERENCES badges(id),
        progress INTEGER NOT NULL DEFAULT 0,
        is_earned BOOLEAN NOT NULL DEFAULT 0,
        earned_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS certificates (
        id BLOB PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id),
        course_id BLOB NOT NULL REFERENCES courses(id),
        certificate_number TEXT NOT NULL UNIQUE,
        score INTEGER NOT NULL,
        issued_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS course_reviews (
        id BLOB PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id),
        course_id BLOB NOT NULL REFERENCES courses(id),
        rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        review_text TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
];

// Partial on `deleted_at IS NULL` so a tombstoned row never blocks a new one
const UNIQUE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_enrollments_user_course ON enrollments(user_id, course_id) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_lesson_progress_user_lesson ON lesson_progress(user_id, course_id, lesson_id) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_quiz_attempts_number ON quiz_attempts(user_id, quiz_id, attempt_number)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_badge_progress_user_badge ON badge_progress(user_id, badge_id) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_certificates_user_course ON certificates(user_id, course_id) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_course_reviews_user_course ON course_reviews(user_id, course_id) WHERE deleted_at IS NULL",
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_lessons_course ON lessons(course_id)",
    "CREATE INDEX IF NOT EXISTS idx_enrollments_status ON enrollments(user_id, completion_status)",
    "CREATE INDEX IF NOT EXISTS idx_questions_quiz ON questions(quiz_id)",
    "CREATE INDEX IF NOT EXISTS idx_coin_transactions_user ON coin_transactions(user_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_users_learning ON users(total_learning_seconds)",
];
