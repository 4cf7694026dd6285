use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            name TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('teacher', 'student')),
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('teacher', 'student')),
            avatar_url TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (id) REFERENCES accounts(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS password_resets (
            token TEXT PRIMARY KEY,
            account_id INTEGER NOT NULL,
            expires_at TEXT NOT NULL,
            consumed INTEGER NOT NULL DEFAULT 0 CHECK (consumed IN (0, 1)),
            FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY,
            teacher_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            code TEXT NOT NULL CHECK (length(code) = 6),
            due_date TEXT,
            time_limit_minutes INTEGER CHECK (time_limit_minutes BETWEEN 1 AND 1440),
            created_at TEXT NOT NULL,
            expires_at TEXT,
            assigned_students_count INTEGER NOT NULL DEFAULT 0 CHECK (assigned_students_count >= 0)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            session_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            text TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('text', 'rating', 'multiple-choice')),
            options TEXT,
            scale INTEGER CHECK (scale IN (5, 10)),
            is_default INTEGER NOT NULL DEFAULT 0 CHECK (is_default IN (0, 1)),
            FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS session_students (
            session_id INTEGER NOT NULL,
            student_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed')),
            PRIMARY KEY (session_id, student_id),
            FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS responses (
            id INTEGER PRIMARY KEY,
            session_id INTEGER NOT NULL,
            student_id INTEGER NOT NULL,
            question_id INTEGER NOT NULL,
            answer TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS student_teachers (
            id INTEGER PRIMARY KEY,
            student_id INTEGER NOT NULL,
            teacher_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (student_id, teacher_id)
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_sessions_code
            ON sessions(code, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_sessions_teacher_created
            ON sessions(teacher_id, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_questions_session_position
            ON questions(session_id, position);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_session_students_student
            ON session_students(student_id);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_responses_session_student
            ON responses(session_id, student_id);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_student_teachers_teacher
            ON student_teachers(teacher_id);
    ",
];

/// Applies versioned migrations recorded in `schema_migrations`.
///
/// Version 1 creates accounts, profiles, reset tokens, sessions, questions,
/// assignments, responses, enrollments and their indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
