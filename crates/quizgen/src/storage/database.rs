//! SQLite database for quizzes, their questions and attempts

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{
    Difficulty, QuestionType, Quiz, QuizAttempt, QuizDetail, QuizQuestion, QuizSummary,
};

/// SQLite-backed quiz repository
#[derive(Clone)]
pub struct QuizDb {
    conn: Arc<Mutex<Connection>>,
}

impl QuizDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys=ON;
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        "#,
        )
        .map_err(|e| Error::storage(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS quizzes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                question_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_quizzes_created_at ON quizzes(created_at);

            CREATE TABLE IF NOT EXISTS questions (
                quiz_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                question_id TEXT NOT NULL,
                question TEXT NOT NULL,
                options_json TEXT NOT NULL,
                correct_answer INTEGER NOT NULL,
                explanation TEXT,
                PRIMARY KEY (quiz_id, position),
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS attempts (
                id TEXT PRIMARY KEY,
                quiz_id TEXT NOT NULL,
                score INTEGER NOT NULL,
                total_score INTEGER NOT NULL,
                answers_json TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_attempts_quiz_id ON attempts(quiz_id);
        "#,
        )
        .map_err(|e| Error::storage(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    /// Insert a quiz and its questions in one transaction
    pub fn create_quiz(&self, quiz: &Quiz) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::storage(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO quizzes (id, title, difficulty, question_type, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                quiz.id,
                quiz.title,
                quiz.difficulty.as_str(),
                quiz.question_type.as_str(),
                timestamp(&quiz.created_at),
            ],
        )
        .map_err(|e| Error::storage(format!("Failed to insert quiz: {}", e)))?;

        for (position, question) in quiz.questions.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO questions (
                    quiz_id, position, question_id, question, options_json, correct_answer, explanation
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    quiz.id,
                    position as i64,
                    question.id,
                    question.question,
                    to_json_column(&question.options, "question options")?,
                    question.correct_answer as i64,
                    question.explanation,
                ],
            )
            .map_err(|e| Error::storage(format!("Failed to insert question: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| Error::storage(format!("Failed to commit quiz: {}", e)))?;

        tracing::debug!("Stored quiz {} with {} questions", quiz.id, quiz.questions.len());
        Ok(())
    }

    /// Get a quiz with its questions in order
    pub fn get_quiz(&self, id: &str) -> Result<Option<Quiz>> {
        let conn = self.conn.lock();

        let header = conn
            .query_row(
                "SELECT id, title, difficulty, question_type, created_at FROM quizzes WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| Error::storage(format!("Failed to get quiz: {}", e)))?;

        let Some((id, title, difficulty, question_type, created_at)) = header else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare(
                r#"
                SELECT question_id, question, options_json, correct_answer, explanation
                FROM questions WHERE quiz_id = ?1 ORDER BY position ASC
                "#,
            )
            .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

        let questions = stmt
            .query_map(params![id], row_to_question)
            .map_err(|e| Error::storage(format!("Failed to load questions: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::storage(format!("Failed to read question: {}", e)))?;

        Ok(Some(Quiz {
            id,
            title,
            difficulty: parse_difficulty(&difficulty),
            question_type: parse_question_type(&question_type),
            created_at: parse_timestamp(&created_at),
            questions,
        }))
    }

    /// Get a quiz with its best score and attempt count
    pub fn get_quiz_detail(&self, id: &str) -> Result<Option<QuizDetail>> {
        let Some(quiz) = self.get_quiz(id)? else {
            return Ok(None);
        };

        let attempts = self.list_attempts(id)?;

        Ok(Some(QuizDetail {
            quiz,
            highest_score: highest_percentage(&attempts),
            attempt_count: attempts.len(),
        }))
    }

    /// List quizzes, newest first, with question counts
    pub fn list_quizzes(&self) -> Result<Vec<QuizSummary>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT q.id, q.title, q.difficulty, q.question_type, q.created_at,
                       (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id)
                FROM quizzes q
                ORDER BY q.created_at DESC, q.rowid DESC
                "#,
            )
            .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

        let quizzes = stmt
            .query_map([], |row| {
                Ok(QuizSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    difficulty: parse_difficulty(&row.get::<_, String>(2)?),
                    question_type: parse_question_type(&row.get::<_, String>(3)?),
                    created_at: parse_timestamp(&row.get::<_, String>(4)?),
                    question_count: row.get::<_, i64>(5)? as usize,
                })
            })
            .map_err(|e| Error::storage(format!("Failed to list quizzes: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::storage(format!("Failed to read quiz: {}", e)))?;

        Ok(quizzes)
    }

    /// Delete a quiz with its questions and attempts
    pub fn delete_quiz(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn
            .execute("DELETE FROM quizzes WHERE id = ?1", params![id])
            .map_err(|e| Error::storage(format!("Failed to delete quiz: {}", e)))?;

        Ok(count > 0)
    }

    /// Store a completed attempt
    pub fn record_attempt(&self, attempt: &QuizAttempt) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO attempts (id, quiz_id, score, total_score, answers_json, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                attempt.id,
                attempt.quiz_id,
                attempt.score as i64,
                attempt.total_score as i64,
                to_json_column(&attempt.answers, "attempt answers")?,
                timestamp(&attempt.completed_at),
            ],
        )
        .map_err(|e| Error::storage(format!("Failed to record attempt: {}", e)))?;

        Ok(())
    }

    /// Attempts for a quiz, newest first
    pub fn list_attempts(&self, quiz_id: &str) -> Result<Vec<QuizAttempt>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, quiz_id, score, total_score, answers_json, completed_at
                FROM attempts WHERE quiz_id = ?1
                ORDER BY completed_at DESC, rowid DESC
                "#,
            )
            .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

        let attempts = stmt
            .query_map(params![quiz_id], row_to_attempt)
            .map_err(|e| Error::storage(format!("Failed to list attempts: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::storage(format!("Failed to read attempt: {}", e)))?;

        Ok(attempts)
    }
}

/// Serialize a value for a TEXT column. Failures are server-side, never the caller's input.
fn to_json_column<T: Serialize>(value: &T, column: &str) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::storage(format!("Failed to encode {}: {}", column, e)))
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_difficulty(s: &str) -> Difficulty {
    s.parse().unwrap_or_default()
}

fn parse_question_type(s: &str) -> QuestionType {
    s.parse().unwrap_or_default()
}

fn row_to_question(row: &rusqlite::Row) -> rusqlite::Result<QuizQuestion> {
    let options_json: String = row.get(2)?;
    let correct_answer: i64 = row.get(3)?;

    Ok(QuizQuestion {
        id: row.get(0)?,
        question: row.get(1)?,
        options: serde_json::from_str(&options_json).unwrap_or_default(),
        correct_answer: correct_answer as usize,
        explanation: row.get(4)?,
    })
}

fn row_to_attempt(row: &rusqlite::Row) -> rusqlite::Result<QuizAttempt> {
    let score: i64 = row.get(2)?;
    let total_score: i64 = row.get(3)?;
    let answers_json: String = row.get(4)?;
    let completed_at: String = row.get(5)?;

    Ok(QuizAttempt {
        id: row.get(0)?,
        quiz_id: row.get(1)?,
        score: score as usize,
        total_score: total_score as usize,
        answers: serde_json::from_str(&answers_json).unwrap_or_default(),
        completed_at: parse_timestamp(&completed_at),
    })
}

/// Best rounded percentage across attempts
pub fn highest_percentage(attempts: &[QuizAttempt]) -> Option<u32> {
    attempts.iter().map(QuizAttempt::percentage).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Duration;
    use std::collections::HashMap;

    fn sample_quiz(title: &str, questions: usize) -> Quiz {
        let questions = (0..questions)
            .map(|i| QuizQuestion {
                id: format!("q-1-{}", i),
                question: format!("Question {}?", i),
                options: vec!["True".to_string(), "False".to_string()],
                correct_answer: i % 2,
                explanation: (i == 0).then(|| "Because.".to_string()),
            })
            .collect();
        Quiz::new(title, Difficulty::Easy, QuestionType::TrueFalse, questions)
    }

    fn attempt(quiz: &Quiz, score: usize, minutes_ago: i64) -> QuizAttempt {
        QuizAttempt {
            id: uuid::Uuid::new_v4().to_string(),
            quiz_id: quiz.id.clone(),
            score,
            total_score: quiz.questions.len(),
            answers: vec![Some(0), None, Some(0)],
            completed_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_create_and_get_roundtrip() {
        let db = QuizDb::in_memory().unwrap();
        let quiz = sample_quiz("Photosynthesis", 3);
        db.create_quiz(&quiz).unwrap();

        let loaded = db.get_quiz(&quiz.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Photosynthesis");
        assert_eq!(loaded.question_type, QuestionType::TrueFalse);
        assert_eq!(loaded.questions, quiz.questions);
        assert!(db.get_quiz("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first_with_counts() {
        let db = QuizDb::in_memory().unwrap();
        let mut older = sample_quiz("Older", 2);
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = sample_quiz("Newer", 5);
        db.create_quiz(&older).unwrap();
        db.create_quiz(&newer).unwrap();

        let list = db.list_quizzes().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title, "Newer");
        assert_eq!(list[0].question_count, 5);
        assert_eq!(list[1].question_count, 2);
    }

    #[test]
    fn test_detail_reports_best_score() {
        let db = QuizDb::in_memory().unwrap();
        let quiz = sample_quiz("Cells", 3);
        db.create_quiz(&quiz).unwrap();

        let detail = db.get_quiz_detail(&quiz.id).unwrap().unwrap();
        assert_eq!(detail.highest_score, None);
        assert_eq!(detail.attempt_count, 0);

        db.record_attempt(&attempt(&quiz, 1, 10)).unwrap();
        db.record_attempt(&attempt(&quiz, 2, 5)).unwrap();

        let detail = db.get_quiz_detail(&quiz.id).unwrap().unwrap();
        assert_eq!(detail.highest_score, Some(67));
        assert_eq!(detail.attempt_count, 2);

        let attempts = db.list_attempts(&quiz.id).unwrap();
        assert_eq!(attempts[0].score, 2);
        assert_eq!(attempts[0].answers, vec![Some(0), None, Some(0)]);
        assert_eq!(highest_percentage(&attempts), Some(67));
    }

    #[test]
    fn test_delete_cascades() {
        let db = QuizDb::in_memory().unwrap();
        let quiz = sample_quiz("Gone", 2);
        db.create_quiz(&quiz).unwrap();
        db.record_attempt(&attempt(&quiz, 1, 1)).unwrap();

        assert!(db.delete_quiz(&quiz.id).unwrap());
        assert!(!db.delete_quiz(&quiz.id).unwrap());
        assert!(db.get_quiz(&quiz.id).unwrap().is_none());
        assert!(db.list_attempts(&quiz.id).unwrap().is_empty());

        let conn = db.conn.lock();
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_attempt_for_unknown_quiz_is_rejected() {
        let db = QuizDb::in_memory().unwrap();
        let quiz = sample_quiz("Unsaved", 1);
        assert!(db.record_attempt(&attempt(&quiz, 1, 0)).is_err());
    }

    #[test]
    fn test_column_encoding_failure_is_storage_error() {
        // tuple keys cannot become JSON object keys
        let unencodable = HashMap::from([((1u8, 2u8), 3u8)]);

        let err = to_json_column(&unencodable, "question options").unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("Failed to encode question options"));
        assert_eq!(
            err.status_and_type(),
            (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
        );
    }
}
