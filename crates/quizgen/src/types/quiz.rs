//! Quiz domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Question difficulty
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(Error::bad_request(
                "Invalid or missing 'difficulty' field. Must be 'easy', 'medium', or 'hard'.",
            )),
        }
    }
}

/// Question format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Mcq,
    TrueFalse,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::TrueFalse => "true_false",
        }
    }

    /// Human label used in exported documents
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mcq => "Multiple Choice",
            Self::TrueFalse => "True/False",
        }
    }

    /// Number of options each question must carry
    pub fn option_count(&self) -> usize {
        match self {
            Self::Mcq => 4,
            Self::TrueFalse => 2,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" => Ok(Self::Mcq),
            "true_false" => Ok(Self::TrueFalse),
            _ => Err(Error::bad_request(
                "Invalid or missing 'questionType' field. Must be 'mcq' or 'true_false'.",
            )),
        }
    }
}

/// A single quiz question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// The text of the correct option, if the index is in range
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }
}

/// A persisted quiz
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// Create a new quiz with a fresh id
    pub fn new(
        title: impl Into<String>,
        difficulty: Difficulty,
        question_type: QuestionType,
        questions: Vec<QuizQuestion>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            difficulty,
            question_type,
            created_at: Utc::now(),
            questions,
        }
    }

    /// Score a set of answers; missing or `None` answers count as wrong
    pub fn score(&self, answers: &[Option<usize>]) -> ScoreSummary {
        let correct = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| answers.get(*i).copied().flatten() == Some(q.correct_answer))
            .count();
        ScoreSummary::new(correct, self.questions.len())
    }
}

/// Quiz listing entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
    pub created_at: DateTime<Utc>,
    pub question_count: usize,
}

/// A quiz with its attempt statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    /// Best attempt as a rounded percentage
    pub highest_score: Option<u32>,
    pub attempt_count: usize,
}

/// A completed attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: String,
    pub score: usize,
    pub total_score: usize,
    pub answers: Vec<Option<usize>>,
    pub completed_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total_score)
    }
}

/// Result of scoring one attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
}

impl ScoreSummary {
    pub fn new(correct: usize, total: usize) -> Self {
        Self {
            correct,
            total,
            percentage: percentage(correct, total),
        }
    }
}

/// Rounded percentage, 0 when `total` is 0
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        (correct as f64 / total as f64 * 100.0).round() as u32
    }
}
