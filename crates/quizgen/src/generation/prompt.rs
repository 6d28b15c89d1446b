//! Prompt templates for quiz generation

use crate::types::{Difficulty, QuestionType};

/// Prompt builder for quiz requests
pub struct QuizPromptBuilder;

impl QuizPromptBuilder {
    fn difficulty_description(difficulty: Difficulty) -> &'static str {
        match difficulty {
            Difficulty::Easy => "simple and straightforward, suitable for introductory learners",
            Difficulty::Medium => "moderately challenging, requiring understanding of key concepts",
            Difficulty::Hard => "advanced and complex, testing deep comprehension and analysis",
        }
    }

    fn type_description(question_type: QuestionType) -> &'static str {
        match question_type {
            QuestionType::Mcq => "multiple-choice questions with 4 options each",
            QuestionType::TrueFalse => "true/false questions with 2 options (True and False)",
        }
    }

    /// System prompt fixing tone, format and the JSON contract
    pub fn build_system_prompt(difficulty: Difficulty, question_type: QuestionType) -> String {
        format!(
            r#"You are an expert quiz generator. Create {difficulty} {kind} based on the provided study material.

CRITICAL INSTRUCTIONS:
1. Generate questions that are directly grounded in the provided text
2. Each question must be clear, unambiguous, and test understanding
3. For multiple-choice: provide exactly 4 options (A, B, C, D)
4. For true/false: provide exactly 2 options (True, False)
5. Indicate the correct answer by its index (0-based)
6. Optionally provide a brief explanation for the correct answer
7. Return ONLY valid JSON with no additional text

JSON FORMAT:
{{
  "questions": [
    {{
      "question": "Question text here?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": 0,
      "explanation": "Brief explanation of why this is correct"
    }}
  ]
}}"#,
            difficulty = Self::difficulty_description(difficulty),
            kind = Self::type_description(question_type),
        )
    }

    /// User prompt carrying the study material
    pub fn build_user_prompt(text: &str, num_questions: usize) -> String {
        format!(
            "Generate exactly {} quiz question(s) based on the following study material:\n\n{}\n\nRemember to return ONLY valid JSON matching the specified format.",
            num_questions, text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_varies_by_parameters() {
        let easy_mcq = QuizPromptBuilder::build_system_prompt(Difficulty::Easy, QuestionType::Mcq);
        assert!(easy_mcq.contains("introductory learners"));
        assert!(easy_mcq.contains("multiple-choice questions with 4 options each"));
        assert!(easy_mcq.contains("\"correctAnswer\": 0"));

        let hard_tf =
            QuizPromptBuilder::build_system_prompt(Difficulty::Hard, QuestionType::TrueFalse);
        assert!(hard_tf.contains("deep comprehension"));
        assert!(hard_tf.contains("true/false questions"));
    }

    #[test]
    fn test_user_prompt_embeds_text_and_count() {
        let prompt = QuizPromptBuilder::build_user_prompt("Cells divide.", 5);
        assert!(prompt.starts_with("Generate exactly 5 quiz question(s)"));
        assert!(prompt.contains("\n\nCells divide.\n\n"));
    }
}
