//! Answer grading for quiz submissions

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{GradedAnswer, QuestionWithOptions};

/// Decides whether a submitted answer is correct.
pub trait AnswerGrader: Send + Sync {
    fn is_correct(&self, question: &QuestionWithOptions, answer: &str) -> bool;
}

/// Grades choice questions by option id.
///
/// MCQ and true/false answers are correct when they carry the id of an
/// option marked correct. Short-answer and fill-in-the-blank questions are
/// not graded and always count as incorrect.
#[derive(Debug, Default, Clone, Copy)]
pub struct OptionGrader;

impl AnswerGrader for OptionGrader {
    fn is_correct(&self, question: &QuestionWithOptions, answer: &str) -> bool {
        if !question.question.question_type.is_choice() {
            return false;
        }
        let Ok(option_id) = Uuid::parse_str(answer.trim()) else {
            return false;
        };
        question
            .options
            .iter()
            .any(|o| o.id == option_id && o.is_correct)
    }
}

/// [`OptionGrader`] plus text questions matched against their accepted answers,
/// ignoring case and extra whitespace. A partial accepted answer only needs
/// to appear somewhere in the response.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextAnswerGrader;

impl AnswerGrader for TextAnswerGrader {
    fn is_correct(&self, question: &QuestionWithOptions, answer: &str) -> bool {
        if question.question.question_type.is_choice() {
            return OptionGrader.is_correct(question, answer);
        }

        let given = normalize(answer);
        if given.is_empty() {
            return false;
        }
        question.accepted_answers.iter().any(|accepted| {
            let expected = normalize(&accepted.correct_text);
            if accepted.is_partial_ok {
                !expected.is_empty() && given.contains(&expected)
            } else {
                given == expected
            }
        })
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `floor(score * 100 / max_score)`, 0 when there is nothing to score
pub fn percentage(score: i32, max_score: i32) -> i32 {
    if max_score <= 0 {
        return 0;
    }
    (i64::from(score.clamp(0, max_score)) * 100 / i64::from(max_score)) as i32
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub answers: Vec<GradedAnswer>,
}

/// Grade every question of a quiz; unanswered questions count as incorrect
pub fn grade(
    questions: &[QuestionWithOptions],
    answers: &HashMap<Uuid, String>,
    grader: &dyn AnswerGrader,
) -> Grade {
    let graded: Vec<GradedAnswer> = questions
        .iter()
        .map(|q| {
            let user_answer = answers.get(&q.question.id).cloned().unwrap_or_default();
            GradedAnswer {
                question_id: q.question.id,
                is_correct: grader.is_correct(q, &user_answer),
                user_answer,
            }
        })
        .collect();

    let score = graded.iter().filter(|a| a.is_correct).count() as i32;
    let max_score = questions.len() as i32;

    Grade {
        score,
        max_score,
        percentage: percentage(score, max_score),
        answers: graded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionType, question, question_answer, question_option};
    use chrono::Utc;

    fn question(kind: QuestionType) -> QuestionWithOptions {
        let now = Utc::now();
        let id = Uuid::new_v4();
        QuestionWithOptions {
            question: question::Model {
                id,
                quiz_id: Uuid::new_v4(),
                question_text: "?".to_string(),
                question_type: kind,
                order_number: 1,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
            options: Vec::new(),
            accepted_answers: Vec::new(),
        }
    }

    fn with_options(mut q: QuestionWithOptions, correct: &[bool]) -> QuestionWithOptions {
        let now = Utc::now();
        q.options = correct
            .iter()
            .enumerate()
            .map(|(i, is_correct)| question_option::Model {
                id: Uuid::new_v4(),
                question_id: q.question.id,
                option_text: format!("option {i}"),
                is_correct: *is_correct,
                order_number: i as i32 + 1,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .collect();
        q
    }

    fn with_accepted(mut q: QuestionWithOptions, text: &str, partial: bool) -> QuestionWithOptions {
        let now = Utc::now();
        q.accepted_answers.push(question_answer::Model {
            id: Uuid::new_v4(),
            question_id: q.question.id,
            correct_text: text.to_string(),
            is_partial_ok: partial,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        q
    }

    #[test]
    fn option_grader_accepts_correct_option_id() {
        let q = with_options(question(QuestionType::Mcq), &[false, true, false]);
        let right = q.options[1].id.to_string();
        let wrong = q.options[0].id.to_string();

        assert!(OptionGrader.is_correct(&q, &right));
        assert!(!OptionGrader.is_correct(&q, &wrong));
        assert!(!OptionGrader.is_correct(&q, "not an id"));
        assert!(!OptionGrader.is_correct(&q, &Uuid::new_v4().to_string()));
    }

    #[test]
    fn option_grader_never_credits_text_questions() {
        let q = with_accepted(question(QuestionType::ShortAnswer), "ownership", false);
        assert!(!OptionGrader.is_correct(&q, "ownership"));
    }

    #[test]
    fn text_grader_matches_accepted_answers() {
        let exact = with_accepted(question(QuestionType::FillBlank), "Borrow  Checker", false);
        assert!(TextAnswerGrader.is_correct(&exact, "  borrow checker "));
        assert!(!TextAnswerGrader.is_correct(&exact, "the borrow checker"));
        assert!(!TextAnswerGrader.is_correct(&exact, ""));

        let partial = with_accepted(question(QuestionType::ShortAnswer), "lifetime", true);
        assert!(TextAnswerGrader.is_correct(&partial, "It is a Lifetime annotation"));

        let choice = with_options(question(QuestionType::TrueFalse), &[true, false]);
        assert!(TextAnswerGrader.is_correct(&choice, &choice.options[0].id.to_string()));
    }

    #[test]
    fn percentage_is_floored() {
        assert_eq!(percentage(8, 10), 80);
        assert_eq!(percentage(2, 3), 66);
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(3, 3), 100);
    }

    #[test]
    fn grade_counts_unanswered_as_incorrect() {
        let q1 = with_options(question(QuestionType::Mcq), &[true, false]);
        let q2 = with_options(question(QuestionType::Mcq), &[false, true]);
        let q3 = question(QuestionType::ShortAnswer);
        let answers = HashMap::from([
            (q1.question.id, q1.options[0].id.to_string()),
            (q3.question.id, "anything".to_string()),
        ]);

        let questions = vec![q1, q2, q3];
        let result = grade(&questions, &answers, &OptionGrader);
        assert_eq!(result.score, 1);
        assert_eq!(result.max_score, 3);
        assert_eq!(result.percentage, 33);
        assert_eq!(result.answers.len(), 3);
        assert_eq!(result.answers[1].user_answer, "");
        assert!(!result.answers[1].is_correct);
    }
}
