use serde::{Deserialize, Serialize};

use crate::model::{question::QuestionTypePolicy, response::RubricResponseDetails};

pub const RUBRIC_MIN_NUM_OF_CHOICES: usize = 2;
pub const RUBRIC_MIN_NUM_OF_SUB_QUESTIONS: usize = 1;
pub const RUBRIC_ERROR_NOT_ENOUGH_CHOICES: &str =
    "Too little choices for Rubric question. Minimum number of options is: ";
pub const RUBRIC_ERROR_NOT_ENOUGH_SUB_QUESTIONS: &str =
    "Too little sub-questions for Rubric question. Minimum number of sub-questions is: ";
pub const RUBRIC_ERROR_EMPTY_SUB_QUESTION: &str = "Sub-questions for Rubric question cannot be empty.";
pub const RUBRIC_ERROR_DESC_INVALID: &str = "The rubric question descriptions are invalid.";
pub const RUBRIC_ERROR_INVALID_WEIGHT: &str = "The weights for the choices of each Sub-question \
of a Rubric question must be valid numbers with precision up to 2 decimal places.";
pub const RUBRIC_ERROR_INVALID_ANSWER: &str = "This Rubric question has invalid answer(s).";
pub const RUBRIC_ERROR_NO_ANSWER: &str = "At least one sub-question of a Rubric question must be answered.";

/// A grid of sub-questions, each answered by picking one of the shared choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricQuestionDetails {
    pub rubric_choices: Vec<String>,
    pub rubric_sub_questions: Vec<String>,
    /// One row per sub-question, one cell per choice.
    #[serde(default)]
    pub rubric_descriptions: Vec<Vec<String>>,
    #[serde(default)]
    pub has_assigned_weights: bool,
    /// Same shape as `rubric_descriptions`.
    #[serde(default)]
    pub rubric_weights_for_each_cell: Vec<Vec<f64>>,
}

impl RubricQuestionDetails {
    fn has_grid_shape<T>(&self, grid: &[Vec<T>]) -> bool {
        grid.len() == self.rubric_sub_questions.len()
            && grid.iter().all(|row| row.len() == self.rubric_choices.len())
    }
}

impl QuestionTypePolicy for RubricQuestionDetails {
    type Response = RubricResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.rubric_choices.len() < RUBRIC_MIN_NUM_OF_CHOICES {
            errors.push(format!(
                "{RUBRIC_ERROR_NOT_ENOUGH_CHOICES}{RUBRIC_MIN_NUM_OF_CHOICES}."
            ));
        }
        if self.rubric_sub_questions.len() < RUBRIC_MIN_NUM_OF_SUB_QUESTIONS {
            errors.push(format!(
                "{RUBRIC_ERROR_NOT_ENOUGH_SUB_QUESTIONS}{RUBRIC_MIN_NUM_OF_SUB_QUESTIONS}."
            ));
        }
        if self
            .rubric_sub_questions
            .iter()
            .any(|sub_question| sub_question.trim().is_empty())
        {
            errors.push(RUBRIC_ERROR_EMPTY_SUB_QUESTION.to_string());
        }
        if !self.rubric_descriptions.is_empty() && !self.has_grid_shape(&self.rubric_descriptions) {
            errors.push(RUBRIC_ERROR_DESC_INVALID.to_string());
        }

        let weights_valid = if self.has_assigned_weights {
            self.has_grid_shape(&self.rubric_weights_for_each_cell)
                && self
                    .rubric_weights_for_each_cell
                    .iter()
                    .flatten()
                    .all(|weight| weight.is_finite())
        } else {
            self.rubric_weights_for_each_cell.is_empty()
        };
        if !weights_valid {
            errors.push(RUBRIC_ERROR_INVALID_WEIGHT.to_string());
        }

        errors
    }

    fn validate_response_details(
        &self,
        responses: &[&RubricResponseDetails],
        _num_recipients: usize,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        let num_choices = self.rubric_choices.len();

        for details in responses {
            let is_shape_valid = details.answer.len() == self.rubric_sub_questions.len()
                && details
                    .answer
                    .iter()
                    .flatten()
                    .all(|choice| *choice < num_choices);
            if !is_shape_valid {
                errors.push(RUBRIC_ERROR_INVALID_ANSWER.to_string());
            } else if details.answer.iter().all(Option::is_none) {
                errors.push(RUBRIC_ERROR_NO_ANSWER.to_string());
            }
        }

        errors
    }

    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        // Answers are positional, so reordering invalidates them.
        self.rubric_choices != new_details.rubric_choices
            || self.rubric_sub_questions != new_details.rubric_sub_questions
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        false
    }
}
