use serde::{Deserialize, Serialize};

use crate::model::{
    common::FeedbackParticipantType, question::QuestionTypePolicy,
    response::McqResponseDetails,
};

pub const MCQ_MIN_NUM_OF_CHOICES: usize = 2;
pub const MCQ_ERROR_NOT_ENOUGH_CHOICES: &str =
    "Too little choices for Multiple-choice (single answer) question. Minimum number of options is: ";
pub const MCQ_ERROR_EMPTY_MCQ_OPTION: &str = "The Mcq options cannot be empty";
pub const MCQ_ERROR_DUPLICATE_MCQ_OPTION: &str = "The Mcq options cannot contain duplicates";
pub const MCQ_ERROR_INVALID_WEIGHT: &str = "The weights for the choices of a Multiple-choice \
(single answer) question must be valid non-negative numbers with precision up to 2 decimal places.";
pub const MCQ_ERROR_INVALID_OPTION: &str =
    "is not a valid option for the Multiple-choice (single answer) question.";
pub const MCQ_ERROR_OTHER_CONTENT_NOT_PROVIDED: &str = "No text provided for other option";

/// Multiple-choice question allowing a single answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqQuestionDetails {
    pub mcq_choices: Vec<String>,
    #[serde(default)]
    pub other_enabled: bool,
    #[serde(default)]
    pub has_assigned_weights: bool,
    #[serde(default)]
    pub mcq_weights: Vec<f64>,
    #[serde(default)]
    pub mcq_other_weight: f64,
    /// If not `None`, the choices are generated from the course roster.
    #[serde(default = "no_generated_options")]
    pub generate_options_for: FeedbackParticipantType,
}

pub(super) fn no_generated_options() -> FeedbackParticipantType {
    FeedbackParticipantType::None
}

impl QuestionTypePolicy for McqQuestionDetails {
    type Response = McqResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.generate_options_for != FeedbackParticipantType::None {
            return errors;
        }

        if self.mcq_choices.len() < MCQ_MIN_NUM_OF_CHOICES {
            errors.push(format!(
                "{MCQ_ERROR_NOT_ENOUGH_CHOICES}{MCQ_MIN_NUM_OF_CHOICES}."
            ));
        }
        if self.mcq_choices.iter().any(|choice| choice.trim().is_empty()) {
            errors.push(MCQ_ERROR_EMPTY_MCQ_OPTION.to_string());
        }
        errors.extend(weight_violations(
            self.has_assigned_weights,
            self.mcq_choices.len(),
            &self.mcq_weights,
            self.other_enabled,
            self.mcq_other_weight,
            MCQ_ERROR_INVALID_WEIGHT,
        ));
        if has_duplicates(&self.mcq_choices) {
            errors.push(MCQ_ERROR_DUPLICATE_MCQ_OPTION.to_string());
        }

        errors
    }

    fn validate_response_details(
        &self,
        responses: &[&McqResponseDetails],
        _num_recipients: usize,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        let is_generated = self.generate_options_for != FeedbackParticipantType::None;

        for details in responses {
            if details.is_other {
                if !self.other_enabled {
                    errors.push(format!("{} {MCQ_ERROR_INVALID_OPTION}", details.answer));
                } else if details.other_field_content.trim().is_empty() {
                    errors.push(MCQ_ERROR_OTHER_CONTENT_NOT_PROVIDED.to_string());
                }
            } else if !is_generated && !self.mcq_choices.contains(&details.answer) {
                errors.push(format!("{} {MCQ_ERROR_INVALID_OPTION}", details.answer));
            }
        }

        errors
    }

    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        !same_elements(&self.mcq_choices, &new_details.mcq_choices)
            || self.generate_options_for != new_details.generate_options_for
            || self.other_enabled != new_details.other_enabled
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        true
    }
}

/// Weight rules shared by both multiple-choice variants.
/// One violation is reported for every negative weight.
pub(super) fn weight_violations(
    has_assigned_weights: bool,
    num_choices: usize,
    weights: &[f64],
    other_enabled: bool,
    other_weight: f64,
    message: &str,
) -> Vec<String> {
    let mut errors = Vec::new();

    // A choice whose weight failed to parse leaves the lists with different lengths.
    if has_assigned_weights && num_choices != weights.len() {
        errors.push(message.to_string());
    }
    if !has_assigned_weights && (!weights.is_empty() || other_weight != 0.0) {
        errors.push(message.to_string());
    }
    if has_assigned_weights && !other_enabled && other_weight != 0.0 {
        errors.push(message.to_string());
    }
    if has_assigned_weights {
        errors.extend(
            weights
                .iter()
                .filter(|weight| **weight < 0.0)
                .map(|_| message.to_string()),
        );
    }
    if has_assigned_weights && other_enabled && other_weight < 0.0 {
        errors.push(message.to_string());
    }

    errors
}

/// Do any two entries coincide once surrounding whitespace is ignored?
pub(super) fn has_duplicates(options: &[String]) -> bool {
    let mut seen = std::collections::HashSet::with_capacity(options.len());
    !options.iter().all(|option| seen.insert(option.trim()))
}

/// Same length, and each list contains every entry of the other.
pub(super) fn same_elements(old: &[String], new: &[String]) -> bool {
    old.len() == new.len()
        && old.iter().all(|o| new.contains(o))
        && new.iter().all(|n| old.contains(n))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_is_valid() {
        assert!(McqQuestionDetails::example()
            .validate_question_details()
            .is_empty());
    }

    #[test]
    fn choice_rules() {
        let mut details = McqQuestionDetails::example();
        details.mcq_choices = vec![" Agree".to_string(), "Agree ".to_string(), " ".to_string()];
        let errors = details.validate_question_details();
        assert!(errors.contains(&MCQ_ERROR_EMPTY_MCQ_OPTION.to_string()));
        assert!(errors.contains(&MCQ_ERROR_DUPLICATE_MCQ_OPTION.to_string()));

        details.mcq_choices.truncate(1);
        let errors = details.validate_question_details();
        assert_eq!(
            errors,
            vec![format!("{MCQ_ERROR_NOT_ENOUGH_CHOICES}{MCQ_MIN_NUM_OF_CHOICES}.")]
        );
    }

    #[test]
    fn generated_choices_skip_choice_rules() {
        let mut details = McqQuestionDetails::example();
        details.mcq_choices.clear();
        details.generate_options_for = FeedbackParticipantType::Students;
        assert!(details.validate_question_details().is_empty());
    }

    #[test]
    fn weight_rules() {
        let mut details = McqQuestionDetails::example();
        details.has_assigned_weights = true;
        details.mcq_weights = vec![1.0];
        assert_eq!(details.validate_question_details().len(), 1);

        details.mcq_weights = vec![1.0, -2.0];
        assert_eq!(
            details.validate_question_details(),
            vec![MCQ_ERROR_INVALID_WEIGHT.to_string()]
        );

        details.mcq_weights = vec![1.0, 2.0];
        details.mcq_other_weight = 3.0;
        assert_eq!(details.validate_question_details().len(), 1);
        details.other_enabled = true;
        assert!(details.validate_question_details().is_empty());

        details.has_assigned_weights = false;
        assert_eq!(details.validate_question_details().len(), 1);
    }

    #[test]
    fn response_rules() {
        let details = McqQuestionDetails::example();
        let valid = McqResponseDetails {
            answer: "Agree".to_string(),
            ..Default::default()
        };
        let invalid = McqResponseDetails {
            answer: "Maybe".to_string(),
            ..Default::default()
        };
        let other = McqResponseDetails {
            answer: "Sometimes".to_string(),
            is_other: true,
            other_field_content: "Sometimes".to_string(),
        };
        assert!(details.validate_response_details(&[&valid], 1).is_empty());
        assert_eq!(
            details.validate_response_details(&[&valid, &invalid, &other], 3),
            vec![
                format!("Maybe {MCQ_ERROR_INVALID_OPTION}"),
                format!("Sometimes {MCQ_ERROR_INVALID_OPTION}"),
            ]
        );
    }

    #[test]
    fn deletion_on_choice_change() {
        let old = McqQuestionDetails::example();
        let mut new = old.clone();
        new.mcq_choices.reverse();
        assert!(!old.should_changes_require_response_deletion(&new));
        new.mcq_choices.push("Neutral".to_string());
        assert!(old.should_changes_require_response_deletion(&new));
    }
}
