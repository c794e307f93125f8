use serde::{Deserialize, Serialize};

use crate::model::{
    common::FeedbackParticipantType,
    question::{
        mcq::{has_duplicates, no_generated_options, same_elements, weight_violations},
        QuestionTypePolicy,
    },
    response::MsqResponseDetails,
};

pub const MSQ_MIN_NUM_OF_CHOICES: usize = 2;
/// Answer recorded when the respondent selected "None of the above".
pub const MSQ_ANSWER_NONE_OF_THE_ABOVE: &str = "NONE_OF_THE_ABOVE";

pub const MSQ_ERROR_NOT_ENOUGH_CHOICES: &str = "Too little choices for Multiple-choice \
(multiple answers) question. Minimum number of options is: ";
pub const MSQ_ERROR_EMPTY_MSQ_OPTION: &str = "The Msq options cannot be empty";
pub const MSQ_ERROR_DUPLICATE_MSQ_OPTION: &str = "The Msq options cannot contain duplicates";
pub const MSQ_ERROR_INVALID_WEIGHT: &str = "The weights for the choices of a Multiple-choice \
(multiple answers) question must be valid non-negative numbers with precision up to 2 decimal places.";
pub const MSQ_ERROR_MAX_SELECTABLE_EXCEEDED_TOTAL: &str = "Maximum selectable choices exceeds \
the total number of options for Multiple-choice (multiple answers) question.";
pub const MSQ_ERROR_MIN_FOR_MAX_SELECTABLE_CHOICES: &str = "Maximum selectable choices for \
Multiple-choice (multiple answers) question must be at least 2.";
pub const MSQ_ERROR_MIN_FOR_MIN_SELECTABLE_CHOICES: &str = "Minimum selectable choices for \
Multiple-choice (multiple answers) question must be at least 1.";
pub const MSQ_ERROR_MIN_SELECTABLE_MORE_THAN_NUM_CHOICES: &str = "Minimum selectable choices \
exceeds number of options in Multiple-choice (multiple answers) question.";
pub const MSQ_ERROR_MIN_SELECTABLE_EXCEEDED_MAX_SELECTABLE: &str = "Minimum selectable choices \
exceeds maximum selectable choices for Multiple-choice (multiple answers) question.";
pub const MSQ_ERROR_INVALID_OPTION: &str =
    "is not a valid option for the Multiple-choice (multiple answers) question.";
pub const MSQ_ERROR_OTHER_CONTENT_NOT_PROVIDED: &str = "No text provided for other option";
pub const MSQ_ERROR_NUM_SELECTED_MORE_THAN_MAXIMUM: &str =
    "Number of choices selected is more than the maximum number ";
pub const MSQ_ERROR_NUM_SELECTED_LESS_THAN_MINIMUM: &str =
    "Number of choices selected is less than the minimum number ";
pub const MSQ_ERROR_NONE_OF_THE_ABOVE_ANSWER: &str =
    "'None of the above' option cannot be selected if other options are selected.";
pub const MSQ_ERROR_NONE_OF_THE_ABOVE_WITH_MIN_SELECTABLE: &str =
    "'None of the above' option cannot be selected when a minimum number of choices is required.";

/// Multiple-choice question allowing several answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsqQuestionDetails {
    pub msq_choices: Vec<String>,
    #[serde(default)]
    pub other_enabled: bool,
    #[serde(default)]
    pub has_assigned_weights: bool,
    #[serde(default)]
    pub msq_weights: Vec<f64>,
    #[serde(default)]
    pub msq_other_weight: f64,
    #[serde(default = "no_generated_options")]
    pub generate_options_for: FeedbackParticipantType,
    /// `None` when there is no upper bound.
    #[serde(default)]
    pub max_selectable_choices: Option<i32>,
    /// `None` when there is no lower bound.
    #[serde(default)]
    pub min_selectable_choices: Option<i32>,
    /// Number of choices produced for generated options; never persisted.
    #[serde(skip)]
    pub num_of_generated_msq_choices: usize,
}

impl MsqQuestionDetails {
    /// Size of the option pool a respondent chooses from, counting "other".
    fn num_of_msq_choices(&self) -> i32 {
        let count = if self.generate_options_for == FeedbackParticipantType::None {
            self.msq_choices.len() + usize::from(self.other_enabled)
        } else {
            self.num_of_generated_msq_choices
        };
        i32::try_from(count).unwrap_or(i32::MAX)
    }
}

impl QuestionTypePolicy for MsqQuestionDetails {
    type Response = MsqResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.generate_options_for == FeedbackParticipantType::None {
            if self.msq_choices.len() < MSQ_MIN_NUM_OF_CHOICES {
                errors.push(format!(
                    "{MSQ_ERROR_NOT_ENOUGH_CHOICES}{MSQ_MIN_NUM_OF_CHOICES}."
                ));
            }
            if self.msq_choices.iter().any(|choice| choice.trim().is_empty()) {
                errors.push(MSQ_ERROR_EMPTY_MSQ_OPTION.to_string());
            }
            errors.extend(weight_violations(
                self.has_assigned_weights,
                self.msq_choices.len(),
                &self.msq_weights,
                self.other_enabled,
                self.msq_other_weight,
                MSQ_ERROR_INVALID_WEIGHT,
            ));
            if has_duplicates(&self.msq_choices) {
                errors.push(MSQ_ERROR_DUPLICATE_MSQ_OPTION.to_string());
            }
        }

        let num_of_msq_choices = self.num_of_msq_choices();
        // The cap may not exceed the pool, so a pool smaller than the cap is an error.
        if let Some(max) = self.max_selectable_choices {
            if num_of_msq_choices < max {
                errors.push(MSQ_ERROR_MAX_SELECTABLE_EXCEEDED_TOTAL.to_string());
            } else if max < 2 {
                errors.push(MSQ_ERROR_MIN_FOR_MAX_SELECTABLE_CHOICES.to_string());
            }
        }
        if let Some(min) = self.min_selectable_choices {
            if min < 1 {
                errors.push(MSQ_ERROR_MIN_FOR_MIN_SELECTABLE_CHOICES.to_string());
            }
            if min > num_of_msq_choices {
                errors.push(MSQ_ERROR_MIN_SELECTABLE_MORE_THAN_NUM_CHOICES.to_string());
            }
        }
        if let (Some(min), Some(max)) = (self.min_selectable_choices, self.max_selectable_choices) {
            if min > max {
                errors.push(MSQ_ERROR_MIN_SELECTABLE_EXCEEDED_MAX_SELECTABLE.to_string());
            }
        }

        errors
    }

    fn validate_response_details(
        &self,
        responses: &[&MsqResponseDetails],
        _num_recipients: usize,
    ) -> Vec<String> {
        let mut errors = Vec::new();

        for details in responses {
            // Including the "other" answer.
            let total_choices_selected = i32::try_from(details.answers.len()).unwrap_or(i32::MAX);
            let is_none_of_the_above = details
                .answers
                .iter()
                .any(|answer| answer == MSQ_ANSWER_NONE_OF_THE_ABOVE);

            if details.is_other && !self.other_enabled {
                errors.push(MSQ_ERROR_INVALID_OPTION.to_string());
            }
            if self.other_enabled && !details.is_other && !details.other_field_content.is_empty() {
                errors.push(MSQ_ERROR_INVALID_OPTION.to_string());
            }

            let mut valid_choices: Vec<&str> =
                self.msq_choices.iter().map(String::as_str).collect();
            if self.other_enabled && details.is_other {
                valid_choices.push(&details.other_field_content);
            }
            let answers_are_choices = details
                .answers
                .iter()
                .all(|answer| valid_choices.contains(&answer.as_str()));
            if !answers_are_choices && !is_none_of_the_above {
                errors.push(format!(
                    "{} {MSQ_ERROR_INVALID_OPTION}",
                    details.answer_string()
                ));
            }

            if details.is_other && details.other_field_content.trim().is_empty() {
                errors.push(MSQ_ERROR_OTHER_CONTENT_NOT_PROVIDED.to_string());
            }
            if details.is_other && !details.answers.contains(&details.other_field_content) {
                errors.push(MSQ_ERROR_OTHER_CONTENT_NOT_PROVIDED.to_string());
            }

            if let Some(max) = self.max_selectable_choices {
                if total_choices_selected > max {
                    errors.push(format!("{MSQ_ERROR_NUM_SELECTED_MORE_THAN_MAXIMUM}{max}"));
                }
            }

            match self.min_selectable_choices {
                Some(min) => {
                    if total_choices_selected < min {
                        errors.push(format!("{MSQ_ERROR_NUM_SELECTED_LESS_THAN_MINIMUM}{min}"));
                    }
                    if is_none_of_the_above {
                        errors.push(MSQ_ERROR_NONE_OF_THE_ABOVE_WITH_MIN_SELECTABLE.to_string());
                    }
                }
                None => {
                    if (details.answers.len() > 1 || details.is_other) && is_none_of_the_above {
                        errors.push(MSQ_ERROR_NONE_OF_THE_ABOVE_ANSWER.to_string());
                    }
                }
            }
        }

        errors
    }

    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        if !same_elements(&self.msq_choices, &new_details.msq_choices) {
            return true;
        }
        if self.generate_options_for != new_details.generate_options_for {
            return true;
        }

        match (self.max_selectable_choices, new_details.max_selectable_choices) {
            // Newly added, or made stricter.
            (None, Some(_)) => return true,
            (Some(old), Some(new)) if old > new => return true,
            _ => {}
        }
        match (self.min_selectable_choices, new_details.min_selectable_choices) {
            (None, Some(_)) => return true,
            (Some(old), Some(new)) if old < new => return true,
            _ => {}
        }

        self.other_enabled != new_details.other_enabled
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        false
    }
}

/// Example test data.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl MsqQuestionDetails {
        pub fn example() -> Self {
            Self {
                msq_choices: vec!["Rust".to_string(), "Go".to_string(), "Haskell".to_string()],
                other_enabled: false,
                has_assigned_weights: false,
                msq_weights: Vec::new(),
                msq_other_weight: 0.0,
                generate_options_for: FeedbackParticipantType::None,
                max_selectable_choices: None,
                min_selectable_choices: None,
                num_of_generated_msq_choices: 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_is_valid() {
        assert!(MsqQuestionDetails::example()
            .validate_question_details()
            .is_empty());
    }

    #[test]
    fn not_enough_choices() {
        let mut details = MsqQuestionDetails::example();
        details.msq_choices.truncate(1);
        assert_eq!(
            details.validate_question_details(),
            vec![format!("{MSQ_ERROR_NOT_ENOUGH_CHOICES}2.")]
        );
    }

    #[test]
    fn weight_count_must_match_choices() {
        let mut details = MsqQuestionDetails::example();
        details.has_assigned_weights = true;
        details.msq_weights = vec![1.0, 2.0];
        assert_eq!(
            details.validate_question_details(),
            vec![MSQ_ERROR_INVALID_WEIGHT.to_string()]
        );

        details.msq_weights = vec![1.0, 2.0, 0.5];
        assert!(details.validate_question_details().is_empty());

        // Each negative weight is reported.
        details.msq_weights = vec![-1.0, -2.0, 0.5];
        assert_eq!(details.validate_question_details().len(), 2);

        details.msq_weights = vec![1.0, 2.0, 0.5];
        details.msq_other_weight = 1.0;
        assert_eq!(details.validate_question_details().len(), 1);
    }

    #[test]
    fn max_selectable_bounds() {
        let mut details = MsqQuestionDetails::example();

        // Three choices, cap of four.
        details.max_selectable_choices = Some(4);
        assert_eq!(
            details.validate_question_details(),
            vec![MSQ_ERROR_MAX_SELECTABLE_EXCEEDED_TOTAL.to_string()]
        );

        // Enabling "other" grows the pool to four.
        details.other_enabled = true;
        assert!(details.validate_question_details().is_empty());

        details.max_selectable_choices = Some(1);
        assert_eq!(
            details.validate_question_details(),
            vec![MSQ_ERROR_MIN_FOR_MAX_SELECTABLE_CHOICES.to_string()]
        );
    }

    #[test]
    fn min_selectable_bounds() {
        let mut details = MsqQuestionDetails::example();

        details.min_selectable_choices = Some(0);
        assert_eq!(
            details.validate_question_details(),
            vec![MSQ_ERROR_MIN_FOR_MIN_SELECTABLE_CHOICES.to_string()]
        );

        details.min_selectable_choices = Some(4);
        assert_eq!(
            details.validate_question_details(),
            vec![MSQ_ERROR_MIN_SELECTABLE_MORE_THAN_NUM_CHOICES.to_string()]
        );

        details.min_selectable_choices = Some(3);
        details.max_selectable_choices = Some(2);
        assert_eq!(
            details.validate_question_details(),
            vec![MSQ_ERROR_MIN_SELECTABLE_EXCEEDED_MAX_SELECTABLE.to_string()]
        );
    }

    #[test]
    fn generated_choices_use_generated_count() {
        let mut details = MsqQuestionDetails::example();
        details.msq_choices.clear();
        details.generate_options_for = FeedbackParticipantType::Students;
        details.num_of_generated_msq_choices = 5;
        details.max_selectable_choices = Some(5);
        assert!(details.validate_question_details().is_empty());

        details.num_of_generated_msq_choices = 4;
        assert_eq!(
            details.validate_question_details(),
            vec![MSQ_ERROR_MAX_SELECTABLE_EXCEEDED_TOTAL.to_string()]
        );
    }

    #[test]
    fn valid_response() {
        let details = MsqQuestionDetails::example();
        let response = MsqResponseDetails::selecting(&["Rust", "Haskell"]);
        assert!(details.validate_response_details(&[&response], 1).is_empty());
    }

    #[test]
    fn unknown_answer() {
        let details = MsqQuestionDetails::example();
        let response = MsqResponseDetails::selecting(&["Rust", "COBOL"]);
        assert_eq!(
            details.validate_response_details(&[&response], 1),
            vec![format!("Rust, COBOL {MSQ_ERROR_INVALID_OPTION}")]
        );
    }

    #[test]
    fn other_answer() {
        let mut details = MsqQuestionDetails::example();
        let response = MsqResponseDetails {
            answers: vec!["Rust".to_string(), "Zig".to_string()],
            is_other: true,
            other_field_content: "Zig".to_string(),
        };
        // "Other" is not enabled.
        let errors = details.validate_response_details(&[&response], 1);
        assert!(errors.contains(&MSQ_ERROR_INVALID_OPTION.to_string()));

        details.other_enabled = true;
        assert!(details.validate_response_details(&[&response], 1).is_empty());

        let blank = MsqResponseDetails {
            answers: vec!["Rust".to_string(), " ".to_string()],
            is_other: true,
            other_field_content: " ".to_string(),
        };
        assert_eq!(
            details.validate_response_details(&[&blank], 1),
            vec![MSQ_ERROR_OTHER_CONTENT_NOT_PROVIDED.to_string()]
        );
    }

    #[test]
    fn none_of_the_above_alone_is_valid() {
        let details = MsqQuestionDetails::example();
        let response = MsqResponseDetails::selecting(&[MSQ_ANSWER_NONE_OF_THE_ABOVE]);
        assert!(details.validate_response_details(&[&response], 1).is_empty());
    }

    #[test]
    fn none_of_the_above_with_other_selections() {
        let details = MsqQuestionDetails::example();
        let response = MsqResponseDetails::selecting(&["Rust", MSQ_ANSWER_NONE_OF_THE_ABOVE]);
        assert_eq!(
            details.validate_response_details(&[&response], 1),
            vec![MSQ_ERROR_NONE_OF_THE_ABOVE_ANSWER.to_string()]
        );
    }

    #[test]
    fn none_of_the_above_with_min_selectable() {
        let mut details = MsqQuestionDetails::example();
        details.min_selectable_choices = Some(2);
        let response = MsqResponseDetails::selecting(&[MSQ_ANSWER_NONE_OF_THE_ABOVE]);
        let errors = details.validate_response_details(&[&response], 1);
        assert!(errors.contains(&MSQ_ERROR_NONE_OF_THE_ABOVE_WITH_MIN_SELECTABLE.to_string()));
        assert!(errors.contains(&format!("{MSQ_ERROR_NUM_SELECTED_LESS_THAN_MINIMUM}2")));
    }

    #[test]
    fn selection_count_bounds() {
        let mut details = MsqQuestionDetails::example();
        details.max_selectable_choices = Some(2);
        let response = MsqResponseDetails::selecting(&["Rust", "Go", "Haskell"]);
        assert_eq!(
            details.validate_response_details(&[&response], 1),
            vec![format!("{MSQ_ERROR_NUM_SELECTED_MORE_THAN_MAXIMUM}2")]
        );
    }

    #[test]
    fn deletion_rules() {
        let old = MsqQuestionDetails::example();

        let mut new = old.clone();
        new.msq_choices.rotate_left(1);
        assert!(!old.should_changes_require_response_deletion(&new));

        new.msq_choices[0] = "Ocaml".to_string();
        assert!(old.should_changes_require_response_deletion(&new));

        let mut new = old.clone();
        new.max_selectable_choices = Some(2);
        assert!(old.should_changes_require_response_deletion(&new));

        let mut old_capped = old.clone();
        old_capped.max_selectable_choices = Some(2);
        let mut relaxed = old_capped.clone();
        relaxed.max_selectable_choices = Some(3);
        assert!(!old_capped.should_changes_require_response_deletion(&relaxed));
        assert!(relaxed.should_changes_require_response_deletion(&old_capped));

        let mut old_min = old.clone();
        old_min.min_selectable_choices = Some(1);
        let mut stricter = old_min.clone();
        stricter.min_selectable_choices = Some(2);
        assert!(old_min.should_changes_require_response_deletion(&stricter));
        assert!(!stricter.should_changes_require_response_deletion(&old_min));

        let mut new = old.clone();
        new.other_enabled = true;
        assert!(old.should_changes_require_response_deletion(&new));
    }
}
