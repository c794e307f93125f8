use serde::{Deserialize, Serialize};

use crate::model::{question::QuestionTypePolicy, response::NumericalScaleResponseDetails};

pub const NUMSCALE_ERROR_MIN_MAX: &str =
    "Minimum value must be < maximum value for Numerical-scale question.";
pub const NUMSCALE_ERROR_STEP: &str =
    "Step size must be greater than 0 for Numerical-scale question.";
pub const NUMSCALE_ERROR_UNINTERPRETABLE: &str =
    "is not a valid value for the Numerical-scale question.";
pub const NUMSCALE_ERROR_OUT_OF_RANGE: &str = "is out of the range for Numerical-scale question.";

const STEP_TOLERANCE: f64 = 1e-9;

/// Answer with a number from `min_scale` to `max_scale` in increments of `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericalScaleQuestionDetails {
    pub min_scale: i32,
    pub max_scale: i32,
    pub step: f64,
}

impl NumericalScaleQuestionDetails {
    fn is_on_step(&self, answer: f64) -> bool {
        let steps = (answer - f64::from(self.min_scale)) / self.step;
        (steps - steps.round()).abs() < STEP_TOLERANCE
    }
}

impl QuestionTypePolicy for NumericalScaleQuestionDetails {
    type Response = NumericalScaleResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.min_scale >= self.max_scale {
            errors.push(NUMSCALE_ERROR_MIN_MAX.to_string());
        }
        if !(self.step > 0.0) {
            errors.push(NUMSCALE_ERROR_STEP.to_string());
        }
        errors
    }

    fn validate_response_details(
        &self,
        responses: &[&NumericalScaleResponseDetails],
        _num_recipients: usize,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        let (min, max) = (f64::from(self.min_scale), f64::from(self.max_scale));

        for details in responses {
            let answer = details.answer;
            if !answer.is_finite() {
                errors.push(format!("{answer} {NUMSCALE_ERROR_UNINTERPRETABLE}"));
            } else if answer < min || answer > max {
                errors.push(format!(
                    "{answer} {NUMSCALE_ERROR_OUT_OF_RANGE}(min={min}, max={max})"
                ));
            } else if !self.is_on_step(answer) {
                errors.push(format!("{answer} {NUMSCALE_ERROR_UNINTERPRETABLE}"));
            }
        }

        errors
    }

    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        self != new_details
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to_five() -> NumericalScaleQuestionDetails {
        NumericalScaleQuestionDetails {
            min_scale: 1,
            max_scale: 5,
            step: 0.5,
        }
    }

    fn answer(answer: f64) -> NumericalScaleResponseDetails {
        NumericalScaleResponseDetails { answer }
    }

    #[test]
    fn scale_rules() {
        assert!(one_to_five().validate_question_details().is_empty());

        let details = NumericalScaleQuestionDetails {
            min_scale: 5,
            max_scale: 5,
            step: 0.0,
        };
        assert_eq!(
            details.validate_question_details(),
            vec![NUMSCALE_ERROR_MIN_MAX.to_string(), NUMSCALE_ERROR_STEP.to_string()]
        );
    }

    #[test]
    fn answers_on_the_scale() {
        let details = one_to_five();
        assert!(details
            .validate_response_details(&[&answer(1.0), &answer(3.5), &answer(5.0)], 3)
            .is_empty());
        assert_eq!(
            details.validate_response_details(&[&answer(0.5), &answer(2.25)], 2),
            vec![
                format!("0.5 {NUMSCALE_ERROR_OUT_OF_RANGE}(min=1, max=5)"),
                format!("2.25 {NUMSCALE_ERROR_UNINTERPRETABLE}"),
            ]
        );
    }

    #[test]
    fn any_change_requires_deletion() {
        let old = one_to_five();
        assert!(!old.should_changes_require_response_deletion(&one_to_five()));
        let mut new = one_to_five();
        new.step = 1.0;
        assert!(old.should_changes_require_response_deletion(&new));
    }
}
