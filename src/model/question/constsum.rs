use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{
    question::{
        mcq::{has_duplicates, same_elements},
        QuestionTypePolicy,
    },
    response::ConstSumResponseDetails,
};

pub const CONST_SUM_MIN_NUM_OF_OPTIONS: usize = 2;
pub const CONST_SUM_MIN_NUM_OF_POINTS: i32 = 1;
pub const CONST_SUM_ERROR_NOT_ENOUGH_OPTIONS: &str = "Too little options for Distribute points \
(among options) question. Minimum number of options is: ";
pub const CONST_SUM_ERROR_NOT_ENOUGH_POINTS: &str =
    "Too little points for Distribute points question. Minimum number of points is: ";
pub const CONST_SUM_ERROR_EMPTY_OPTION: &str = "The Distribute points options cannot be empty";
pub const CONST_SUM_ERROR_DUPLICATE_OPTIONS: &str = "Duplicate options are not allowed.";
pub const CONST_SUM_ERROR_MISMATCH: &str = "Please distribute all the points for distribution questions. \
To distribute all points, the sum of points given must equal the total.";
pub const CONST_SUM_ERROR_NEGATIVE: &str = "Points given must be 0 or more.";
pub const CONST_SUM_ERROR_ALL_UNIQUE: &str = "Every option must be given a different number of points.";
pub const CONST_SUM_ERROR_SOME_UNIQUE: &str =
    "At least some options must be given a different number of points.";

/// How unevenly the points must be spread.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionRule {
    #[default]
    #[serde(rename = "None")]
    Any,
    #[serde(rename = "All options")]
    AllDifferent,
    #[serde(rename = "At least some options")]
    SomeDifferent,
}

/// Point budget shared by both kinds of distribution question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointBudget {
    pub points: i32,
    /// If set, `points` is given once per option (or recipient) rather than once in total.
    #[serde(default)]
    pub points_per_option: bool,
    #[serde(default)]
    pub distribute_points_for: DistributionRule,
}

impl PointBudget {
    fn violations(&self) -> Vec<String> {
        if self.points < CONST_SUM_MIN_NUM_OF_POINTS {
            vec![format!(
                "{CONST_SUM_ERROR_NOT_ENOUGH_POINTS}{CONST_SUM_MIN_NUM_OF_POINTS}."
            )]
        } else {
            Vec::new()
        }
    }

    fn total(&self, num_shares: usize) -> i64 {
        if self.points_per_option {
            i64::from(self.points) * i64::try_from(num_shares).unwrap_or(i64::MAX)
        } else {
            i64::from(self.points)
        }
    }

    /// Check a complete distribution of points over `num_shares` shares.
    fn distribution_violations(
        &self,
        given: &[i32],
        num_shares: usize,
        errors: &mut Vec<String>,
    ) {
        let sum: i64 = given.iter().map(|points| i64::from(*points)).sum();
        if sum != self.total(num_shares) {
            errors.push(CONST_SUM_ERROR_MISMATCH.to_string());
        }
        if given.iter().any(|points| *points < 0) {
            errors.push(CONST_SUM_ERROR_NEGATIVE.to_string());
        }

        let distinct: HashSet<_> = given.iter().collect();
        match self.distribute_points_for {
            DistributionRule::Any => {}
            DistributionRule::AllDifferent => {
                if distinct.len() < given.len() {
                    errors.push(CONST_SUM_ERROR_ALL_UNIQUE.to_string());
                }
            }
            DistributionRule::SomeDifferent => {
                if given.len() > 1 && distinct.len() == 1 {
                    errors.push(CONST_SUM_ERROR_SOME_UNIQUE.to_string());
                }
            }
        }
    }
}

/// Distribute points among a fixed list of options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstSumOptionsQuestionDetails {
    pub const_sum_options: Vec<String>,
    #[serde(flatten)]
    pub budget: PointBudget,
}

impl QuestionTypePolicy for ConstSumOptionsQuestionDetails {
    type Response = ConstSumResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.const_sum_options.len() < CONST_SUM_MIN_NUM_OF_OPTIONS {
            errors.push(format!(
                "{CONST_SUM_ERROR_NOT_ENOUGH_OPTIONS}{CONST_SUM_MIN_NUM_OF_OPTIONS}."
            ));
        }
        if self
            .const_sum_options
            .iter()
            .any(|option| option.trim().is_empty())
        {
            errors.push(CONST_SUM_ERROR_EMPTY_OPTION.to_string());
        }
        errors.extend(self.budget.violations());
        if has_duplicates(&self.const_sum_options) {
            errors.push(CONST_SUM_ERROR_DUPLICATE_OPTIONS.to_string());
        }

        errors
    }

    fn validate_response_details(
        &self,
        responses: &[&ConstSumResponseDetails],
        _num_recipients: usize,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        let num_options = self.const_sum_options.len();

        for details in responses {
            if details.answers.len() != num_options {
                errors.push(CONST_SUM_ERROR_MISMATCH.to_string());
                continue;
            }
            self.budget
                .distribution_violations(&details.answers, num_options, &mut errors);
        }

        errors
    }

    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        !same_elements(&self.const_sum_options, &new_details.const_sum_options)
            || self.budget != new_details.budget
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        false
    }
}

/// Distribute points among the recipients of the question.
/// Each response carries the points given to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstSumRecipientsQuestionDetails {
    #[serde(flatten)]
    pub budget: PointBudget,
}

impl QuestionTypePolicy for ConstSumRecipientsQuestionDetails {
    type Response = ConstSumResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        self.budget.violations()
    }

    fn validate_response_details(
        &self,
        responses: &[&ConstSumResponseDetails],
        num_recipients: usize,
    ) -> Vec<String> {
        let mut errors = Vec::new();

        let mut given = Vec::with_capacity(responses.len());
        for details in responses {
            match details.answers.as_slice() {
                [points] => given.push(*points),
                _ => errors.push(CONST_SUM_ERROR_MISMATCH.to_string()),
            }
        }
        if errors.is_empty() {
            self.budget
                .distribution_violations(&given, num_recipients, &mut errors);
        }

        errors
    }

    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        self.budget != new_details.budget
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        false
    }
}
