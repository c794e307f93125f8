use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{
    question::{mcq::same_elements, QuestionTypePolicy},
    response::{RankOptionsResponseDetails, RankRecipientsResponseDetails},
};

pub const RANK_OPTIONS_MIN_NUM_OF_OPTIONS: usize = 2;
pub const RANK_ERROR_INVALID_MAX_OPTIONS_ENABLED: &str = "Max options enabled is invalid";
pub const RANK_ERROR_INVALID_MIN_OPTIONS_ENABLED: &str = "Min options enabled is invalid";
pub const RANK_ERROR_MIN_OPTIONS_ENABLED_MORE_THAN_CHOICES: &str =
    "Min options enabled is more than the total choices";
pub const RANK_ERROR_MAX_OPTIONS_ENABLED_MORE_THAN_CHOICES: &str =
    "Max options enabled is more than the total choices";
pub const RANK_ERROR_NOT_ENOUGH_OPTIONS: &str =
    "Too little options for Rank options question. Minimum number of options is: ";
pub const RANK_ERROR_EMPTY_OPTIONS_ENTERED: &str = "Empty Rank Options are not allowed";
pub const RANK_ERROR_DUPLICATE_RANK: &str = "Duplicate Ranks are not allowed.";
pub const RANK_ERROR_INVALID_RANK: &str = "Invalid rank assigned.";

/// Limits shared by both kinds of ranking question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankLimits {
    /// `None` when the respondent may rank as few as they like.
    #[serde(default)]
    pub min_options_to_be_ranked: Option<i32>,
    /// `None` when the respondent may rank as many as they like.
    #[serde(default)]
    pub max_options_to_be_ranked: Option<i32>,
    #[serde(default)]
    pub are_duplicates_allowed: bool,
}

impl RankLimits {
    /// Bounds on the limits themselves, given how many things can be ranked.
    fn violations(&self, num_rankable: Option<usize>) -> Vec<String> {
        let mut errors = Vec::new();
        let exceeds = |limit: i32| {
            num_rankable.map_or(false, |n| usize::try_from(limit).map_or(false, |l| l > n))
        };

        if let Some(max) = self.max_options_to_be_ranked {
            if max < 1 {
                errors.push(RANK_ERROR_INVALID_MAX_OPTIONS_ENABLED.to_string());
            }
            if exceeds(max) {
                errors.push(RANK_ERROR_MAX_OPTIONS_ENABLED_MORE_THAN_CHOICES.to_string());
            }
        }
        if let Some(min) = self.min_options_to_be_ranked {
            if min < 1 {
                errors.push(RANK_ERROR_INVALID_MIN_OPTIONS_ENABLED.to_string());
            }
            if exceeds(min) {
                errors.push(RANK_ERROR_MIN_OPTIONS_ENABLED_MORE_THAN_CHOICES.to_string());
            }
        }
        if let (Some(min), Some(max)) = (self.min_options_to_be_ranked, self.max_options_to_be_ranked)
        {
            if min > max {
                errors.push(RANK_ERROR_INVALID_MIN_OPTIONS_ENABLED.to_string());
            }
        }

        errors
    }

    /// Check how many things were ranked against the limits.
    fn count_violations(&self, num_ranked: usize, errors: &mut Vec<String>) {
        let num_ranked = i32::try_from(num_ranked).unwrap_or(i32::MAX);
        if let Some(min) = self.min_options_to_be_ranked {
            if num_ranked < min {
                errors.push(format!("You must rank at least {min} options."));
            }
        }
        if let Some(max) = self.max_options_to_be_ranked {
            if num_ranked > max {
                errors.push(format!("You can rank at most {max} options."));
            }
        }
    }
}

/// Rank a fixed list of options against each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankOptionsQuestionDetails {
    pub options: Vec<String>,
    #[serde(flatten)]
    pub limits: RankLimits,
}

impl QuestionTypePolicy for RankOptionsQuestionDetails {
    type Response = RankOptionsResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.options.iter().any(|option| option.trim().is_empty()) {
            errors.push(RANK_ERROR_EMPTY_OPTIONS_ENTERED.to_string());
        }
        errors.extend(self.limits.violations(Some(self.options.len())));
        if self.options.len() < RANK_OPTIONS_MIN_NUM_OF_OPTIONS {
            errors.push(format!(
                "{RANK_ERROR_NOT_ENOUGH_OPTIONS}{RANK_OPTIONS_MIN_NUM_OF_OPTIONS}."
            ));
        }

        errors
    }

    fn validate_response_details(
        &self,
        responses: &[&RankOptionsResponseDetails],
        _num_recipients: usize,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        let num_options = i32::try_from(self.options.len()).unwrap_or(i32::MAX);

        for details in responses {
            let ranks = details.filtered_sorted_answers();
            let distinct: HashSet<_> = ranks.iter().collect();

            if distinct.len() < ranks.len() && !self.limits.are_duplicates_allowed {
                errors.push(RANK_ERROR_DUPLICATE_RANK.to_string());
            }
            self.limits.count_violations(ranks.len(), &mut errors);
            if ranks.iter().any(|rank| *rank < 1 || *rank > num_options) {
                errors.push(RANK_ERROR_INVALID_RANK.to_string());
            }
        }

        errors
    }

    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        !same_elements(&self.options, &new_details.options)
            || self.limits.min_options_to_be_ranked != new_details.limits.min_options_to_be_ranked
            || self.limits.max_options_to_be_ranked != new_details.limits.max_options_to_be_ranked
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        false
    }
}

/// Rank the recipients of the question against each other.
/// Each response carries the rank given to one recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRecipientsQuestionDetails {
    #[serde(flatten)]
    pub limits: RankLimits,
}

impl QuestionTypePolicy for RankRecipientsQuestionDetails {
    type Response = RankRecipientsResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        // The number of recipients is only known at submission time.
        self.limits.violations(None)
    }

    fn validate_response_details(
        &self,
        responses: &[&RankRecipientsResponseDetails],
        num_recipients: usize,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        let num_recipients = i32::try_from(num_recipients).unwrap_or(i32::MAX);
        let mut seen = HashSet::with_capacity(responses.len());

        for details in responses {
            let rank = details.answer;
            if !seen.insert(rank) && !self.limits.are_duplicates_allowed {
                errors.push(format!("Duplicate rank {rank}"));
            }
            if rank < 1 || rank > num_recipients {
                errors.push(format!("Invalid rank {rank}"));
            }
        }
        self.limits.count_violations(responses.len(), &mut errors);

        errors
    }

    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        self.limits.min_options_to_be_ranked != new_details.limits.min_options_to_be_ranked
            || self.limits.max_options_to_be_ranked != new_details.limits.max_options_to_be_ranked
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        false
    }
}
