use serde::{Deserialize, Serialize};

use crate::model::{
    common::FeedbackParticipantType,
    question::{FeedbackQuestion, QuestionTypePolicy},
    response::ContributionResponseDetails,
};

pub const CONTRIB_MIN_POINTS: i32 = 0;
pub const CONTRIB_MAX_POINTS: i32 = 200;
pub const CONTRIB_POINTS_STEP: i32 = 10;
/// Answer meaning the giver could not judge the contribution.
pub const CONTRIB_NOT_SURE: i32 = -101;
pub const CONTRIB_ERROR_INVALID_OPTION: &str = "Invalid option for the Team contribution question.";
pub const CONTRIB_ERROR_INVALID_FEEDBACK_PATH: &str = "Team contribution question can only be used \
with Students in this course as giver and Giver's team members and Giver as recipient.";
pub const CONTRIB_ERROR_INVALID_VISIBILITY_OPTIONS: &str = "Team contribution question responses \
shown to the receiver must also be shown to the receiver's and the giver's team members.";

/// Estimated share of a team's work, on a scale where 100 is an equal share.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionQuestionDetails {
    #[serde(default)]
    pub is_not_sure_allowed: bool,
}

impl ContributionQuestionDetails {
    fn is_valid_answer(&self, answer: i32) -> bool {
        if answer == CONTRIB_NOT_SURE {
            return self.is_not_sure_allowed;
        }
        (CONTRIB_MIN_POINTS..=CONTRIB_MAX_POINTS).contains(&answer)
            && answer % CONTRIB_POINTS_STEP == 0
    }
}

impl QuestionTypePolicy for ContributionQuestionDetails {
    type Response = ContributionResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        Vec::new()
    }

    fn validate_response_details(
        &self,
        responses: &[&ContributionResponseDetails],
        _num_recipients: usize,
    ) -> Vec<String> {
        responses
            .iter()
            .filter(|details| !self.is_valid_answer(details.answer))
            .map(|_| CONTRIB_ERROR_INVALID_OPTION.to_string())
            .collect()
    }

    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        self.is_not_sure_allowed != new_details.is_not_sure_allowed
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        false
    }

    fn validate_giver_recipient_visibility(&self, question: &FeedbackQuestion) -> Option<String> {
        use FeedbackParticipantType::{
            OwnTeamMembers, OwnTeamMembersIncludingSelf, Receiver, ReceiverTeamMembers, Students,
        };

        if question.giver_type != Students || question.recipient_type != OwnTeamMembersIncludingSelf
        {
            return Some(CONTRIB_ERROR_INVALID_FEEDBACK_PATH.to_string());
        }

        if question.is_response_visible_to(Receiver)
            && !(question.is_response_visible_to(ReceiverTeamMembers)
                && question.is_response_visible_to(OwnTeamMembers))
        {
            return Some(CONTRIB_ERROR_INVALID_VISIBILITY_OPTIONS.to_string());
        }

        None
    }
}
