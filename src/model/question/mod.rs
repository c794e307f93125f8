pub mod constsum;
pub mod contribution;
pub mod mcq;
pub mod msq;
pub mod numscale;
pub mod rank;
pub mod rubric;
pub mod text;

use serde::{Deserialize, Serialize};

pub use constsum::{
    ConstSumOptionsQuestionDetails, ConstSumRecipientsQuestionDetails, DistributionRule,
    PointBudget,
};
pub use contribution::ContributionQuestionDetails;
pub use mcq::McqQuestionDetails;
pub use msq::MsqQuestionDetails;
pub use numscale::NumericalScaleQuestionDetails;
pub use rank::{RankLimits, RankOptionsQuestionDetails, RankRecipientsQuestionDetails};
pub use rubric::RubricQuestionDetails;
pub use text::TextQuestionDetails;

use crate::model::{
    common::{CourseId, FeedbackParticipantType, QuestionId},
    response::ResponseDetails,
};

/// Rules specific to one type of question.
pub trait QuestionTypePolicy {
    /// The answer shape this type of question accepts.
    type Response;

    /// Every problem with the question's own configuration.
    fn validate_question_details(&self) -> Vec<String>;

    /// Every problem with a batch of answers from one giver.
    ///
    /// `num_recipients` is how many recipients the giver answered for.
    fn validate_response_details(
        &self,
        responses: &[&Self::Response],
        num_recipients: usize,
    ) -> Vec<String>;

    /// Would existing answers become meaningless if the details changed to `new_details`?
    fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool;

    fn is_participant_comments_on_responses_allowed(&self) -> bool;

    /// Constraints this type puts on who answers about whom and who sees the answers.
    fn validate_giver_recipient_visibility(&self, _question: &FeedbackQuestion) -> Option<String> {
        None
    }
}

/// Type-specific configuration of a question, tagged by its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "questionType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionDetails {
    Mcq(McqQuestionDetails),
    Msq(MsqQuestionDetails),
    RankOptions(RankOptionsQuestionDetails),
    RankRecipients(RankRecipientsQuestionDetails),
    #[serde(rename = "CONSTSUM_OPTIONS")]
    ConstSumOptions(ConstSumOptionsQuestionDetails),
    #[serde(rename = "CONSTSUM_RECIPIENTS")]
    ConstSumRecipients(ConstSumRecipientsQuestionDetails),
    #[serde(rename = "CONTRIB")]
    Contribution(ContributionQuestionDetails),
    Rubric(RubricQuestionDetails),
    #[serde(rename = "NUMSCALE")]
    NumericalScale(NumericalScaleQuestionDetails),
    Text(TextQuestionDetails),
}

/// Apply the same expression to whichever details a `QuestionDetails` holds.
macro_rules! for_each_type {
    ($details:expr, $inner:ident => $body:expr) => {
        match $details {
            QuestionDetails::Mcq($inner) => $body,
            QuestionDetails::Msq($inner) => $body,
            QuestionDetails::RankOptions($inner) => $body,
            QuestionDetails::RankRecipients($inner) => $body,
            QuestionDetails::ConstSumOptions($inner) => $body,
            QuestionDetails::ConstSumRecipients($inner) => $body,
            QuestionDetails::Contribution($inner) => $body,
            QuestionDetails::Rubric($inner) => $body,
            QuestionDetails::NumericalScale($inner) => $body,
            QuestionDetails::Text($inner) => $body,
        }
    };
}

impl QuestionDetails {
    /// The stored type tag.
    pub fn question_type(&self) -> &'static str {
        match self {
            Self::Mcq(_) => "MCQ",
            Self::Msq(_) => "MSQ",
            Self::RankOptions(_) => "RANK_OPTIONS",
            Self::RankRecipients(_) => "RANK_RECIPIENTS",
            Self::ConstSumOptions(_) => "CONSTSUM_OPTIONS",
            Self::ConstSumRecipients(_) => "CONSTSUM_RECIPIENTS",
            Self::Contribution(_) => "CONTRIB",
            Self::Rubric(_) => "RUBRIC",
            Self::NumericalScale(_) => "NUMSCALE",
            Self::Text(_) => "TEXT",
        }
    }

    pub fn validate_question_details(&self) -> Vec<String> {
        for_each_type!(self, details => details.validate_question_details())
    }

    /// Validate answers against these details.
    /// An answer of a different question type is reported as a violation.
    pub fn validate_response_details(
        &self,
        responses: &[ResponseDetails],
        num_recipients: usize,
    ) -> Vec<String> {
        let question_type = self.question_type();
        macro_rules! typed {
            ($details:expr, $variant:ident) => {{
                let mut errors = Vec::new();
                let mut matching = Vec::with_capacity(responses.len());
                for response in responses {
                    match response {
                        ResponseDetails::$variant(answer) => matching.push(answer),
                        other => errors.push(format!(
                            "A {} response cannot answer a {} question.",
                            other.question_type(),
                            question_type
                        )),
                    }
                }
                errors.extend($details.validate_response_details(&matching, num_recipients));
                errors
            }};
        }

        match self {
            Self::Mcq(details) => typed!(details, Mcq),
            Self::Msq(details) => typed!(details, Msq),
            Self::RankOptions(details) => typed!(details, RankOptions),
            Self::RankRecipients(details) => typed!(details, RankRecipients),
            Self::ConstSumOptions(details) => typed!(details, ConstSumOptions),
            Self::ConstSumRecipients(details) => typed!(details, ConstSumRecipients),
            Self::Contribution(details) => typed!(details, Contribution),
            Self::Rubric(details) => typed!(details, Rubric),
            Self::NumericalScale(details) => typed!(details, NumericalScale),
            Self::Text(details) => typed!(details, Text),
        }
    }

    /// Changing to another question type always invalidates existing answers.
    pub fn should_changes_require_response_deletion(&self, new_details: &Self) -> bool {
        match (self, new_details) {
            (Self::Mcq(old), Self::Mcq(new)) => old.should_changes_require_response_deletion(new),
            (Self::Msq(old), Self::Msq(new)) => old.should_changes_require_response_deletion(new),
            (Self::RankOptions(old), Self::RankOptions(new)) => {
                old.should_changes_require_response_deletion(new)
            }
            (Self::RankRecipients(old), Self::RankRecipients(new)) => {
                old.should_changes_require_response_deletion(new)
            }
            (Self::ConstSumOptions(old), Self::ConstSumOptions(new)) => {
                old.should_changes_require_response_deletion(new)
            }
            (Self::ConstSumRecipients(old), Self::ConstSumRecipients(new)) => {
                old.should_changes_require_response_deletion(new)
            }
            (Self::Contribution(old), Self::Contribution(new)) => {
                old.should_changes_require_response_deletion(new)
            }
            (Self::Rubric(old), Self::Rubric(new)) => {
                old.should_changes_require_response_deletion(new)
            }
            (Self::NumericalScale(old), Self::NumericalScale(new)) => {
                old.should_changes_require_response_deletion(new)
            }
            (Self::Text(old), Self::Text(new)) => old.should_changes_require_response_deletion(new),
            _ => true,
        }
    }

    pub fn is_participant_comments_on_responses_allowed(&self) -> bool {
        for_each_type!(self, details => details.is_participant_comments_on_responses_allowed())
    }

    pub fn validate_giver_recipient_visibility(&self, question: &FeedbackQuestion) -> Option<String> {
        for_each_type!(self, details => details.validate_giver_recipient_visibility(question))
    }
}

/// A question of a feedback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuestion {
    #[serde(rename = "_id")]
    pub id: QuestionId,
    pub course_id: CourseId,
    pub session_name: String,
    pub question_number: u32,
    pub giver_type: FeedbackParticipantType,
    pub recipient_type: FeedbackParticipantType,
    /// Who may see the responses at all.
    pub show_responses_to: Vec<FeedbackParticipantType>,
    pub show_giver_name_to: Vec<FeedbackParticipantType>,
    pub show_recipient_name_to: Vec<FeedbackParticipantType>,
    pub details: QuestionDetails,
}

impl FeedbackQuestion {
    pub fn is_response_visible_to(&self, category: FeedbackParticipantType) -> bool {
        self.show_responses_to.contains(&category)
    }

    /// Are the recipients the giver's own team members?
    pub fn is_recipient_type_team_members(&self) -> bool {
        self.recipient_type.is_team_members()
    }

    /// Every problem with this question, from its feedback path, its
    /// visibility lists and its type-specific details.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.details.validate_question_details();

        if !self.giver_type.is_valid_giver() {
            errors.push(format!("{} is not a valid feedback giver.", self.giver_type));
        }
        if !self.recipient_type.is_valid_recipient() {
            errors.push(format!(
                "{} is not a valid feedback recipient.",
                self.recipient_type
            ));
        }
        if self.giver_type == FeedbackParticipantType::Teams && self.is_recipient_type_team_members() {
            errors.push(format!(
                "The feedback recipients cannot be \"{}\" when the feedback giver is \"{}\". \
                 Choose some other feedback recipients.",
                self.recipient_type, self.giver_type
            ));
        }

        for category in self
            .show_responses_to
            .iter()
            .chain(&self.show_giver_name_to)
            .chain(&self.show_recipient_name_to)
        {
            if !category.is_valid_visibility_category() {
                errors.push(format!("{category} is not a valid feedback visibility type."));
            }
        }
        for category in &self.show_giver_name_to {
            if !self.is_response_visible_to(*category) {
                errors.push(format!(
                    "Trying to show giver name to {category} without showing response first."
                ));
            }
        }
        for category in &self.show_recipient_name_to {
            if !self.is_response_visible_to(*category) {
                errors.push(format!(
                    "Trying to show recipient name to {category} without showing response first."
                ));
            }
        }

        errors.extend(self.details.validate_giver_recipient_visibility(self));
        errors
    }
}

/// Example test data.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl FeedbackQuestion {
        /// Students answer about other students; receivers see the answer, instructors see everything.
        pub fn example() -> Self {
            use FeedbackParticipantType::*;

            Self {
                id: "q1".to_string(),
                course_id: "CS101".to_string(),
                session_name: "Midterm feedback".to_string(),
                question_number: 1,
                giver_type: Students,
                recipient_type: Students,
                show_responses_to: vec![Receiver, Instructors],
                show_giver_name_to: vec![Instructors],
                show_recipient_name_to: vec![Receiver, Instructors],
                details: QuestionDetails::Text(TextQuestionDetails::default()),
            }
        }
    }
}
