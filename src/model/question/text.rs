use serde::{Deserialize, Serialize};

use crate::model::{question::QuestionTypePolicy, response::TextResponseDetails};

pub const TEXT_ERROR_INVALID_RECOMMENDED_LENGTH: &str =
    "Recommended length for a text question must be a positive number.";

/// Free-form essay question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextQuestionDetails {
    /// Suggested word count, shown as a hint only.
    #[serde(default)]
    pub recommended_length: Option<i32>,
    #[serde(default)]
    pub should_allow_rich_text: bool,
}

impl QuestionTypePolicy for TextQuestionDetails {
    type Response = TextResponseDetails;

    fn validate_question_details(&self) -> Vec<String> {
        match self.recommended_length {
            Some(length) if length <= 0 => vec![TEXT_ERROR_INVALID_RECOMMENDED_LENGTH.to_string()],
            _ => Vec::new(),
        }
    }

    fn validate_response_details(
        &self,
        _responses: &[&TextResponseDetails],
        _num_recipients: usize,
    ) -> Vec<String> {
        Vec::new()
    }

    fn should_changes_require_response_deletion(&self, _new_details: &Self) -> bool {
        false
    }

    fn is_participant_comments_on_responses_allowed(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommended_length_is_positive() {
        let mut details = TextQuestionDetails::default();
        assert!(details.validate_question_details().is_empty());
        details.recommended_length = Some(0);
        assert_eq!(details.validate_question_details().len(), 1);
        details.recommended_length = Some(150);
        assert!(details.validate_question_details().is_empty());
    }
}
