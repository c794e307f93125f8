use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{CourseId, QuestionId, ResponseId},
    mongodb::Id,
    response::FeedbackResponse,
};

/// A comment attached to a single response.
///
/// The sections are copies of the parent response's sections and must be
/// kept in step with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponseComment {
    #[serde(rename = "_id")]
    pub id: Id,
    pub course_id: CourseId,
    pub session_name: String,
    pub question_id: QuestionId,
    pub response_id: ResponseId,
    pub comment_giver: String,
    pub last_editor: String,
    pub giver_section: String,
    pub receiver_section: String,
    pub comment_text: String,
    /// Left by the response's giver or recipient rather than by an instructor.
    #[serde(default)]
    pub is_comment_from_feedback_participant: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl FeedbackResponseComment {
    pub fn new(
        response: &FeedbackResponse,
        comment_giver: impl Into<String>,
        comment_text: impl Into<String>,
    ) -> Self {
        let comment_giver = comment_giver.into();
        Self {
            id: Id::new(),
            course_id: response.course_id.clone(),
            session_name: response.session_name.clone(),
            question_id: response.question_id.clone(),
            response_id: response.id.clone(),
            last_editor: comment_giver.clone(),
            comment_giver,
            giver_section: response.giver_section.clone(),
            receiver_section: response.recipient_section.clone(),
            comment_text: comment_text.into(),
            is_comment_from_feedback_participant: false,
            updated_at: Utc::now(),
        }
    }
}

/// Changes to a comment's copy of its parent response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentUpdate {
    pub response_id: Option<ResponseId>,
    pub giver_section: Option<String>,
    pub receiver_section: Option<String>,
}

impl CommentUpdate {
    /// The update that brings a comment in line with `response`.
    pub fn following(response: &FeedbackResponse) -> Self {
        Self {
            response_id: Some(response.id.clone()),
            giver_section: Some(response.giver_section.clone()),
            receiver_section: Some(response.recipient_section.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.response_id.is_none() && self.giver_section.is_none() && self.receiver_section.is_none()
    }

    pub fn apply_to(&self, comment: &mut FeedbackResponseComment) {
        if let Some(response_id) = &self.response_id {
            comment.response_id = response_id.clone();
        }
        if let Some(section) = &self.giver_section {
            comment.giver_section = section.clone();
        }
        if let Some(section) = &self.receiver_section {
            comment.receiver_section = section.clone();
        }
        comment.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{question::FeedbackQuestion, response::ResponseUpdate};

    #[test]
    fn comment_copies_response_sections() {
        let question = FeedbackQuestion::example();
        let response = FeedbackResponse::example(&question, "alice@uni.edu", "bob@uni.edu");
        let comment = FeedbackResponseComment::new(&response, "prof@uni.edu", "Well argued");
        assert_eq!(comment.response_id, response.id);
        assert_eq!(comment.giver_section, response.giver_section);
        assert_eq!(comment.receiver_section, response.recipient_section);
        assert_eq!(comment.last_editor, "prof@uni.edu");
    }

    #[test]
    fn following_a_moved_response() {
        let question = FeedbackQuestion::example();
        let response = FeedbackResponse::example(&question, "alice@uni.edu", "bob@uni.edu");
        let mut comment = FeedbackResponseComment::new(&response, "prof@uni.edu", "Well argued");

        let moved = ResponseUpdate::new()
            .with_recipient("bob@new.edu")
            .with_recipient_section("Section 2")
            .applied_to(&response);
        CommentUpdate::following(&moved).apply_to(&mut comment);
        assert_eq!(comment.response_id, moved.id);
        assert_eq!(comment.receiver_section, "Section 2");
    }
}
