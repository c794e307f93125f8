//! Storage collaborators used by the response logic.
//!
//! Every operation takes the identifiers it needs explicitly; no store keeps
//! state between calls beyond what it persists.

pub mod memory;

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use mongodb::Database;

use crate::{
    error::Result,
    model::{
        comment::{CommentUpdate, FeedbackResponseComment},
        common::{CourseId, QuestionId, ResponseId},
        mongodb::MongoStore,
        question::FeedbackQuestion,
        respondents::RespondentList,
        response::{FeedbackResponse, ResponseFields},
        roster::{CourseRoster, StudentRecord},
    },
};

use self::memory::MemoryStore;

/// Which responses or comments to delete in bulk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionQuery {
    Course(CourseId),
    Session {
        course_id: CourseId,
        session_name: String,
    },
    Question(QuestionId),
    Response(ResponseId),
}

#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn get_response(&self, id: &str) -> Result<Option<FeedbackResponse>>;

    async fn get_response_by_key(
        &self,
        question_id: &str,
        giver: &str,
        recipient: &str,
    ) -> Result<Option<FeedbackResponse>> {
        let id = FeedbackResponse::make_id(question_id, giver, recipient);
        self.get_response(&id).await
    }

    async fn responses_for_question(&self, question_id: &str) -> Result<Vec<FeedbackResponse>>;

    /// Responses of a question whose giver or recipient is in `section`.
    async fn responses_for_question_in_section(
        &self,
        question_id: &str,
        section: &str,
    ) -> Result<Vec<FeedbackResponse>>;

    async fn responses_for_session(
        &self,
        course_id: &str,
        session_name: &str,
    ) -> Result<Vec<FeedbackResponse>>;

    /// Responses of a session whose giver or recipient is in `section`.
    async fn responses_for_session_in_section(
        &self,
        course_id: &str,
        session_name: &str,
        section: &str,
    ) -> Result<Vec<FeedbackResponse>>;

    async fn responses_from_giver_for_question(
        &self,
        question_id: &str,
        giver: &str,
    ) -> Result<Vec<FeedbackResponse>>;

    async fn responses_for_receiver_for_question(
        &self,
        question_id: &str,
        recipient: &str,
    ) -> Result<Vec<FeedbackResponse>>;

    async fn responses_from_giver_for_course(
        &self,
        course_id: &str,
        giver: &str,
    ) -> Result<Vec<FeedbackResponse>>;

    async fn responses_for_receiver_for_course(
        &self,
        course_id: &str,
        recipient: &str,
    ) -> Result<Vec<FeedbackResponse>>;

    /// Fails with [`Error::Conflict`](crate::error::Error::Conflict) if the key is taken.
    async fn create_response(&self, response: &FeedbackResponse) -> Result<()>;

    /// Fails with [`Error::NotFound`](crate::error::Error::NotFound) if there is no such response.
    async fn update_response_fields(
        &self,
        id: &str,
        fields: &ResponseFields,
    ) -> Result<FeedbackResponse>;

    /// Deleting a missing response succeeds.
    async fn delete_response(&self, id: &str) -> Result<()>;

    async fn delete_responses(&self, query: &DeletionQuery) -> Result<()>;

    async fn has_responses_from_giver_in_session(
        &self,
        course_id: &str,
        session_name: &str,
        giver: &str,
    ) -> Result<bool>;

    async fn has_responses_for_question(&self, question_id: &str) -> Result<bool>;

    async fn has_responses_for_course(&self, course_id: &str) -> Result<bool>;

    /// Every giver with at least one response in the session.
    async fn giver_set_that_answered_session(
        &self,
        course_id: &str,
        session_name: &str,
    ) -> Result<HashSet<String>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn comments_for_response(&self, response_id: &str) -> Result<Vec<FeedbackResponseComment>>;

    async fn update_comment(
        &self,
        comment: &FeedbackResponseComment,
        update: &CommentUpdate,
    ) -> Result<()>;

    /// Replace `old_email` as comment giver and as last editor across a course.
    async fn update_comment_emails(
        &self,
        course_id: &str,
        old_email: &str,
        new_email: &str,
    ) -> Result<()>;

    async fn delete_comments(&self, query: &DeletionQuery) -> Result<()>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn get_question(&self, id: &str) -> Result<Option<FeedbackQuestion>>;

    /// Fails with [`Error::NotFound`](crate::error::Error::NotFound) if there is no such question.
    async fn update_question(&self, question: &FeedbackQuestion) -> Result<()>;
}

#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn students_for_team(&self, course_id: &str, team: &str) -> Result<Vec<StudentRecord>>;

    async fn roster_snapshot(&self, course_id: &str) -> Result<CourseRoster>;
}

/// Removal fails with [`Error::NotFound`](crate::error::Error::NotFound) if the
/// session does not exist, and is a no-op for absent members.
#[async_trait]
pub trait RespondentStore: Send + Sync {
    async fn add_student_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()>;

    async fn add_instructor_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()>;

    async fn remove_student_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()>;

    async fn remove_instructor_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()>;

    async fn remove_student_from_all_sessions(&self, course_id: &str, email: &str) -> Result<()>;

    async fn remove_instructor_from_all_sessions(&self, course_id: &str, email: &str)
        -> Result<()>;

    async fn respondents(&self, course_id: &str, session_name: &str)
        -> Result<Option<RespondentList>>;
}

/// Handles on every store, shared by the logic services.
#[derive(Clone)]
pub struct Datastore {
    pub responses: Arc<dyn ResponseStore>,
    pub comments: Arc<dyn CommentStore>,
    pub questions: Arc<dyn QuestionStore>,
    pub roster: Arc<dyn RosterSource>,
    pub respondents: Arc<dyn RespondentStore>,
}

impl Datastore {
    /// Every store backed by the same in-memory maps.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            responses: store.clone(),
            comments: store.clone(),
            questions: store.clone(),
            roster: store.clone(),
            respondents: store,
        }
    }

    /// Every store backed by collections of the given database.
    pub fn mongodb(db: &Database) -> Self {
        let store = Arc::new(MongoStore::new(db));
        Self {
            responses: store.clone(),
            comments: store.clone(),
            questions: store.clone(),
            roster: store.clone(),
            respondents: store,
        }
    }
}
