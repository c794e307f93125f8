use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::{Error, Result},
    model::{
        comment::{CommentUpdate, FeedbackResponseComment},
        common::{CourseId, QuestionId, ResponseId},
        mongodb::Id,
        question::FeedbackQuestion,
        respondents::RespondentList,
        response::{FeedbackResponse, ResponseFields},
        roster::{CourseRoster, InstructorRecord, StudentRecord},
    },
};

use super::{
    CommentStore, DeletionQuery, QuestionStore, RespondentStore, ResponseStore, RosterSource,
};

#[derive(Debug, Default)]
struct MemoryData {
    responses: BTreeMap<ResponseId, FeedbackResponse>,
    comments: BTreeMap<Id, FeedbackResponseComment>,
    questions: BTreeMap<QuestionId, FeedbackQuestion>,
    students: Vec<StudentRecord>,
    instructors: Vec<InstructorRecord>,
    sessions: BTreeMap<(CourseId, String), RespondentList>,
    /// Responses whose comments refuse to be updated.
    broken_comment_updates: HashSet<ResponseId>,
}

impl MemoryData {
    fn responses_where(&self, pred: impl Fn(&FeedbackResponse) -> bool) -> Vec<FeedbackResponse> {
        self.responses
            .values()
            .filter(|response| pred(response))
            .cloned()
            .collect()
    }

    fn session_mut(&mut self, course_id: &str, session_name: &str) -> Result<&mut RespondentList> {
        self.sessions
            .get_mut(&(course_id.to_string(), session_name.to_string()))
            .ok_or_else(|| Error::not_found(format!("session {session_name} of course {course_id}")))
    }
}

fn matches_query(
    query: &DeletionQuery,
    course_id: &str,
    session_name: &str,
    question_id: &str,
    response_id: &str,
) -> bool {
    match query {
        DeletionQuery::Course(course) => course == course_id,
        DeletionQuery::Session {
            course_id: course,
            session_name: session,
        } => course == course_id && session == session_name,
        DeletionQuery::Question(question) => question == question_id,
        DeletionQuery::Response(response) => response == response_id,
    }
}

/// Every store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_question(&self, question: FeedbackQuestion) {
        let mut data = self.data.lock().await;
        data.questions.insert(question.id.clone(), question);
    }

    /// Insert or replace a response, bypassing the key check.
    pub async fn insert_response(&self, response: FeedbackResponse) {
        let mut data = self.data.lock().await;
        data.responses.insert(response.id.clone(), response);
    }

    pub async fn insert_comment(&self, comment: FeedbackResponseComment) {
        let mut data = self.data.lock().await;
        data.comments.insert(comment.id, comment);
    }

    /// Add a student, replacing any record with the same course and email.
    pub async fn upsert_student(&self, student: StudentRecord) {
        let mut data = self.data.lock().await;
        data.students
            .retain(|s| !(s.course_id == student.course_id && s.email == student.email));
        data.students.push(student);
    }

    pub async fn remove_student(&self, course_id: &str, email: &str) {
        let mut data = self.data.lock().await;
        data.students
            .retain(|s| !(s.course_id == course_id && s.email == email));
    }

    pub async fn insert_instructor(&self, instructor: InstructorRecord) {
        let mut data = self.data.lock().await;
        data.instructors.push(instructor);
    }

    pub async fn insert_session(&self, respondents: RespondentList) {
        let mut data = self.data.lock().await;
        let key = (respondents.course_id.clone(), respondents.session_name.clone());
        data.sessions.insert(key, respondents);
    }

    /// All responses, ordered by ID.
    pub async fn all_responses(&self) -> Vec<FeedbackResponse> {
        self.data.lock().await.responses.values().cloned().collect()
    }

    pub async fn all_comments(&self) -> Vec<FeedbackResponseComment> {
        self.data.lock().await.comments.values().cloned().collect()
    }

    #[cfg(test)]
    pub async fn break_comment_updates_for(&self, response_id: &str) {
        let mut data = self.data.lock().await;
        data.broken_comment_updates.insert(response_id.to_string());
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn get_response(&self, id: &str) -> Result<Option<FeedbackResponse>> {
        Ok(self.data.lock().await.responses.get(id).cloned())
    }

    async fn responses_for_question(&self, question_id: &str) -> Result<Vec<FeedbackResponse>> {
        let data = self.data.lock().await;
        Ok(data.responses_where(|r| r.question_id == question_id))
    }

    async fn responses_for_question_in_section(
        &self,
        question_id: &str,
        section: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        let data = self.data.lock().await;
        Ok(data.responses_where(|r| {
            r.question_id == question_id
                && (r.giver_section == section || r.recipient_section == section)
        }))
    }

    async fn responses_for_session(
        &self,
        course_id: &str,
        session_name: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        let data = self.data.lock().await;
        Ok(data.responses_where(|r| r.course_id == course_id && r.session_name == session_name))
    }

    async fn responses_for_session_in_section(
        &self,
        course_id: &str,
        session_name: &str,
        section: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        let data = self.data.lock().await;
        Ok(data.responses_where(|r| {
            r.course_id == course_id
                && r.session_name == session_name
                && (r.giver_section == section || r.recipient_section == section)
        }))
    }

    async fn responses_from_giver_for_question(
        &self,
        question_id: &str,
        giver: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        let data = self.data.lock().await;
        Ok(data.responses_where(|r| r.question_id == question_id && r.giver == giver))
    }

    async fn responses_for_receiver_for_question(
        &self,
        question_id: &str,
        recipient: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        let data = self.data.lock().await;
        Ok(data.responses_where(|r| r.question_id == question_id && r.recipient == recipient))
    }

    async fn responses_from_giver_for_course(
        &self,
        course_id: &str,
        giver: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        let data = self.data.lock().await;
        Ok(data.responses_where(|r| r.course_id == course_id && r.giver == giver))
    }

    async fn responses_for_receiver_for_course(
        &self,
        course_id: &str,
        recipient: &str,
    ) -> Result<Vec<FeedbackResponse>> {
        let data = self.data.lock().await;
        Ok(data.responses_where(|r| r.course_id == course_id && r.recipient == recipient))
    }

    async fn create_response(&self, response: &FeedbackResponse) -> Result<()> {
        let mut data = self.data.lock().await;
        if data.responses.contains_key(&response.id) {
            return Err(Error::Conflict(format!("response {}", response.id)));
        }
        data.responses.insert(response.id.clone(), response.clone());
        Ok(())
    }

    async fn update_response_fields(
        &self,
        id: &str,
        fields: &ResponseFields,
    ) -> Result<FeedbackResponse> {
        let mut data = self.data.lock().await;
        let response = data
            .responses
            .get_mut(id)
            .ok_or_else(|| Error::not_found(format!("response {id}")))?;
        fields.apply_to(response);
        Ok(response.clone())
    }

    async fn delete_response(&self, id: &str) -> Result<()> {
        self.data.lock().await.responses.remove(id);
        Ok(())
    }

    async fn delete_responses(&self, query: &DeletionQuery) -> Result<()> {
        let mut data = self.data.lock().await;
        data.responses.retain(|_, r| {
            !matches_query(query, &r.course_id, &r.session_name, &r.question_id, &r.id)
        });
        Ok(())
    }

    async fn has_responses_from_giver_in_session(
        &self,
        course_id: &str,
        session_name: &str,
        giver: &str,
    ) -> Result<bool> {
        let data = self.data.lock().await;
        Ok(data.responses.values().any(|r| {
            r.course_id == course_id && r.session_name == session_name && r.giver == giver
        }))
    }

    async fn has_responses_for_question(&self, question_id: &str) -> Result<bool> {
        let data = self.data.lock().await;
        Ok(data.responses.values().any(|r| r.question_id == question_id))
    }

    async fn has_responses_for_course(&self, course_id: &str) -> Result<bool> {
        let data = self.data.lock().await;
        Ok(data.responses.values().any(|r| r.course_id == course_id))
    }

    async fn giver_set_that_answered_session(
        &self,
        course_id: &str,
        session_name: &str,
    ) -> Result<HashSet<String>> {
        let data = self.data.lock().await;
        Ok(data
            .responses
            .values()
            .filter(|r| r.course_id == course_id && r.session_name == session_name)
            .map(|r| r.giver.clone())
            .collect())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn comments_for_response(&self, response_id: &str) -> Result<Vec<FeedbackResponseComment>> {
        let data = self.data.lock().await;
        Ok(data
            .comments
            .values()
            .filter(|c| c.response_id == response_id)
            .cloned()
            .collect())
    }

    async fn update_comment(
        &self,
        comment: &FeedbackResponseComment,
        update: &CommentUpdate,
    ) -> Result<()> {
        let mut data = self.data.lock().await;
        if data.broken_comment_updates.contains(&comment.response_id) {
            return Err(Error::not_found(format!("comment {}", comment.id.to_hex())));
        }
        let stored = data
            .comments
            .get_mut(&comment.id)
            .ok_or_else(|| Error::not_found(format!("comment {}", comment.id.to_hex())))?;
        update.apply_to(stored);
        Ok(())
    }

    async fn update_comment_emails(
        &self,
        course_id: &str,
        old_email: &str,
        new_email: &str,
    ) -> Result<()> {
        let mut data = self.data.lock().await;
        for comment in data.comments.values_mut() {
            if comment.course_id != course_id {
                continue;
            }
            if comment.comment_giver == old_email {
                comment.comment_giver = new_email.to_string();
            }
            if comment.last_editor == old_email {
                comment.last_editor = new_email.to_string();
            }
        }
        Ok(())
    }

    async fn delete_comments(&self, query: &DeletionQuery) -> Result<()> {
        let mut data = self.data.lock().await;
        data.comments.retain(|_, c| {
            !matches_query(
                query,
                &c.course_id,
                &c.session_name,
                &c.question_id,
                &c.response_id,
            )
        });
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn get_question(&self, id: &str) -> Result<Option<FeedbackQuestion>> {
        Ok(self.data.lock().await.questions.get(id).cloned())
    }

    async fn update_question(&self, question: &FeedbackQuestion) -> Result<()> {
        let mut data = self.data.lock().await;
        let stored = data
            .questions
            .get_mut(&question.id)
            .ok_or_else(|| Error::not_found(format!("question {}", question.id)))?;
        *stored = question.clone();
        Ok(())
    }
}

#[async_trait]
impl RosterSource for MemoryStore {
    async fn students_for_team(&self, course_id: &str, team: &str) -> Result<Vec<StudentRecord>> {
        let data = self.data.lock().await;
        Ok(data
            .students
            .iter()
            .filter(|s| s.course_id == course_id && s.team == team)
            .cloned()
            .collect())
    }

    async fn roster_snapshot(&self, course_id: &str) -> Result<CourseRoster> {
        let data = self.data.lock().await;
        let students = data
            .students
            .iter()
            .filter(|s| s.course_id == course_id)
            .cloned()
            .collect();
        let instructors = data
            .instructors
            .iter()
            .filter(|i| i.course_id == course_id)
            .cloned()
            .collect();
        Ok(CourseRoster::new(students, instructors))
    }
}

#[async_trait]
impl RespondentStore for MemoryStore {
    async fn add_student_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()> {
        let mut data = self.data.lock().await;
        let session = data.session_mut(course_id, session_name)?;
        session.student_emails.insert(email.to_string());
        Ok(())
    }

    async fn add_instructor_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()> {
        let mut data = self.data.lock().await;
        let session = data.session_mut(course_id, session_name)?;
        session.instructor_emails.insert(email.to_string());
        Ok(())
    }

    async fn remove_student_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()> {
        let mut data = self.data.lock().await;
        let session = data.session_mut(course_id, session_name)?;
        session.student_emails.remove(email);
        Ok(())
    }

    async fn remove_instructor_respondent(
        &self,
        course_id: &str,
        session_name: &str,
        email: &str,
    ) -> Result<()> {
        let mut data = self.data.lock().await;
        let session = data.session_mut(course_id, session_name)?;
        session.instructor_emails.remove(email);
        Ok(())
    }

    async fn remove_student_from_all_sessions(&self, course_id: &str, email: &str) -> Result<()> {
        let mut data = self.data.lock().await;
        for session in data.sessions.values_mut().filter(|s| s.course_id == course_id) {
            session.student_emails.remove(email);
        }
        Ok(())
    }

    async fn remove_instructor_from_all_sessions(
        &self,
        course_id: &str,
        email: &str,
    ) -> Result<()> {
        let mut data = self.data.lock().await;
        for session in data.sessions.values_mut().filter(|s| s.course_id == course_id) {
            session.instructor_emails.remove(email);
        }
        Ok(())
    }

    async fn respondents(
        &self,
        course_id: &str,
        session_name: &str,
    ) -> Result<Option<RespondentList>> {
        let data = self.data.lock().await;
        Ok(data
            .sessions
            .get(&(course_id.to_string(), session_name.to_string()))
            .cloned())
    }
}
