//! Keeping responses, comments and respondent lists in line with the roster.
//!
//! Every step of a cascade stands alone: a response that cannot be fixed is
//! logged and skipped, and re-running a cascade is safe. Respondent lists are
//! re-checked last, once every deletion of the batch has been made.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::{
    error::{Error, Result},
    logic::responses::ResponsesLogic,
    model::{
        comment::CommentUpdate,
        common::FeedbackParticipantType,
        question::{FeedbackQuestion, QuestionDetails},
        response::{FeedbackResponse, ResponseFields, ResponseUpdate},
        store::Datastore,
    },
};

/// Per-session givers whose respondent-list membership must be re-checked.
#[derive(Debug, Default)]
struct RespondentUpdates {
    students: BTreeMap<String, BTreeSet<String>>,
    instructors: BTreeMap<String, BTreeSet<String>>,
}

impl RespondentUpdates {
    fn add_student(&mut self, response: &FeedbackResponse) {
        self.students
            .entry(response.session_name.clone())
            .or_default()
            .insert(response.giver.clone());
    }

    fn add_instructor(&mut self, response: &FeedbackResponse) {
        self.instructors
            .entry(response.session_name.clone())
            .or_default()
            .insert(response.giver.clone());
    }

    /// Record the giver of a deleted response, if its question's givers are tracked.
    fn add_giver(&mut self, question: &FeedbackQuestion, response: &FeedbackResponse) {
        match question.giver_type {
            FeedbackParticipantType::Students => self.add_student(response),
            FeedbackParticipantType::Instructors | FeedbackParticipantType::Myself => {
                self.add_instructor(response)
            }
            _ => {}
        }
    }

    async fn apply(self, logic: &ResponsesLogic, course_id: &str) {
        for (session_name, emails) in &self.students {
            logic
                .remove_students_from_respondents_if_necessary(course_id, session_name, emails)
                .await;
        }
        for (session_name, emails) in &self.instructors {
            logic
                .remove_instructors_from_respondents_if_necessary(course_id, session_name, emails)
                .await;
        }
    }
}

/// What a cascade did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub deleted: usize,
    pub updated: usize,
    /// Responses left as they were because a step failed.
    pub skipped: usize,
}

impl CascadeSummary {
    /// Count the outcome of one deletion attempt, logging a failure.
    /// `Ok(None)` means the response was kept on purpose.
    fn record_deletion<T>(
        &mut self,
        response: &FeedbackResponse,
        result: Result<Option<T>>,
    ) -> Option<T> {
        match result {
            Ok(Some(deleted)) => {
                self.deleted += 1;
                Some(deleted)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Skipping deletion of response {}: {e}", response.id);
                self.skipped += 1;
                None
            }
        }
    }
}

impl fmt::Display for CascadeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deleted, {} updated, {} skipped",
            self.deleted, self.updated, self.skipped
        )
    }
}

/// Applies the effects of roster changes to stored feedback.
#[derive(Clone)]
pub struct ConsistencyCoordinator {
    store: Datastore,
    logic: ResponsesLogic,
}

impl ConsistencyCoordinator {
    pub fn new(store: Datastore) -> Self {
        Self {
            logic: ResponsesLogic::new(store.clone()),
            store,
        }
    }

    async fn question_of(&self, response: &FeedbackResponse) -> Result<FeedbackQuestion> {
        self.store
            .questions
            .get_question(&response.question_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("question {}", response.question_id)))
    }

    /// Delete `response` with its comments if `should_delete` holds for its question.
    ///
    /// Returns the question when the response was deleted.
    async fn delete_if(
        &self,
        response: &FeedbackResponse,
        should_delete: impl FnOnce(&FeedbackQuestion) -> bool,
    ) -> Result<Option<FeedbackQuestion>> {
        let question = self.question_of(response).await?;
        if !should_delete(&question) {
            return Ok(None);
        }
        self.logic.delete_response_cascade(&response.id).await?;
        Ok(Some(question))
    }

    /// Drop the responses a student's move out of `old_team` invalidates.
    ///
    /// Team answers and answers about team members go. If nobody is left in
    /// `old_team`, everything given by or to the team itself goes too.
    pub async fn update_responses_for_changing_team(
        &self,
        course_id: &str,
        email: &str,
        old_team: &str,
        new_team: &str,
    ) -> Result<CascadeSummary> {
        debug!("Moving {email} of course {course_id} from team {old_team} to {new_team}");
        let mut summary = CascadeSummary::default();
        let mut updates = RespondentUpdates::default();

        for response in self
            .store
            .responses
            .responses_from_giver_for_course(course_id, email)
            .await?
        {
            let result = self
                .delete_if(&response, |question| {
                    question.giver_type == FeedbackParticipantType::Teams
                        || question.is_recipient_type_team_members()
                })
                .await;
            if summary.record_deletion(&response, result).is_some() {
                updates.add_student(&response);
            }
        }

        for response in self
            .store
            .responses
            .responses_for_receiver_for_course(course_id, email)
            .await?
        {
            let result = self
                .delete_if(&response, FeedbackQuestion::is_recipient_type_team_members)
                .await;
            if let Some(question) = summary.record_deletion(&response, result) {
                if question.giver_type == FeedbackParticipantType::Students {
                    updates.add_student(&response);
                }
            }
        }

        let is_old_team_empty = self
            .store
            .roster
            .students_for_team(course_id, old_team)
            .await?
            .is_empty();
        if is_old_team_empty {
            self.purge_team_responses(course_id, old_team, &mut summary, &mut updates)
                .await?;
        }

        updates.apply(&self.logic, course_id).await;
        info!("Team change of {email} in course {course_id}: {summary}");
        Ok(summary)
    }

    async fn purge_team_responses(
        &self,
        course_id: &str,
        team: &str,
        summary: &mut CascadeSummary,
        updates: &mut RespondentUpdates,
    ) -> Result<()> {
        for response in self
            .store
            .responses
            .responses_from_giver_for_course(course_id, team)
            .await?
        {
            let result = self.logic.delete_response_cascade(&response.id).await.map(Some);
            summary.record_deletion(&response, result);
        }

        for response in self
            .store
            .responses
            .responses_for_receiver_for_course(course_id, team)
            .await?
        {
            let result = self.delete_if(&response, |_| true).await;
            if let Some(question) = summary.record_deletion(&response, result) {
                updates.add_giver(&question, &response);
            }
        }
        Ok(())
    }

    /// Move a student's sections on every response they gave or received, and on their comments.
    ///
    /// Response identities and respondent lists never change.
    pub async fn update_responses_for_changing_section(
        &self,
        course_id: &str,
        email: &str,
        new_section: &str,
    ) -> Result<CascadeSummary> {
        debug!("Moving {email} of course {course_id} to section {new_section}");
        let mut summary = CascadeSummary::default();

        let given = self
            .store
            .responses
            .responses_from_giver_for_course(course_id, email)
            .await?;
        let giver_fields = ResponseFields {
            giver_section: Some(new_section.to_string()),
            ..Default::default()
        };
        for response in given {
            self.update_section(&response, &giver_fields, &mut summary)
                .await;
        }

        let received = self
            .store
            .responses
            .responses_for_receiver_for_course(course_id, email)
            .await?;
        let recipient_fields = ResponseFields {
            recipient_section: Some(new_section.to_string()),
            ..Default::default()
        };
        for response in received {
            self.update_section(&response, &recipient_fields, &mut summary)
                .await;
        }

        info!("Section change of {email} in course {course_id}: {summary}");
        Ok(summary)
    }

    async fn update_section(
        &self,
        response: &FeedbackResponse,
        fields: &ResponseFields,
        summary: &mut CascadeSummary,
    ) {
        let result = async {
            let updated = self
                .store
                .responses
                .update_response_fields(&response.id, fields)
                .await?;
            let comment_update = CommentUpdate {
                response_id: None,
                ..CommentUpdate::following(&updated)
            };
            for comment in self.store.comments.comments_for_response(&updated.id).await? {
                self.store
                    .comments
                    .update_comment(&comment, &comment_update)
                    .await?;
            }
            Ok::<_, Error>(())
        }
        .await;

        match result {
            Ok(()) => summary.updated += 1,
            Err(e) => {
                warn!("Could not move response {} to its new section: {e}", response.id);
                summary.skipped += 1;
            }
        }
    }

    /// Recreate every response given or received by `old_email` under `new_email`.
    ///
    /// A response whose new key is already taken is left as it was. Once the
    /// whole batch has been tried, any such responses are reported together
    /// as [`Error::RecreateConflicts`].
    pub async fn update_responses_for_changing_email(
        &self,
        course_id: &str,
        old_email: &str,
        new_email: &str,
    ) -> Result<CascadeSummary> {
        debug!("Changing email {old_email} of course {course_id} to {new_email}");
        let mut summary = CascadeSummary::default();
        let mut conflicts = Vec::new();

        let given = self
            .store
            .responses
            .responses_from_giver_for_course(course_id, old_email)
            .await?;
        let has_given = !given.is_empty();
        for response in given {
            let update = ResponseUpdate::new().with_giver(new_email);
            self.recreate(&response, &update, &mut summary, &mut conflicts)
                .await;
        }
        if has_given {
            if let Err(e) = self
                .store
                .comments
                .update_comment_emails(course_id, old_email, new_email)
                .await
            {
                warn!("Could not change comment email {old_email} in course {course_id}: {e}");
            }
        }

        for response in self
            .store
            .responses
            .responses_for_receiver_for_course(course_id, old_email)
            .await?
        {
            let update = ResponseUpdate::new().with_recipient(new_email);
            self.recreate(&response, &update, &mut summary, &mut conflicts)
                .await;
        }

        info!("Email change of {old_email} in course {course_id}: {summary}");
        if !conflicts.is_empty() {
            warn!(
                "{} responses of {old_email} could not take email {new_email}",
                conflicts.len()
            );
            return Err(Error::RecreateConflicts(conflicts));
        }
        Ok(summary)
    }

    async fn recreate(
        &self,
        response: &FeedbackResponse,
        update: &ResponseUpdate,
        summary: &mut CascadeSummary,
        conflicts: &mut Vec<String>,
    ) {
        match self.logic.update_response_cascade(&response.id, update).await {
            Ok(_) => summary.updated += 1,
            Err(Error::Conflict(_)) => {
                warn!("Response {} collides with an existing response", response.id);
                conflicts.push(response.id.clone());
                summary.skipped += 1;
            }
            Err(e) => {
                warn!("Could not recreate response {}: {e}", response.id);
                summary.skipped += 1;
            }
        }
    }

    /// Delete every response given or received by a student, and the student's respondent entries.
    pub async fn delete_responses_involving_student(
        &self,
        course_id: &str,
        email: &str,
    ) -> Result<CascadeSummary> {
        let summary = self.delete_responses_involving_entity(course_id, email).await?;
        if let Err(e) = self
            .store
            .respondents
            .remove_student_from_all_sessions(course_id, email)
            .await
        {
            warn!("Cannot remove student {email} from respondents of course {course_id}: {e}");
        }
        info!("Deleted student {email} of course {course_id}: {summary}");
        Ok(summary)
    }

    /// Delete every response given or received by an instructor, and their respondent entries.
    pub async fn delete_responses_involving_instructor(
        &self,
        course_id: &str,
        email: &str,
    ) -> Result<CascadeSummary> {
        let summary = self.delete_responses_involving_entity(course_id, email).await?;
        if let Err(e) = self
            .store
            .respondents
            .remove_instructor_from_all_sessions(course_id, email)
            .await
        {
            warn!("Cannot remove instructor {email} from respondents of course {course_id}: {e}");
        }
        info!("Deleted instructor {email} of course {course_id}: {summary}");
        Ok(summary)
    }

    /// Delete every response given by or to a team.
    pub async fn delete_responses_involving_team(
        &self,
        course_id: &str,
        team: &str,
    ) -> Result<CascadeSummary> {
        debug!("Deleting responses of team {team} in course {course_id}");
        let mut summary = CascadeSummary::default();
        let mut updates = RespondentUpdates::default();
        self.purge_team_responses(course_id, team, &mut summary, &mut updates)
            .await?;
        updates.apply(&self.logic, course_id).await;
        info!("Deleted team {team} of course {course_id}: {summary}");
        Ok(summary)
    }

    async fn delete_responses_involving_entity(
        &self,
        course_id: &str,
        email: &str,
    ) -> Result<CascadeSummary> {
        debug!("Deleting responses of {email} in course {course_id}");
        let mut summary = CascadeSummary::default();
        let mut updates = RespondentUpdates::default();

        for response in self
            .store
            .responses
            .responses_from_giver_for_course(course_id, email)
            .await?
        {
            let result = self.logic.delete_response_cascade(&response.id).await.map(Some);
            summary.record_deletion(&response, result);
        }

        for response in self
            .store
            .responses
            .responses_for_receiver_for_course(course_id, email)
            .await?
        {
            let result = self.delete_if(&response, |_| true).await;
            if let Some(question) = summary.record_deletion(&response, result) {
                updates.add_giver(&question, &response);
            }
        }

        updates.apply(&self.logic, course_id).await;
        Ok(summary)
    }

    /// Replace a question's details, deleting its responses when the new details invalidate them.
    ///
    /// Returns whether responses were deleted.
    pub async fn apply_question_details_change(
        &self,
        question_id: &str,
        details: QuestionDetails,
    ) -> Result<bool> {
        let old = self
            .store
            .questions
            .get_question(question_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("question {question_id}")))?;

        let requires_deletion = old.details.should_changes_require_response_deletion(&details);
        let new = FeedbackQuestion { details, ..old };
        Error::check_violations(new.validate())?;

        self.store.questions.update_question(&new).await?;
        if requires_deletion {
            info!("Details change of question {question_id} invalidates its responses");
            self.logic
                .delete_responses_for_question_cascade(question_id)
                .await?;
        }
        Ok(requires_deletion)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{
        comment::FeedbackResponseComment,
        common::FeedbackParticipantType::{Instructors, OwnTeamMembers, Teams},
        question::{NumericalScaleQuestionDetails, TextQuestionDetails},
        respondents::RespondentList,
        roster::{CourseRoster, InstructorRecord, StudentRecord},
        store::{memory::MemoryStore, RespondentStore, ResponseStore},
    };

    const ALICE: &str = "alice@uni.edu";
    const BOB: &str = "bob@uni.edu";
    const CAROL: &str = "carol@uni.edu";
    const PROF: &str = "prof@uni.edu";
    const SESSION: &str = "Midterm feedback";

    fn init_logging() {
        log4rs_test_utils::test_logging::init_logging_once_for(["feedback_engine"], None, None);
    }

    /// Student to student feedback.
    fn peer_question() -> FeedbackQuestion {
        FeedbackQuestion::example()
    }

    /// Feedback about members of the giver's own team.
    fn team_member_question() -> FeedbackQuestion {
        FeedbackQuestion {
            id: "q2".to_string(),
            recipient_type: OwnTeamMembers,
            ..FeedbackQuestion::example()
        }
    }

    /// Each team answers once, to the instructors.
    fn team_question() -> FeedbackQuestion {
        FeedbackQuestion {
            id: "q3".to_string(),
            giver_type: Teams,
            recipient_type: Instructors,
            show_responses_to: vec![Instructors],
            show_giver_name_to: vec![Instructors],
            show_recipient_name_to: vec![Instructors],
            ..FeedbackQuestion::example()
        }
    }

    /// Instructors write about students.
    fn instructor_question() -> FeedbackQuestion {
        FeedbackQuestion {
            id: "q4".to_string(),
            giver_type: Instructors,
            ..FeedbackQuestion::example()
        }
    }

    /// Students write about other teams.
    fn to_team_question() -> FeedbackQuestion {
        FeedbackQuestion {
            id: "q5".to_string(),
            recipient_type: Teams,
            ..FeedbackQuestion::example()
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        coordinator: ConsistencyCoordinator,
    }

    impl Fixture {
        async fn new() -> Self {
            init_logging();
            let store = Arc::new(MemoryStore::new());
            for student in [
                StudentRecord::example_alice(),
                StudentRecord::example_bob(),
                StudentRecord::example_carol(),
            ] {
                store.upsert_student(student).await;
            }
            store.insert_instructor(InstructorRecord::example()).await;
            for question in [
                peer_question(),
                team_member_question(),
                team_question(),
                instructor_question(),
                to_team_question(),
            ] {
                store.insert_question(question).await;
            }
            let mut respondents = RespondentList::new("CS101", SESSION);
            respondents
                .student_emails
                .extend([ALICE, BOB, CAROL, "Team 1", "Team 2"].map(String::from));
            respondents.instructor_emails.insert(PROF.to_string());
            store.insert_session(respondents).await;

            let coordinator = ConsistencyCoordinator::new(Datastore::memory(store.clone()));
            Self { store, coordinator }
        }

        /// Add a response with a comment by its giver.
        async fn respond(
            &self,
            question: &FeedbackQuestion,
            giver: &str,
            recipient: &str,
        ) -> FeedbackResponse {
            let roster = CourseRoster::example();
            let section = |who: &str| roster.section_of(who).unwrap_or("Section 1").to_string();
            let mut response = FeedbackResponse::example(question, giver, recipient);
            response.giver_section = section(giver);
            response.recipient_section = section(recipient);
            self.store.insert_response(response.clone()).await;
            self.store
                .insert_comment(FeedbackResponseComment::new(&response, giver, "Noted"))
                .await;
            response
        }

        async fn keys(&self) -> Vec<(String, String, String)> {
            self.store
                .all_responses()
                .await
                .into_iter()
                .map(|r| (r.question_id, r.giver, r.recipient))
                .collect()
        }

        async fn respondents(&self) -> RespondentList {
            self.store
                .respondents("CS101", SESSION)
                .await
                .unwrap()
                .unwrap()
        }
    }

    fn key(question: &str, giver: &str, recipient: &str) -> (String, String, String) {
        (question.to_string(), giver.to_string(), recipient.to_string())
    }

    #[tokio::test]
    async fn team_change_drops_team_member_responses() {
        let fixture = Fixture::new().await;
        fixture.respond(&team_member_question(), ALICE, BOB).await;
        fixture.respond(&team_member_question(), BOB, ALICE).await;
        fixture.respond(&peer_question(), ALICE, CAROL).await;
        fixture.respond(&team_question(), "Team 1", PROF).await;

        fixture
            .store
            .upsert_student(StudentRecord {
                team: "Team 2".to_string(),
                ..StudentRecord::example_alice()
            })
            .await;
        let summary = fixture
            .coordinator
            .update_responses_for_changing_team("CS101", ALICE, "Team 1", "Team 2")
            .await
            .unwrap();

        assert_eq!(summary.deleted, 2);
        assert_eq!(
            fixture.keys().await,
            [key("q1", ALICE, CAROL), key("q3", "Team 1", PROF)]
        );
        // Bob has nothing left in the session; Alice still has her peer response.
        let respondents = fixture.respondents().await;
        assert!(!respondents.has_respondent(BOB));
        assert!(respondents.has_respondent(ALICE));
        assert_eq!(fixture.store.all_comments().await.len(), 2);
    }

    #[tokio::test]
    async fn team_change_purges_emptied_team() {
        let fixture = Fixture::new().await;
        fixture.respond(&team_question(), "Team 2", PROF).await;
        fixture.respond(&to_team_question(), ALICE, "Team 2").await;
        fixture.respond(&to_team_question(), CAROL, "Team 1").await;

        fixture
            .store
            .upsert_student(StudentRecord {
                team: "Team 1".to_string(),
                ..StudentRecord::example_carol()
            })
            .await;
        fixture
            .coordinator
            .update_responses_for_changing_team("CS101", CAROL, "Team 2", "Team 1")
            .await
            .unwrap();

        let keys = fixture.keys().await;
        assert_eq!(keys, [key("q5", CAROL, "Team 1")]);
        assert!(!fixture.respondents().await.has_respondent(ALICE));
        assert!(fixture.respondents().await.has_respondent(CAROL));
    }

    #[tokio::test]
    async fn section_change_updates_responses_and_comments() {
        let fixture = Fixture::new().await;
        let given = fixture.respond(&peer_question(), ALICE, CAROL).await;
        let received = fixture.respond(&peer_question(), CAROL, ALICE).await;

        let summary = fixture
            .coordinator
            .update_responses_for_changing_section("CS101", ALICE, "Section 3")
            .await
            .unwrap();
        assert_eq!(summary.updated, 2);

        let given = fixture.store.get_response(&given.id).await.unwrap().unwrap();
        let received = fixture
            .store
            .get_response(&received.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(given.giver_section, "Section 3");
        assert_eq!(given.recipient_section, "Section 2");
        assert_eq!(received.recipient_section, "Section 3");
        assert_eq!(received.giver, CAROL);

        for comment in fixture.store.all_comments().await {
            let parent = if comment.response_id == given.id {
                &given
            } else {
                &received
            };
            assert_eq!(comment.giver_section, parent.giver_section);
            assert_eq!(comment.receiver_section, parent.recipient_section);
        }
        assert!(fixture.respondents().await.has_respondent(ALICE));
    }

    #[tokio::test]
    async fn section_change_continues_past_failed_comment() {
        let fixture = Fixture::new().await;
        let broken = fixture.respond(&peer_question(), ALICE, BOB).await;
        let fine = fixture.respond(&peer_question(), ALICE, CAROL).await;
        fixture.store.break_comment_updates_for(&broken.id).await;

        let summary = fixture
            .coordinator
            .update_responses_for_changing_section("CS101", ALICE, "Section 3")
            .await
            .unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 1);

        let comments = fixture.store.all_comments().await;
        let fine_comment = comments
            .iter()
            .find(|comment| comment.response_id == fine.id)
            .unwrap();
        assert_eq!(fine_comment.giver_section, "Section 3");
    }

    #[tokio::test]
    async fn email_change_reports_collision_and_finishes_batch() {
        let fixture = Fixture::new().await;
        let colliding = fixture.respond(&peer_question(), ALICE, BOB).await;
        fixture.respond(&peer_question(), "new@uni.edu", BOB).await;
        fixture.respond(&peer_question(), ALICE, CAROL).await;
        fixture.respond(&peer_question(), CAROL, ALICE).await;

        let result = fixture
            .coordinator
            .update_responses_for_changing_email("CS101", ALICE, "new@uni.edu")
            .await;
        match result {
            Err(Error::RecreateConflicts(ids)) => assert_eq!(ids, [colliding.id.clone()]),
            other => panic!("expected a recreate conflict, got {other:?}"),
        }

        let keys = fixture.keys().await;
        assert!(keys.contains(&key("q1", ALICE, BOB)));
        assert!(keys.contains(&key("q1", "new@uni.edu", CAROL)));
        assert!(keys.contains(&key("q1", CAROL, "new@uni.edu")));
        assert!(!keys.contains(&key("q1", ALICE, CAROL)));
        assert!(!keys.contains(&key("q1", CAROL, ALICE)));

        // Comments follow their recreated response and the renamed giver.
        let comments = fixture.store.all_comments().await;
        let moved = FeedbackResponse::make_id("q1", "new@uni.edu", CAROL);
        let comment = comments
            .iter()
            .find(|comment| comment.response_id == moved)
            .unwrap();
        assert_eq!(comment.comment_giver, "new@uni.edu");
    }

    #[tokio::test]
    async fn email_change_without_collision() {
        let fixture = Fixture::new().await;
        fixture.respond(&peer_question(), BOB, ALICE).await;

        let summary = fixture
            .coordinator
            .update_responses_for_changing_email("CS101", ALICE, "new@uni.edu")
            .await
            .unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(fixture.keys().await, [key("q1", BOB, "new@uni.edu")]);
    }

    #[tokio::test]
    async fn deleting_student_rechecks_givers() {
        let fixture = Fixture::new().await;
        fixture.respond(&peer_question(), BOB, CAROL).await;
        fixture.respond(&peer_question(), ALICE, BOB).await;
        fixture.respond(&instructor_question(), PROF, BOB).await;
        fixture.respond(&peer_question(), CAROL, ALICE).await;

        let summary = fixture
            .coordinator
            .delete_responses_involving_student("CS101", BOB)
            .await
            .unwrap();
        assert_eq!(summary.deleted, 3);
        assert_eq!(fixture.keys().await, [key("q1", CAROL, ALICE)]);

        let respondents = fixture.respondents().await;
        assert!(!respondents.has_respondent(BOB));
        assert!(!respondents.has_respondent(ALICE));
        assert!(!respondents.has_respondent(PROF));
        assert!(respondents.has_respondent(CAROL));
        assert_eq!(fixture.store.all_comments().await.len(), 1);
    }

    #[tokio::test]
    async fn deleting_instructor() {
        let fixture = Fixture::new().await;
        fixture.respond(&instructor_question(), PROF, BOB).await;
        fixture.respond(&team_question(), "Team 1", PROF).await;

        fixture
            .coordinator
            .delete_responses_involving_instructor("CS101", PROF)
            .await
            .unwrap();
        assert!(fixture.keys().await.is_empty());
        assert!(fixture.respondents().await.instructor_emails.is_empty());
    }

    #[tokio::test]
    async fn deleting_team() {
        let fixture = Fixture::new().await;
        fixture.respond(&team_question(), "Team 1", PROF).await;
        fixture.respond(&to_team_question(), CAROL, "Team 1").await;
        fixture.respond(&peer_question(), ALICE, BOB).await;

        let summary = fixture
            .coordinator
            .delete_responses_involving_team("CS101", "Team 1")
            .await
            .unwrap();
        assert_eq!(summary.deleted, 2);
        assert_eq!(fixture.keys().await, [key("q1", ALICE, BOB)]);
        assert!(!fixture.respondents().await.has_respondent(CAROL));
    }

    #[tokio::test]
    async fn cascades_are_idempotent() {
        let fixture = Fixture::new().await;
        fixture.respond(&peer_question(), ALICE, BOB).await;

        for _ in 0..2 {
            fixture
                .coordinator
                .delete_responses_involving_student("CS101", ALICE)
                .await
                .unwrap();
        }
        assert!(fixture.keys().await.is_empty());
    }

    #[tokio::test]
    async fn missing_question_skips_response() {
        let fixture = Fixture::new().await;
        let orphan = FeedbackQuestion {
            id: "gone".to_string(),
            ..FeedbackQuestion::example()
        };
        fixture.respond(&orphan, BOB, ALICE).await;
        fixture.respond(&peer_question(), CAROL, ALICE).await;

        let summary = fixture
            .coordinator
            .delete_responses_involving_student("CS101", ALICE)
            .await
            .unwrap();
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(fixture.keys().await, [key("gone", BOB, ALICE)]);
    }

    #[tokio::test]
    async fn question_details_change() {
        let fixture = Fixture::new().await;
        fixture.respond(&peer_question(), ALICE, BOB).await;

        let longer = QuestionDetails::Text(TextQuestionDetails {
            recommended_length: Some(100),
            ..Default::default()
        });
        let deleted = fixture
            .coordinator
            .apply_question_details_change("q1", longer)
            .await
            .unwrap();
        assert!(!deleted);
        assert_eq!(fixture.keys().await.len(), 1);

        let invalid = QuestionDetails::Text(TextQuestionDetails {
            recommended_length: Some(0),
            ..Default::default()
        });
        let result = fixture
            .coordinator
            .apply_question_details_change("q1", invalid)
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let scale = QuestionDetails::NumericalScale(NumericalScaleQuestionDetails {
            min_scale: 1,
            max_scale: 5,
            step: 1.0,
        });
        let deleted = fixture
            .coordinator
            .apply_question_details_change("q1", scale)
            .await
            .unwrap();
        assert!(deleted);
        assert!(fixture.keys().await.is_empty());
        assert!(!fixture.respondents().await.has_respondent(ALICE));

        let missing = fixture
            .coordinator
            .apply_question_details_change("q9", QuestionDetails::Text(Default::default()))
            .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
