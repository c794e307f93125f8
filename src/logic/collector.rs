use std::{collections::HashSet, sync::Arc};

use crate::{
    error::Result,
    model::{
        common::{FeedbackParticipantType, ResponseId},
        question::FeedbackQuestion,
        response::FeedbackResponse,
        roster::{CourseRoster, StudentRecord},
        store::{Datastore, ResponseStore, RosterSource},
    },
};

/// Responses in first-seen order, without repeats.
#[derive(Debug, Default)]
struct UniqueResponses {
    ids: HashSet<ResponseId>,
    responses: Vec<FeedbackResponse>,
}

impl UniqueResponses {
    fn extend(&mut self, responses: impl IntoIterator<Item = FeedbackResponse>) {
        for response in responses {
            if self.ids.insert(response.id.clone()) {
                self.responses.push(response);
            }
        }
    }

    fn into_vec(self) -> Vec<FeedbackResponse> {
        self.responses
    }
}

/// Gathers the responses a viewer is entitled to.
#[derive(Clone)]
pub struct ResponseCollector {
    responses: Arc<dyn ResponseStore>,
    roster: Arc<dyn RosterSource>,
}

impl ResponseCollector {
    pub fn new(store: &Datastore) -> Self {
        Self {
            responses: store.responses.clone(),
            roster: store.roster.clone(),
        }
    }

    /// Every response to `question` that `student` can see.
    pub async fn viewable_responses_for_student(
        &self,
        question: &FeedbackQuestion,
        student: &StudentRecord,
        roster: &CourseRoster,
    ) -> Result<Vec<FeedbackResponse>> {
        use FeedbackParticipantType::*;

        let mut viewable = UniqueResponses::default();

        viewable.extend(
            self.responses
                .responses_from_giver_for_question(&question.id, &student.email)
                .await?,
        );

        if question.is_response_visible_to(Receiver) {
            viewable.extend(
                self.responses
                    .responses_for_receiver_for_question(&question.id, &student.email)
                    .await?,
            );
        }

        // Covers every case below.
        if question.is_response_visible_to(Students) {
            viewable.extend(self.responses.responses_for_question(&question.id).await?);
            return Ok(viewable.into_vec());
        }

        if question.recipient_type.is_team() && question.is_response_visible_to(Receiver) {
            viewable.extend(
                self.responses
                    .responses_for_receiver_for_question(&question.id, &student.team)
                    .await?,
            );
        }

        if question.giver_type == Teams || question.is_response_visible_to(OwnTeamMembers) {
            viewable.extend(
                self.responses_from_team(&question.id, &question.course_id, &student.team, Some(roster))
                    .await?,
            );
        }

        if question.is_response_visible_to(ReceiverTeamMembers) {
            for member in roster.team_members(&student.team) {
                if member.email == student.email {
                    continue;
                }
                viewable.extend(
                    self.responses
                        .responses_for_receiver_for_question(&question.id, &member.email)
                        .await?,
                );
            }
        }

        Ok(viewable.into_vec())
    }

    /// The responses `student` already gave, or their team gave for a team question.
    pub async fn responses_from_student_or_team(
        &self,
        question: &FeedbackQuestion,
        student: &StudentRecord,
    ) -> Result<Vec<FeedbackResponse>> {
        if question.giver_type == FeedbackParticipantType::Teams {
            return self
                .responses_from_team(&question.id, &question.course_id, &student.team, None)
                .await;
        }
        self.responses
            .responses_from_giver_for_question(&question.id, &student.email)
            .await
    }

    /// Responses given by each member of `team`, then those recorded under the team name.
    ///
    /// Without a roster the members are fetched from the roster source.
    async fn responses_from_team(
        &self,
        question_id: &str,
        course_id: &str,
        team: &str,
        roster: Option<&CourseRoster>,
    ) -> Result<Vec<FeedbackResponse>> {
        let fetched;
        let members = match roster {
            Some(roster) => roster.team_members(team),
            None => {
                fetched = self.roster.students_for_team(course_id, team).await?;
                &fetched[..]
            }
        };

        let mut responses = Vec::new();
        for member in members {
            responses.extend(
                self.responses
                    .responses_from_giver_for_question(question_id, &member.email)
                    .await?,
            );
        }
        responses.extend(
            self.responses
                .responses_from_giver_for_question(question_id, team)
                .await?,
        );
        Ok(responses)
    }

    /// Everyone who gave at least one response in the session.
    pub async fn giver_set_that_answered(
        &self,
        course_id: &str,
        session_name: &str,
    ) -> Result<HashSet<String>> {
        self.responses
            .giver_set_that_answered_session(course_id, session_name)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{
        common::FeedbackParticipantType::*, roster::StudentRecord, store::memory::MemoryStore,
    };

    const ALICE: &str = "alice@uni.edu";
    const BOB: &str = "bob@uni.edu";
    const CAROL: &str = "carol@uni.edu";
    const PROF: &str = "prof@uni.edu";

    async fn store_with(responses: &[(&FeedbackQuestion, &str, &str)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for student in [
            StudentRecord::example_alice(),
            StudentRecord::example_bob(),
            StudentRecord::example_carol(),
        ] {
            store.upsert_student(student).await;
        }
        for (question, giver, recipient) in responses {
            store
                .insert_response(FeedbackResponse::example(question, giver, recipient))
                .await;
        }
        store
    }

    fn givers_and_recipients(responses: &[FeedbackResponse]) -> Vec<(&str, &str)> {
        responses
            .iter()
            .map(|response| (response.giver.as_str(), response.recipient.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn own_and_received_responses() {
        let question = FeedbackQuestion::example();
        let store = store_with(&[
            (&question, ALICE, BOB),
            (&question, BOB, ALICE),
            (&question, CAROL, BOB),
        ])
        .await;
        let collector = ResponseCollector::new(&Datastore::memory(store));

        let viewable = collector
            .viewable_responses_for_student(
                &question,
                &StudentRecord::example_alice(),
                &CourseRoster::example(),
            )
            .await
            .unwrap();
        assert_eq!(
            givers_and_recipients(&viewable),
            [(ALICE, BOB), (BOB, ALICE)]
        );
    }

    #[tokio::test]
    async fn students_visibility_returns_everything_once() {
        let question = FeedbackQuestion {
            show_responses_to: vec![Receiver, Students, ReceiverTeamMembers],
            ..FeedbackQuestion::example()
        };
        let store = store_with(&[
            (&question, ALICE, BOB),
            (&question, BOB, ALICE),
            (&question, CAROL, BOB),
        ])
        .await;
        let collector = ResponseCollector::new(&Datastore::memory(store));

        let viewable = collector
            .viewable_responses_for_student(
                &question,
                &StudentRecord::example_alice(),
                &CourseRoster::example(),
            )
            .await
            .unwrap();
        assert_eq!(viewable.len(), 3);
        assert_eq!(viewable[0].giver, ALICE);
    }

    #[tokio::test]
    async fn team_categories() {
        let to_teams = FeedbackQuestion {
            id: "q2".to_string(),
            recipient_type: Teams,
            show_responses_to: vec![Receiver],
            ..FeedbackQuestion::example()
        };
        let to_students = FeedbackQuestion {
            show_responses_to: vec![OwnTeamMembers, ReceiverTeamMembers],
            ..FeedbackQuestion::example()
        };
        let store = store_with(&[
            (&to_teams, CAROL, "Team 1"),
            (&to_teams, ALICE, "Team 2"),
            (&to_students, BOB, CAROL),
            (&to_students, CAROL, BOB),
            (&to_students, CAROL, PROF),
        ])
        .await;
        let collector = ResponseCollector::new(&Datastore::memory(store));
        let alice = StudentRecord::example_alice();
        let roster = CourseRoster::example();

        let team_viewable = collector
            .viewable_responses_for_student(&to_teams, &alice, &roster)
            .await
            .unwrap();
        assert_eq!(
            givers_and_recipients(&team_viewable),
            [(ALICE, "Team 2"), (CAROL, "Team 1")]
        );

        // Bob's response as a teammate, Carol's response about teammate Bob.
        let member_viewable = collector
            .viewable_responses_for_student(&to_students, &alice, &roster)
            .await
            .unwrap();
        assert_eq!(
            givers_and_recipients(&member_viewable),
            [(BOB, CAROL), (CAROL, BOB)]
        );
    }

    #[tokio::test]
    async fn team_question_answers_from_whole_team() {
        let question = FeedbackQuestion {
            giver_type: Teams,
            recipient_type: Instructors,
            ..FeedbackQuestion::example()
        };
        let store = store_with(&[
            (&question, "Team 1", PROF),
            (&question, BOB, PROF),
            (&question, "Team 2", PROF),
        ])
        .await;
        let collector = ResponseCollector::new(&Datastore::memory(store));

        let given = collector
            .responses_from_student_or_team(&question, &StudentRecord::example_alice())
            .await
            .unwrap();
        assert_eq!(
            givers_and_recipients(&given),
            [(BOB, PROF), ("Team 1", PROF)]
        );

        let givers = collector
            .giver_set_that_answered("CS101", "Midterm feedback")
            .await
            .unwrap();
        assert_eq!(givers.len(), 3);
    }
}
