//! Who may see a response, and whose names they may see on it.

use crate::{
    error::{Error, Result},
    model::{
        common::{FeedbackParticipantType, UserRole},
        question::FeedbackQuestion,
        response::FeedbackResponse,
        roster::CourseRoster,
    },
};

/// Is the giver's (or, with `is_giver_name` false, the recipient's) name on
/// `response` visible to the user `user_email` acting as `role`?
///
/// Whoever gave the response always sees it fully. For team questions that is
/// every member of the giving team.
///
/// A category that has no meaning in a visibility list is an
/// [`Error::Configuration`]; no visibility is ever assumed for it.
pub fn is_name_visible_to_user(
    question: &FeedbackQuestion,
    response: &FeedbackResponse,
    user_email: &str,
    role: UserRole,
    is_giver_name: bool,
    roster: &CourseRoster,
) -> Result<bool> {
    let is_giver = if question.giver_type == FeedbackParticipantType::Teams {
        roster.is_member_of_giver_team(user_email, &response.giver)
    } else {
        response.giver == user_email
    };
    if is_giver {
        return Ok(true);
    }

    let show_name_to = if is_giver_name {
        &question.show_giver_name_to
    } else {
        &question.show_recipient_name_to
    };

    for &category in show_name_to {
        if is_category_satisfied(question, response, user_email, role, category, roster)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_category_satisfied(
    question: &FeedbackQuestion,
    response: &FeedbackResponse,
    user_email: &str,
    role: UserRole,
    category: FeedbackParticipantType,
    roster: &CourseRoster,
) -> Result<bool> {
    use FeedbackParticipantType::*;

    let satisfied = match category {
        Instructors => role == UserRole::Instructor && roster.is_instructor(user_email),
        // The giver's team members.
        OwnTeamMembers | OwnTeamMembersIncludingSelf => {
            roster.is_students_in_same_team(&response.giver, user_email)
        }
        Receiver if question.recipient_type.is_team() => {
            roster.is_student_in_team(user_email, &response.recipient)
        }
        Receiver => response.recipient == user_email,
        ReceiverTeamMembers if question.recipient_type.is_team() => {
            roster.is_student_in_team(user_email, &response.recipient)
        }
        ReceiverTeamMembers => roster.is_students_in_same_team(&response.recipient, user_email),
        Students => roster.is_student_in_course(user_email),
        other => {
            error!(
                "Question {} shows names to {other}, which is not a visibility category",
                question.id
            );
            return Err(Error::Configuration(format!(
                "{other} is not a valid visibility category for question {}",
                question.id
            )));
        }
    };
    Ok(satisfied)
}

/// Can any student see responses to this question?
pub fn is_response_visible_to_students(question: &FeedbackQuestion) -> bool {
    use FeedbackParticipantType::*;

    if question.is_response_visible_to(Students) {
        return true;
    }

    let is_student_recipient_type = matches!(
        question.recipient_type,
        Students | OwnTeamMembers | OwnTeamMembersIncludingSelf
    ) || (question.recipient_type == Giver && question.giver_type == Students);
    if (is_student_recipient_type || question.recipient_type.is_team())
        && question.is_response_visible_to(Receiver)
    {
        return true;
    }

    if question.giver_type == Teams || question.is_response_visible_to(OwnTeamMembers) {
        return true;
    }

    question.is_response_visible_to(ReceiverTeamMembers)
}
