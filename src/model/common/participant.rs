use std::fmt;

use serde::{Deserialize, Serialize};

/// Who gives feedback, who receives it, and who may see it.
///
/// The same enumeration serves as giver type, recipient type and visibility
/// category; not every variant is meaningful in every position.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackParticipantType {
    /// As giver: the session creator. As recipient: the giver themselves.
    #[serde(rename = "SELF")]
    Myself,
    Students,
    StudentsExcludingSelf,
    Instructors,
    Teams,
    TeamsExcludingSelf,
    /// The giver's own team, as a unit.
    OwnTeam,
    OwnTeamMembers,
    OwnTeamMembersIncludingSelf,
    /// Visibility only: whoever the response is about.
    Receiver,
    /// Visibility only: team members of whoever the response is about.
    ReceiverTeamMembers,
    None,
    /// Recipient only: the response is about the giver.
    Giver,
}

impl FeedbackParticipantType {
    /// Is a recipient of this type a whole team rather than an individual?
    pub fn is_team(self) -> bool {
        matches!(self, Self::Teams | Self::TeamsExcludingSelf | Self::OwnTeam)
    }

    /// Can this type appear as the giver of a question?
    pub fn is_valid_giver(self) -> bool {
        matches!(
            self,
            Self::Myself | Self::Students | Self::Instructors | Self::Teams
        )
    }

    /// Can this type appear as the recipient of a question?
    pub fn is_valid_recipient(self) -> bool {
        !matches!(self, Self::Receiver | Self::ReceiverTeamMembers)
    }

    /// Can this type appear in a `show_*_to` list?
    pub fn is_valid_visibility_category(self) -> bool {
        matches!(
            self,
            Self::Receiver
                | Self::ReceiverTeamMembers
                | Self::OwnTeamMembers
                | Self::OwnTeamMembersIncludingSelf
                | Self::Students
                | Self::Instructors
        )
    }

    /// Recipients which are the giver's team members, so become invalid on a team change.
    pub fn is_team_members(self) -> bool {
        matches!(self, Self::OwnTeamMembers | Self::OwnTeamMembersIncludingSelf)
    }

    /// The stored name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Myself => "SELF",
            Self::Students => "STUDENTS",
            Self::StudentsExcludingSelf => "STUDENTS_EXCLUDING_SELF",
            Self::Instructors => "INSTRUCTORS",
            Self::Teams => "TEAMS",
            Self::TeamsExcludingSelf => "TEAMS_EXCLUDING_SELF",
            Self::OwnTeam => "OWN_TEAM",
            Self::OwnTeamMembers => "OWN_TEAM_MEMBERS",
            Self::OwnTeamMembersIncludingSelf => "OWN_TEAM_MEMBERS_INCLUDING_SELF",
            Self::Receiver => "RECEIVER",
            Self::ReceiverTeamMembers => "RECEIVER_TEAM_MEMBERS",
            Self::None => "NONE",
            Self::Giver => "GIVER",
        }
    }
}

impl fmt::Display for FeedbackParticipantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capacity in which a user is viewing responses.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Instructor,
    Student,
}
