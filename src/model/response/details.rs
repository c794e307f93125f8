use serde::{Deserialize, Serialize};

/// The answer given by a response, tagged by the question type it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "questionType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseDetails {
    Mcq(McqResponseDetails),
    Msq(MsqResponseDetails),
    RankOptions(RankOptionsResponseDetails),
    RankRecipients(RankRecipientsResponseDetails),
    #[serde(rename = "CONSTSUM_OPTIONS")]
    ConstSumOptions(ConstSumResponseDetails),
    #[serde(rename = "CONSTSUM_RECIPIENTS")]
    ConstSumRecipients(ConstSumResponseDetails),
    #[serde(rename = "CONTRIB")]
    Contribution(ContributionResponseDetails),
    Rubric(RubricResponseDetails),
    #[serde(rename = "NUMSCALE")]
    NumericalScale(NumericalScaleResponseDetails),
    Text(TextResponseDetails),
}

impl ResponseDetails {
    /// The stored type tag, matching that of the question answered.
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
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqResponseDetails {
    pub answer: String,
    #[serde(default)]
    pub is_other: bool,
    #[serde(default)]
    pub other_field_content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsqResponseDetails {
    /// Selected choices. When "other" is selected, its text is one of these.
    pub answers: Vec<String>,
    #[serde(default)]
    pub is_other: bool,
    #[serde(default)]
    pub other_field_content: String,
}

impl MsqResponseDetails {
    pub fn answer_string(&self) -> String {
        self.answers.join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankOptionsResponseDetails {
    /// Rank given to each option, in option order; `None` if left unranked.
    pub answers: Vec<Option<i32>>,
}

impl RankOptionsResponseDetails {
    /// The ranks actually assigned, in ascending order.
    pub fn filtered_sorted_answers(&self) -> Vec<i32> {
        let mut ranks: Vec<i32> = self.answers.iter().flatten().copied().collect();
        ranks.sort_unstable();
        ranks
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRecipientsResponseDetails {
    pub answer: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstSumResponseDetails {
    /// Points given to each option, or a single entry when distributing to recipients.
    pub answers: Vec<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionResponseDetails {
    pub answer: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricResponseDetails {
    /// Choice index picked for each sub-question; `None` if skipped.
    pub answer: Vec<Option<usize>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericalScaleResponseDetails {
    pub answer: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResponseDetails {
    pub answer: String,
}

/// Example test data.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl ResponseDetails {
        pub fn text_example() -> Self {
            Self::Text(TextResponseDetails {
                answer: "Great teammate".to_string(),
            })
        }
    }

    impl MsqResponseDetails {
        pub fn selecting(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|s| s.to_string()).collect(),
                is_other: false,
                other_field_content: String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_serialisation() {
        let details = ResponseDetails::Msq(MsqResponseDetails::selecting(&["A", "B"]));
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["questionType"], "MSQ");
        assert_eq!(json["answers"][1], "B");

        let parsed: ResponseDetails = serde_json::from_str(
            r#"{"questionType": "RANK_OPTIONS", "answers": [2, null, 1]}"#,
        )
        .unwrap();
        let expected = ResponseDetails::RankOptions(RankOptionsResponseDetails {
            answers: vec![Some(2), None, Some(1)],
        });
        assert_eq!(parsed, expected);
    }

    #[test]
    fn unranked_options_are_filtered() {
        let details = RankOptionsResponseDetails {
            answers: vec![Some(3), None, Some(1), None],
        };
        assert_eq!(details.filtered_sorted_answers(), vec![1, 3]);
    }
}
