//! Data models for the survey service.
//!
//! This module contains the core data structures shared by the
//! validator, the aggregator, the store backends and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Number of scored dimensions in every assessment.
pub const DIMENSION_COUNT: usize = 8;

/// Lowest accepted dimension score.
pub const MIN_SCORE: i64 = 1;

/// Highest accepted dimension score.
pub const MAX_SCORE: i64 = 5;

/// One of the eight fixed attributes a respondent scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    ProjectProgressTransparency,
    RequirementResponseSpeed,
    TeamCollaborationEfficiency,
    DeliveryQualityStability,
    IssueDiscoveryTimeliness,
    ResourceAllocationEfficiency,
    ContinuousImprovementAbility,
    InformationTransmissionEffectiveness,
}

impl Dimension {
    /// All dimensions, in submission order.
    pub const ALL: [Dimension; DIMENSION_COUNT] = [
        Dimension::ProjectProgressTransparency,
        Dimension::RequirementResponseSpeed,
        Dimension::TeamCollaborationEfficiency,
        Dimension::DeliveryQualityStability,
        Dimension::IssueDiscoveryTimeliness,
        Dimension::ResourceAllocationEfficiency,
        Dimension::ContinuousImprovementAbility,
        Dimension::InformationTransmissionEffectiveness,
    ];

    /// Position of this dimension inside a score array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Storage column name.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::ProjectProgressTransparency => "project_progress_transparency",
            Dimension::RequirementResponseSpeed => "requirement_response_speed",
            Dimension::TeamCollaborationEfficiency => "team_collaboration_efficiency",
            Dimension::DeliveryQualityStability => "delivery_quality_stability",
            Dimension::IssueDiscoveryTimeliness => "issue_discovery_timeliness",
            Dimension::ResourceAllocationEfficiency => "resource_allocation_efficiency",
            Dimension::ContinuousImprovementAbility => "continuous_improvement_ability",
            Dimension::InformationTransmissionEffectiveness => {
                "information_transmission_effectiveness"
            }
        }
    }

    /// Key of this dimension's mean in the summary payload.
    pub fn summary_key(self) -> &'static str {
        match self {
            Dimension::ProjectProgressTransparency => "avg_project_progress",
            Dimension::RequirementResponseSpeed => "avg_requirement_response",
            Dimension::TeamCollaborationEfficiency => "avg_collaboration",
            Dimension::DeliveryQualityStability => "avg_delivery_quality",
            Dimension::IssueDiscoveryTimeliness => "avg_issue_discovery",
            Dimension::ResourceAllocationEfficiency => "avg_resource_allocation",
            Dimension::ContinuousImprovementAbility => "avg_improvement",
            Dimension::InformationTransmissionEffectiveness => "avg_information_transmission",
        }
    }

    /// Human-readable label used in exports and text output.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::ProjectProgressTransparency => "Project progress transparency",
            Dimension::RequirementResponseSpeed => "Requirement response speed",
            Dimension::TeamCollaborationEfficiency => "Team collaboration efficiency",
            Dimension::DeliveryQualityStability => "Delivery quality stability",
            Dimension::IssueDiscoveryTimeliness => "Issue discovery timeliness",
            Dimension::ResourceAllocationEfficiency => "Resource allocation efficiency",
            Dimension::ContinuousImprovementAbility => "Continuous improvement ability",
            Dimension::InformationTransmissionEffectiveness => {
                "Information transmission effectiveness"
            }
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Eight validated dimension scores, each in `[MIN_SCORE, MAX_SCORE]`.
///
/// Only [`crate::validation`] and the store backends construct this type,
/// so holding one means the range check has already happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scores([u8; DIMENSION_COUNT]);

impl Scores {
    pub(crate) fn from_validated(values: [u8; DIMENSION_COUNT]) -> Self {
        Self(values)
    }

    /// Rebuild scores read back from storage, rejecting out-of-range values.
    pub fn from_stored(values: [i64; DIMENSION_COUNT]) -> Option<Self> {
        let mut scores = [0u8; DIMENSION_COUNT];
        for (slot, value) in scores.iter_mut().zip(values) {
            if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return None;
            }
            *slot = value as u8;
        }
        Some(Self(scores))
    }

    /// Score for a single dimension.
    pub fn get(&self, dimension: Dimension) -> u8 {
        self.0[dimension.index()]
    }

    /// Raw values in dimension order.
    pub fn values(&self) -> &[u8; DIMENSION_COUNT] {
        &self.0
    }

    /// Sum of all eight scores.
    pub fn total(&self) -> u32 {
        self.0.iter().map(|&v| u32::from(v)).sum()
    }

    /// Iterate `(dimension, score)` pairs in dimension order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, u8)> + '_ {
        Dimension::ALL.iter().map(move |&d| (d, self.get(d)))
    }
}

impl Serialize for Scores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(DIMENSION_COUNT))?;
        for (dimension, score) in self.iter() {
            map.serialize_entry(dimension.column(), &score)?;
        }
        map.end()
    }
}

/// Opaque survey identity token.
///
/// Generated identifiers are random v4 UUIDs. Identifiers arriving from
/// callers are accepted verbatim: read paths never reject an unknown or
/// malformed id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyId(String);

impl SurveyId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SurveyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SurveyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named collection point for assessments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Survey {
    #[serde(rename = "survey_id")]
    pub id: SurveyId,
    #[serde(rename = "survey_name")]
    pub name: String,
    #[serde(rename = "created_date")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "is_active")]
    pub active: bool,
}

/// A validated submission that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssessment {
    pub survey_id: SurveyId,
    pub respondent_name: String,
    pub respondent_team: String,
    pub scores: Scores,
    /// Mean of `scores`, fixed at write time.
    pub overall_score: f64,
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// One stored respondent submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub id: i64,
    pub survey_id: SurveyId,
    pub respondent_name: String,
    pub respondent_team: String,
    #[serde(rename = "submission_date")]
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub scores: Scores,
    pub overall_score: f64,
    pub notes: Option<String>,
}

impl Assessment {
    /// Attach a store-assigned id to a new submission.
    pub fn from_new(id: i64, new: NewAssessment) -> Self {
        Self {
            id,
            survey_id: new.survey_id,
            respondent_name: new.respondent_name,
            respondent_team: new.respondent_team,
            submitted_at: new.submitted_at,
            scores: new.scores,
            overall_score: new.overall_score,
            notes: new.notes,
        }
    }
}

/// Count and means across every assessment of one survey.
///
/// All means are `None` when `total_responses == 0`. Zero is a valid mean,
/// so absence is never encoded as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryAggregate {
    pub total_responses: u64,
    pub average_overall_score: Option<f64>,
    pub dimension_averages: [Option<f64>; DIMENSION_COUNT],
}

impl SummaryAggregate {
    /// The aggregate of a survey with no assessments.
    pub fn empty() -> Self {
        Self {
            total_responses: 0,
            average_overall_score: None,
            dimension_averages: [None; DIMENSION_COUNT],
        }
    }

    pub fn dimension_average(&self, dimension: Dimension) -> Option<f64> {
        self.dimension_averages[dimension.index()]
    }
}

impl Serialize for SummaryAggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + DIMENSION_COUNT))?;
        map.serialize_entry("total_responses", &self.total_responses)?;
        map.serialize_entry("average_overall_score", &self.average_overall_score)?;
        for dimension in Dimension::ALL {
            map.serialize_entry(dimension.summary_key(), &self.dimension_average(dimension))?;
        }
        map.end()
    }
}

/// Descriptive statistics of one dimension, as exported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionStats {
    pub dimension: Dimension,
    pub mean: f64,
    pub min: u8,
    pub max: u8,
    /// Population standard deviation.
    pub std_dev: f64,
}
