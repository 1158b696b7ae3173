use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One of the six admission criteria collected from an applicant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    ReportScore,
    Interview,
    Achievement,
    HomeDistance,
    EconomicStatus,
    Siblings,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::ReportScore,
        Criterion::Interview,
        Criterion::Achievement,
        Criterion::HomeDistance,
        Criterion::EconomicStatus,
        Criterion::Siblings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::ReportScore => "report_score",
            Criterion::Interview => "interview",
            Criterion::Achievement => "achievement",
            Criterion::HomeDistance => "home_distance",
            Criterion::EconomicStatus => "economic_status",
            Criterion::Siblings => "siblings",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw categorical answers, one per criterion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicantCriteria {
    pub report_score: String,
    pub interview: String,
    pub achievement: String,
    pub home_distance: String,
    pub economic_status: String,
    pub siblings: String,
}

impl ApplicantCriteria {
    pub fn value(&self, criterion: Criterion) -> &str {
        match criterion {
            Criterion::ReportScore => &self.report_score,
            Criterion::Interview => &self.interview,
            Criterion::Achievement => &self.achievement,
            Criterion::HomeDistance => &self.home_distance,
            Criterion::EconomicStatus => &self.economic_status,
            Criterion::Siblings => &self.siblings,
        }
    }
}

/// A single prediction request. Identity fields are echoed back and never
/// reach the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    pub criteria: ApplicantCriteria,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassProbability {
    pub class: String,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantIdentity {
    pub name: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub decision_id: Uuid,
    pub label: String,
    pub accepted: bool,
    /// Probability of the configured accepted class.
    pub accepted_probability: f64,
    pub probabilities: Vec<ClassProbability>,
    pub applicant: ApplicantIdentity,
    pub criteria: ApplicantCriteria,
    pub model_version: String,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionOptions {
    pub criterion: Criterion,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsResponse {
    pub criteria: Vec<CriterionOptions>,
}
