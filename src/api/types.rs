//! Assessment result types returned by the backend
//!
//! Results are immutable once received and rendered read-only. Scores are
//! bounded decimals in [0, 10]; any field the backend omits renders as
//! "N/A" rather than failing the whole response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk classification attached to an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Badge label, upper-cased the way the results view shows it
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
        }
    }
}

/// One completed cognitive assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub overall_feedback: Option<String>,

    #[serde(default)]
    pub memory_score: Option<f64>,
    #[serde(default)]
    pub memory_feedback: Option<String>,

    #[serde(default)]
    pub language_score: Option<f64>,
    #[serde(default)]
    pub language_feedback: Option<String>,

    #[serde(default)]
    pub executive_function_score: Option<f64>,
    #[serde(default)]
    pub executive_function_feedback: Option<String>,

    #[serde(default)]
    pub orientation_score: Option<f64>,
    #[serde(default)]
    pub orientation_feedback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_wire_values() {
        assert_eq!(
            serde_json::from_str::<RiskLevel>(r#""moderate""#).unwrap(),
            RiskLevel::Moderate
        );
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), r#""high""#);
    }

    #[test]
    fn test_risk_level_labels() {
        assert_eq!(RiskLevel::Low.label(), "LOW");
        assert_eq!(RiskLevel::Moderate.label(), "MODERATE");
        assert_eq!(RiskLevel::High.label(), "HIGH");
    }

    #[test]
    fn test_assessment_parses_full_payload() {
        let json = r#"{
            "id": "a-1",
            "session_id": "s-1",
            "created_at": "2025-06-01T12:00:00Z",
            "overall_score": 7.2,
            "risk_level": "moderate",
            "overall_feedback": "Mild concerns",
            "memory_score": 6.5,
            "memory_feedback": "Some repetition",
            "language_score": 7.8,
            "executive_function_score": 7.0,
            "orientation_score": 7.5
        }"#;

        let assessment: Assessment = serde_json::from_str(json).unwrap();
        assert_eq!(assessment.overall_score, Some(7.2));
        assert_eq!(assessment.risk_level, Some(RiskLevel::Moderate));
        assert_eq!(assessment.memory_score, Some(6.5));
        assert_eq!(assessment.language_feedback, None);
    }

    #[test]
    fn test_assessment_tolerates_missing_fields() {
        let assessment: Assessment = serde_json::from_str(r#"{"overall_score": 4.0}"#).unwrap();
        assert_eq!(assessment.overall_score, Some(4.0));
        assert!(assessment.risk_level.is_none());
        assert!(assessment.id.is_none());
    }
}
