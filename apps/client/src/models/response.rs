use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::request::Tone;

// ────────────────────────────────────────────────────────────────────────────
// Status responses
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResponse {
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedText {
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation responses
// ────────────────────────────────────────────────────────────────────────────

/// A required skill paired with how well the CV evidences it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    pub matched: bool,
    pub confidence: f32, // 0.0 – 1.0
    #[serde(default)]
    pub cv_evidence: Option<String>,
}

impl SkillMatch {
    /// Confidence as a whole percentage, clamped to 0–100.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub position_title: Option<String>,
    #[serde(default)]
    pub required_experience: Option<String>,
    #[serde(default)]
    pub extracted_skills: Vec<String>,
    #[serde(default)]
    pub key_requirements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterResult {
    pub cover_letter: String,
    pub analysis: AnalysisResult,
    #[serde(default)]
    pub skill_matches: Vec<SkillMatch>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub tone_used: Option<Tone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterBatchResult {
    pub letters: Vec<String>,
    /// Aligned by index with `letters`. The backend spells it `tones_used`.
    #[serde(default, alias = "tones_used")]
    pub tone_used: Vec<Tone>,
    pub analysis: AnalysisResult,
    #[serde(default)]
    pub skill_matches: Vec<SkillMatch>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Result of a generate call, decoded once at the HTTP boundary.
///
/// The backend returns a batch exactly when the body carries a `letters` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenerationResponse {
    Single(CoverLetterResult),
    Batch(CoverLetterBatchResult),
}

impl<'de> Deserialize<'de> for GenerationResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let is_batch = value
            .as_object()
            .map(|obj| obj.contains_key("letters"))
            .ok_or_else(|| D::Error::custom("generation response must be a JSON object"))?;

        if is_batch {
            serde_json::from_value(value)
                .map(GenerationResponse::Batch)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(GenerationResponse::Single)
                .map_err(D::Error::custom)
        }
    }
}

impl GenerationResponse {
    pub fn is_batch(&self) -> bool {
        matches!(self, GenerationResponse::Batch(_))
    }

    /// All letters in display order. A single result yields one entry.
    pub fn letters(&self) -> Vec<&str> {
        match self {
            GenerationResponse::Single(r) => vec![r.cover_letter.as_str()],
            GenerationResponse::Batch(b) => b.letters.iter().map(String::as_str).collect(),
        }
    }

    pub fn letter(&self, index: usize) -> Option<&str> {
        match self {
            GenerationResponse::Single(r) if index == 0 => Some(&r.cover_letter),
            GenerationResponse::Single(_) => None,
            GenerationResponse::Batch(b) => b.letters.get(index).map(String::as_str),
        }
    }

    pub fn analysis(&self) -> &AnalysisResult {
        match self {
            GenerationResponse::Single(r) => &r.analysis,
            GenerationResponse::Batch(b) => &b.analysis,
        }
    }

    pub fn skill_matches(&self) -> &[SkillMatch] {
        match self {
            GenerationResponse::Single(r) => &r.skill_matches,
            GenerationResponse::Batch(b) => &b.skill_matches,
        }
    }

    pub fn recommendations(&self) -> &[String] {
        match self {
            GenerationResponse::Single(r) => &r.recommendations,
            GenerationResponse::Batch(b) => &b.recommendations,
        }
    }

    pub fn missing_skills(&self) -> &[String] {
        match self {
            GenerationResponse::Single(r) => &r.missing_skills,
            GenerationResponse::Batch(b) => &b.missing_skills,
        }
    }
}
