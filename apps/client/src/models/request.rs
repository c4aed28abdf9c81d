use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Writing tone requested from the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Formal,
    Friendly,
    Concise,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Friendly => "friendly",
            Tone::Concise => "concise",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "formal" => Ok(Tone::Formal),
            "friendly" => Ok(Tone::Friendly),
            "concise" => Ok(Tone::Concise),
            other => Err(format!(
                "unknown tone '{other}' (expected formal, friendly or concise)"
            )),
        }
    }
}

/// Everything the generator needs for one submission.
///
/// Serializes to the backend's nested wire shape: the job posting and CV text
/// travel inside `job_posting` and `cv_data` objects. `variants` is always sent,
/// even when it is 1, so the backend alone decides the response shape.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub job_posting_text: String,
    pub cv_text: String,
    pub tone: Tone,
    pub variants: u32,
    pub company_name: Option<String>,
    pub position_title: Option<String>,
    pub years_of_experience: Option<u32>,
    pub key_achievements: Option<String>,
    pub custom_instructions: Option<String>,
}

#[derive(Serialize)]
struct WireJobPosting<'a> {
    job_posting_text: &'a str,
}

#[derive(Serialize)]
struct WireCvData<'a> {
    cv_text: &'a str,
}

#[derive(Serialize)]
struct WireGenerationRequest<'a> {
    job_posting: WireJobPosting<'a>,
    cv_data: WireCvData<'a>,
    tone: Tone,
    variants: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    company_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    years_of_experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_achievements: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_instructions: Option<&'a str>,
}

impl Serialize for GenerationRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireGenerationRequest {
            job_posting: WireJobPosting {
                job_posting_text: &self.job_posting_text,
            },
            cv_data: WireCvData {
                cv_text: &self.cv_text,
            },
            tone: self.tone,
            variants: self.variants,
            company_name: self.company_name.as_deref(),
            position_title: self.position_title.as_deref(),
            years_of_experience: self.years_of_experience,
            key_achievements: self.key_achievements.as_deref(),
            custom_instructions: self.custom_instructions.as_deref(),
        }
        .serialize(serializer)
    }
}

/// Body of both export endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub letter: String,
    pub job_title: String,
    pub company_name: String,
}
