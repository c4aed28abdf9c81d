use crate::errors::ActionError;
use crate::models::{GenerationRequest, GenerationResponse, Tone};
use crate::upload::UploadState;

/// Form fields as the user edits them.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub job_posting: String,
    pub cv_text: String,
    pub tone: Tone,
    pub variants: u32,
    pub company_name: Option<String>,
    pub position_title: Option<String>,
    pub years_of_experience: Option<u32>,
    pub key_achievements: Option<String>,
    pub custom_instructions: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            job_posting: String::new(),
            cv_text: String::new(),
            tone: Tone::default(),
            variants: 1,
            company_name: None,
            position_title: None,
            years_of_experience: None,
            key_achievements: None,
            custom_instructions: None,
        }
    }
}

impl FormState {
    /// Validates the form and builds the request to submit.
    pub fn to_request(&self) -> Result<GenerationRequest, ActionError> {
        if self.job_posting.trim().is_empty() {
            return Err(ActionError::Validation(
                "Job posting cannot be empty".to_string(),
            ));
        }
        if self.cv_text.trim().is_empty() {
            return Err(ActionError::Validation("CV text cannot be empty".to_string()));
        }
        if self.variants == 0 {
            return Err(ActionError::Validation(
                "At least one variant must be requested".to_string(),
            ));
        }

        Ok(GenerationRequest {
            job_posting_text: self.job_posting.clone(),
            cv_text: self.cv_text.clone(),
            tone: self.tone,
            variants: self.variants,
            company_name: non_blank(&self.company_name),
            position_title: non_blank(&self.position_title),
            years_of_experience: self.years_of_experience,
            key_achievements: non_blank(&self.key_achievements),
            custom_instructions: non_blank(&self.custom_instructions),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Everything the page renders. Owned by the page controller.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub form: FormState,
    pub generation: GenerationPhase,
    /// Single or batch; the enum guarantees never both.
    pub result: Option<GenerationResponse>,
    pub error: Option<String>,
    pub upload: UploadState,
    /// Shared by every export button, across formats and variants.
    pub is_exporting: bool,
    pub(crate) latest_request_id: u64,
}

impl PageState {
    pub fn is_generating(&self) -> bool {
        self.generation == GenerationPhase::Submitting
    }
}
