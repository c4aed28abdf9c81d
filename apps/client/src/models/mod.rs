pub mod request;
pub mod response;

pub use request::{ExportRequest, GenerationRequest, Tone};
pub use response::{
    AnalysisResult, CoverLetterBatchResult, CoverLetterResult, ExtractedText, GenerationResponse,
    HealthResponse, SkillMatch, TestResponse,
};
