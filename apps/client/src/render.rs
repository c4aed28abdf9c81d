//! Plain-text views over a `PageState` snapshot.

use std::fmt::Write as _;

use crate::models::{AnalysisResult, GenerationResponse, SkillMatch};
use crate::notification::{Toast, ToastKind};
use crate::state::{GenerationPhase, PageState};

/// `✓ 92%  Go` / `✗ 40%  Kubernetes`
pub fn render_skill_match(skill: &SkillMatch) -> String {
    let mark = if skill.matched { '✓' } else { '✗' };
    let mut line = format!("{} {}%  {}", mark, skill.confidence_percent(), skill.skill);
    if let Some(evidence) = skill.cv_evidence.as_deref().filter(|e| !e.trim().is_empty()) {
        let _ = write!(line, "  ({})", evidence.trim());
    }
    line
}

pub fn render_result(result: &GenerationResponse) -> String {
    let mut out = String::new();
    match result {
        GenerationResponse::Single(single) => {
            out.push_str("── Cover letter ──\n");
            out.push_str(single.cover_letter.trim_end());
            out.push('\n');
        }
        GenerationResponse::Batch(batch) => {
            for (i, letter) in batch.letters.iter().enumerate() {
                let tone = batch
                    .tone_used
                    .get(i)
                    .map(|t| t.as_str())
                    .unwrap_or("unknown");
                let _ = writeln!(out, "── Variant {} ({}) ──", i + 1, tone);
                out.push_str(letter.trim_end());
                out.push_str("\n\n");
            }
        }
    }

    out.push('\n');
    render_analysis(&mut out, result.analysis());

    if !result.skill_matches().is_empty() {
        out.push_str("\nSkill matches:\n");
        for skill in result.skill_matches() {
            let _ = writeln!(out, "  {}", render_skill_match(skill));
        }
    }
    section(&mut out, "Missing skills", result.missing_skills());
    section(&mut out, "Recommendations", result.recommendations());
    out
}

fn render_analysis(out: &mut String, analysis: &AnalysisResult) {
    out.push_str("Job analysis:\n");
    let fields = [
        ("Company", &analysis.company_name),
        ("Position", &analysis.position_title),
        ("Experience", &analysis.required_experience),
    ];
    for (label, value) in fields {
        if let Some(value) = value.as_deref() {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }
    if !analysis.extracted_skills.is_empty() {
        let _ = writeln!(out, "  Skills: {}", analysis.extracted_skills.join(", "));
    }
    for requirement in &analysis.key_requirements {
        let _ = writeln!(out, "  - {requirement}");
    }
}

fn section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title}:");
    for item in items {
        let _ = writeln!(out, "  • {item}");
    }
}

pub fn render_toast(toast: &Toast) -> String {
    match toast.kind {
        ToastKind::Success => format!("[ok] {}", toast.message),
        ToastKind::Error => format!("[error] {}", toast.message),
    }
}

/// The whole page: status lines, the error slot, the result, then the toast.
pub fn render_page(state: &PageState, toast: Option<&Toast>) -> String {
    let mut out = String::new();

    if let Some(file) = state.upload.file_name.as_deref() {
        let status = if state.upload.in_progress {
            "extracting..."
        } else {
            "ready"
        };
        let _ = writeln!(out, "CV upload: {file} ({status})");
    }
    if let Some(err) = state.upload.last_error.as_deref() {
        let _ = writeln!(out, "CV upload error: {err}");
    }

    match state.generation {
        GenerationPhase::Submitting => out.push_str("Generating...\n"),
        GenerationPhase::Failed => {
            if let Some(err) = state.error.as_deref() {
                let _ = writeln!(out, "Error: {err}");
            }
        }
        GenerationPhase::Idle | GenerationPhase::Succeeded => {}
    }
    if state.is_exporting {
        out.push_str("Exporting...\n");
    }

    if let Some(result) = &state.result {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&render_result(result));
    }

    if let Some(toast) = toast {
        let _ = write!(out, "\n{}\n", render_toast(toast));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Notifier;
    use crate::test_support::{acme_single_response, batch_response};

    fn skill(matched: bool, confidence: f32, name: &str) -> SkillMatch {
        SkillMatch {
            skill: name.to_string(),
            matched,
            confidence,
            cv_evidence: None,
        }
    }

    #[test]
    fn test_skill_row_format() {
        assert_eq!(render_skill_match(&skill(true, 0.92, "Go")), "✓ 92%  Go");
        assert_eq!(
            render_skill_match(&skill(false, 0.4, "Kubernetes")),
            "✗ 40%  Kubernetes"
        );
    }

    #[test]
    fn test_skill_row_includes_evidence() {
        let mut row = skill(true, 0.86, "Rust");
        row.cv_evidence = Some("built a trading engine".to_string());
        assert_eq!(render_skill_match(&row), "✓ 86%  Rust  (built a trading engine)");
    }

    #[test]
    fn test_single_result_view() {
        let rendered = render_result(&acme_single_response());
        assert!(rendered.starts_with("── Cover letter ──\nDear Hiring Manager..."));
        assert!(rendered.contains("  Company: Acme"));
        assert!(rendered.contains("  Experience: 5 years"));
        assert!(rendered.contains("  ✓ 92%  Go"));
        assert!(rendered.contains("  • Highlight distributed systems experience"));
        assert!(!rendered.contains("Missing skills"));
    }

    #[test]
    fn test_batch_view_heads_each_variant_with_tone() {
        let rendered = render_result(&batch_response(3));
        assert!(rendered.contains("── Variant 1 (formal) ──\nLetter variant 1"));
        assert!(rendered.contains("── Variant 2 (friendly) ──"));
        assert!(rendered.contains("── Variant 3 (concise) ──"));
        assert!(rendered.contains("✗ 40%  Kubernetes"));
        assert!(rendered.contains("Missing skills:\n  • Kubernetes"));
    }

    #[test]
    fn test_page_shows_error_slot_and_status() {
        let mut state = PageState::default();
        state.generation = GenerationPhase::Failed;
        state.error = Some("API error: boom".to_string());
        state.is_exporting = true;
        state.upload.file_name = Some("cv.pdf".to_string());
        state.upload.in_progress = true;

        let rendered = render_page(&state, None);
        assert!(rendered.contains("CV upload: cv.pdf (extracting...)"));
        assert!(rendered.contains("Error: API error: boom"));
        assert!(rendered.contains("Exporting..."));
    }

    #[tokio::test]
    async fn test_page_appends_active_toast() {
        let notifier = Notifier::default();
        notifier.error("Please select a PDF file.");
        let state = PageState::default();

        let rendered = render_page(&state, notifier.current().as_ref());
        assert_eq!(rendered.trim(), "[error] Please select a PDF file.");
    }
}
