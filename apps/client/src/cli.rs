//! Command-line host for the page controller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::api_client::{ApiClient, ApiError, CoverLetterApi};
use crate::clipboard::Osc52Clipboard;
use crate::config::Config;
use crate::controller::{ExportOutcome, PageController};
use crate::export::{ExportFormat, FsDownloadSink};
use crate::models::{HealthResponse, TestResponse, Tone};
use crate::render::render_page;
use crate::upload::SelectedFile;

#[derive(Parser, Debug)]
#[command(name = "coverletter")]
#[command(about = "Generate tailored cover letters from a job posting and a CV")]
pub struct Cli {
    /// Backend base URL (overrides COVER_LETTER_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Call the backend's test endpoint
    Ping,
    /// Check backend health
    Health,
    /// Extract text from a CV PDF
    Extract { pdf: PathBuf },
    /// Generate one or more cover letters
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// File holding the job posting text
    #[arg(long)]
    pub job: PathBuf,

    /// File holding the CV as plain text
    #[arg(long, required_unless_present = "cv_pdf", conflicts_with = "cv_pdf")]
    pub cv: Option<PathBuf>,

    /// CV as a PDF, extracted through the backend first
    #[arg(long)]
    pub cv_pdf: Option<PathBuf>,

    #[arg(long, default_value = "formal")]
    pub tone: Tone,

    #[arg(long, default_value_t = 1)]
    pub variants: u32,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub position: Option<String>,

    #[arg(long)]
    pub years: Option<u32>,

    #[arg(long)]
    pub achievements: Option<String>,

    #[arg(long)]
    pub instructions: Option<String>,

    /// Export format; repeat for both
    #[arg(long = "export")]
    pub exports: Vec<ExportFormat>,

    /// Export only this variant (1-based); defaults to every variant
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub variant: Option<u32>,

    /// Copy the letter (or `--variant`) to the terminal clipboard
    #[arg(long)]
    pub copy: bool,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let api_url = cli.api_url.unwrap_or_else(|| config.api_url.clone());
    let api = Arc::new(ApiClient::new(api_url.as_str())?);
    info!("Using cover letter API at {}", api.base_url());

    match cli.command {
        Command::Ping => {
            println!("{}", format_test_result(&api.test_endpoint().await));
        }
        Command::Health => {
            println!("{}", format_health_result(&api.health_check().await));
        }
        Command::Extract { pdf } => {
            let controller = build_controller(api, &config);
            let text = upload(&controller, &pdf).await?;
            println!("{text}");
        }
        Command::Generate(args) => {
            let mut controller = build_controller(api, &config);
            if args.copy {
                controller = controller.with_clipboard(Arc::new(Osc52Clipboard::stdout()));
            }
            generate(&controller, &config, args).await?;
        }
    }
    Ok(())
}

fn build_controller(api: Arc<ApiClient>, config: &Config) -> PageController {
    let sink = Arc::new(FsDownloadSink::new(config.download_dir.clone()));
    PageController::from_config(api, sink, config)
}

async fn upload(controller: &PageController, pdf: &Path) -> Result<String> {
    let file = SelectedFile::from_path(pdf)
        .await
        .with_context(|| format!("Failed to read {}", pdf.display()))?;
    controller
        .upload_cv(file)
        .await
        .map_err(|e| anyhow!(e.user_message()))
}

async fn generate(controller: &PageController, config: &Config, args: GenerateArgs) -> Result<()> {
    let job_posting = read_text(&args.job).await?;
    let cv_text = match (&args.cv, &args.cv_pdf) {
        (Some(path), _) => Some(read_text(path).await?),
        (None, Some(pdf)) => {
            upload(controller, pdf).await?;
            None
        }
        (None, None) => return Err(anyhow!("Either --cv or --cv-pdf is required")),
    };

    controller.edit_form(|form| {
        form.job_posting = job_posting;
        if let Some(cv_text) = cv_text {
            form.cv_text = cv_text;
        }
        form.tone = args.tone;
        form.variants = args.variants;
        form.company_name = args.company;
        form.position_title = args.position;
        form.years_of_experience = args.years;
        form.key_achievements = args.achievements;
        form.custom_instructions = args.instructions;
    });

    let submitted = controller.submit().await;
    print!(
        "{}",
        render_page(&controller.snapshot(), controller.notifier().current().as_ref())
    );
    submitted.map_err(|e| anyhow!(e.user_message()))?;

    if args.copy {
        let variant = args.variant.map_or(0, |n| n as usize - 1);
        controller
            .copy_letter(variant)
            .map_err(|e| anyhow!(e.user_message()))?;
        println!("Copied variant {} to clipboard", variant + 1);
    }

    if args.exports.is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.download_dir.display()))?;

    let letter_count = controller
        .snapshot()
        .result
        .map(|r| r.letters().len())
        .unwrap_or(0);
    let variants: Vec<usize> = match args.variant {
        Some(n) => vec![n as usize - 1],
        None => (0..letter_count).collect(),
    };

    let mut failures = 0;
    for format in &args.exports {
        for &variant in &variants {
            match controller.export(*format, variant).await {
                Ok(ExportOutcome::Saved(path)) => println!("Saved {}: {}", format, path.display()),
                Ok(ExportOutcome::Ignored) => warn!("{} export of variant {} skipped", format, variant + 1),
                Err(e) => {
                    failures += 1;
                    eprintln!("{} export failed: {}", format, e.user_message());
                }
            }
        }
    }
    if failures > 0 {
        return Err(anyhow!("{failures} export(s) failed"));
    }
    Ok(())
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

// ────────────────────────────────────────────────────────────────────────────
// Status checks
// ────────────────────────────────────────────────────────────────────────────

fn status_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Api { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

pub fn format_test_result(result: &Result<TestResponse, ApiError>) -> String {
    match result {
        Ok(response) => format!("API Test Successful: {}", response.message),
        Err(e) => format!("API Test Failed: {}", status_error_message(e)),
    }
}

pub fn format_health_result(result: &Result<HealthResponse, ApiError>) -> String {
    match result {
        Ok(health) => format!("Health Check: {} - {}", health.status, health.service),
        Err(e) => format!("Health Check Failed: {}", status_error_message(e)),
    }
}
