//! transpdf CLI - layout-preserving PDF translation tool

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use transpdf::{
    create_provider, list_providers, translate::RequestMode, IssueReporter, PipelineOptions,
    ProviderConfig,
};

#[derive(Parser)]
#[command(name = "transpdf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Translate a PDF book with an AI provider, keeping its layout", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "INPUT", required_unless_present_any = ["list_providers", "list_models"])]
    input: Option<PathBuf>,

    /// Output PDF file
    #[arg(value_name = "OUTPUT", required_unless_present_any = ["list_providers", "list_models"])]
    output: Option<PathBuf>,

    /// Target language code (e.g. fr, de, ja)
    #[arg(long, default_value = "fr")]
    lang: String,

    /// AI provider name
    #[arg(long, default_value = "gemini")]
    provider: String,

    /// Provider API key (overrides the provider's env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Provider base URL (useful for local servers)
    #[arg(long)]
    base_url: Option<String>,

    /// Provider model name (defaults to the provider's default)
    #[arg(long)]
    model: Option<String>,

    /// Path to a JSON file with provider settings
    #[arg(long, value_name = "FILE")]
    provider_config: Option<PathBuf>,

    /// Model temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Request mode for OpenAI-compatible providers
    #[arg(long, value_enum)]
    request_mode: Option<RequestModeArg>,

    /// Retries per chunk
    #[arg(long)]
    max_retries: Option<u32>,

    /// HTTP timeout in seconds for provider requests
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum characters per translation request
    #[arg(long, default_value = "4000")]
    chunk_size: usize,

    /// Translate only the first N chunks for quick tests (0 = no limit)
    #[arg(long, default_value = "0")]
    max_chunks: usize,

    /// Layout handling for the output document
    #[arg(long, value_enum, default_value = "soft")]
    layout: LayoutMode,

    /// Start each source page on a new output page (reflow mode only)
    #[arg(long)]
    preserve_pages: bool,

    /// Minimum font size the fitter may shrink to (points)
    #[arg(long)]
    min_font_size: Option<f32>,

    /// Font-size search step (points)
    #[arg(long)]
    font_step: Option<f32>,

    /// Flow overflowing text onto continuation pages instead of truncating
    #[arg(long)]
    overflow_new_page: bool,

    /// Write the formatting issue report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// List available providers and exit
    #[arg(long)]
    list_providers: bool,

    /// List available models for the selected provider and exit
    #[arg(long)]
    list_models: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LayoutMode {
    /// Keep translated text in the original block boxes
    Soft,
    /// Reflow the translated text, ignoring the source layout
    None,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum RequestModeArg {
    /// POST /chat/completions
    Chat,
    /// POST /completions
    Completion,
}

impl From<RequestModeArg> for RequestMode {
    fn from(mode: RequestModeArg) -> Self {
        match mode {
            RequestModeArg::Chat => RequestMode::Chat,
            RequestModeArg::Completion => RequestMode::Completion,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.list_providers {
        for name in list_providers() {
            println!("{name}");
        }
        return Ok(());
    }

    let config = build_provider_config(&cli)?;

    if cli.list_models {
        let provider = create_provider(&cli.provider, config)?;
        let models = provider.list_models()?;
        if models.is_empty() {
            eprintln!("No models available for this provider.");
            return Ok(());
        }
        for name in models {
            println!("{name}");
        }
        return Ok(());
    }

    // required_unless_present_any guarantees these are set past this point
    let input = cli.input.clone().ok_or("missing input file")?;
    let output = cli.output.clone().ok_or("missing output file")?;

    let provider = create_provider(&cli.provider, config)?;
    let options = build_pipeline_options(&cli);
    options.validate()?;

    match cli.layout {
        LayoutMode::None => {
            let pb = spinner("Translating (reflow)...");
            transpdf::translate_pdf_reflow(
                &input,
                &output,
                provider.as_ref(),
                &cli.lang,
                &options,
            )?;
            pb.finish_with_message("Done!");
            println!("{} {}", "Saved to".green(), output.display());
        }
        LayoutMode::Soft => {
            let pb = ProgressBar::new(4);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
                    .progress_chars("#>-"),
            );

            pb.set_message("Extracting layout...");
            let (mut pages, profile) = transpdf::analyze_file(&input, &options.layout)?;
            pb.inc(1);

            pb.set_message("Translating blocks...");
            let max_chunks = options.max_chunks;
            transpdf::translate_blocks(
                &mut pages,
                provider.as_ref(),
                &cli.lang,
                options.chunk_size,
                max_chunks,
            )?;
            pb.inc(1);

            pb.set_message("Fitting text...");
            let mut reporter = IssueReporter::new();
            let plans =
                transpdf::plan_document(&pages, &profile, &options.layout, &mut reporter);
            pb.inc(1);

            pb.set_message("Writing PDF...");
            transpdf::pdf::write::write_layout_to_file(&pages, &plans, &output)?;
            pb.inc(1);
            pb.finish_with_message("Done!");

            println!("{} {}", "Saved to".green(), output.display());
            if reporter.is_empty() {
                println!("{}", "No formatting issues recorded.".green());
            } else {
                println!("{}", reporter.to_text().yellow());
            }
            if let Some(report_path) = &cli.report {
                let report = reporter.into_report();
                fs::write(report_path, serde_json::to_string_pretty(&report)?)?;
                println!("{} {}", "Report written to".green(), report_path.display());
            }
        }
    }

    Ok(())
}

/// Merge the provider config file (if any) with command-line overrides.
fn build_provider_config(cli: &Cli) -> Result<ProviderConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.provider_config {
        Some(path) => {
            let data = fs::read_to_string(path)
                .map_err(|e| format!("provider config not found: {}: {e}", path.display()))?;
            serde_json::from_str(&data)
                .map_err(|e| format!("invalid provider config {}: {e}", path.display()))?
        }
        None => ProviderConfig::default(),
    };

    if cli.model.is_some() {
        config.model = cli.model.clone();
    }
    if cli.api_key.is_some() {
        config.api_key = cli.api_key.clone();
    }
    if cli.base_url.is_some() {
        config.base_url = cli.base_url.clone();
    }
    if let Some(temperature) = cli.temperature {
        config.temperature = temperature;
    }
    if let Some(mode) = cli.request_mode {
        config.request_mode = mode.into();
    }
    if let Some(max_retries) = cli.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    Ok(config)
}

fn build_pipeline_options(cli: &Cli) -> PipelineOptions {
    let mut options = PipelineOptions::default();
    options.chunk_size = cli.chunk_size;
    options.max_chunks = if cli.max_chunks > 0 {
        Some(cli.max_chunks)
    } else {
        None
    };
    options.preserve_pages = cli.preserve_pages;
    if let Some(size) = cli.min_font_size {
        options.layout = options.layout.with_min_font_size(size);
    }
    if let Some(step) = cli.font_step {
        options.layout = options.layout.with_font_step(step);
    }
    if cli.overflow_new_page {
        options.layout = options.layout.with_overflow_to_new_page(true);
    }
    options
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb
}
