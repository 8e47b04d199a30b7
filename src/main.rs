use std::io;
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use log::{error, warn};
use tokio::sync::mpsc;

use visibility_radar::config::{API_KEY_VAR, DEFAULT_MODEL};
use visibility_radar::{
    FunnelRequest, GeminiClient, PromptLanguage, RadarConfig, RadarError, RadarEvent,
    VisibilityRadar, MAX_COMPETITORS,
};

#[derive(Parser)]
#[command(name = "visibility-radar")]
#[command(about = "Tests how visible a brand is in LLM answers along the marketing funnel", long_about = None)]
#[command(version)]
struct Args {
    /// Brand to measure (required)
    #[arg(long)]
    brand: String,

    /// Product or category the questions are about (required)
    #[arg(long)]
    product: String,

    /// Competitor to track; repeat for up to three
    #[arg(long = "competitor")]
    competitors: Vec<String>,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Language of the generated prompts (en or de)
    #[arg(long, default_value = "en")]
    language: PromptLanguage,

    /// Print the full report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Characters of each answer shown in the detail table
    #[arg(long, default_value_t = 160)]
    answer_width: usize,
}

const EXIT_CONFIG: u8 = 1;
const EXIT_INPUT: u8 = 2;
const EXIT_PROMPT_COUNT: u8 = 3;
const EXIT_RUN: u8 = 4;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    let config = match args
        .api_key
        .clone()
        .ok_or_else(|| RadarError::MissingApiKey(API_KEY_VAR.to_string()))
        .and_then(|key| RadarConfig::new(key, args.model.clone()))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let client = match GeminiClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let request = FunnelRequest::new(&args.brand, &args.product, &args.competitors);
    if let Err(e) = request.validate() {
        warn!("{}", e);
        eprintln!("⚠️  Please provide at least a brand and a product/category, and no more than {} competitors.", MAX_COMPETITORS);
        return ExitCode::from(EXIT_INPUT);
    }

    let (tx, rx) = mpsc::channel(32);
    let printer = tokio::spawn(print_progress(rx, args.json));

    let radar = VisibilityRadar::new(client).with_language(args.language);
    let outcome = radar.run(&request, Some(tx)).await;
    if let Err(e) = printer.await {
        warn!("Progress printer stopped unexpectedly: {}", e);
    }

    match outcome {
        Ok(report) if args.json => {
            if let Err(e) = report.write_json(io::stdout().lock()) {
                error!("Failed to write report: {}", e);
                return ExitCode::from(EXIT_RUN);
            }
            ExitCode::SUCCESS
        }
        Ok(report) => {
            println!("\n📋 Prompts used:\n{}", report.render_prompts());
            println!("📊 Visibility by brand ({}):\n{}", report.model, report.render_chart());
            println!("🧭 Mentions by funnel stage:\n{}", report.render_stage_table());
            println!("🔎 Answers:\n{}", report.render_details(args.answer_width));
            if report.failed_answers() > 0 {
                eprintln!(
                    "⚠️  {} of {} questions failed; see the answers above.",
                    report.failed_answers(),
                    report.answers.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e @ RadarError::PromptCountMismatch { .. }) => {
            eprintln!("⚠️  {}", e);
            eprintln!("------------------------------------------------------------------");
            eprintln!("{}", e.raw_output().unwrap_or_default());
            eprintln!("------------------------------------------------------------------");
            ExitCode::from(EXIT_PROMPT_COUNT)
        }
        Err(e @ RadarError::InvalidRequest(_)) => {
            eprintln!("⚠️  {}", e);
            ExitCode::from(EXIT_INPUT)
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            ExitCode::from(EXIT_RUN)
        }
    }
}

async fn print_progress(mut rx: mpsc::Receiver<RadarEvent>, quiet: bool) {
    while let Some(event) = rx.recv().await {
        if quiet {
            continue;
        }
        match event {
            RadarEvent::GeneratingPrompts { product } => {
                eprintln!("🚀 Generating funnel prompts for '{}'...", product)
            }
            RadarEvent::PromptsReady { count } => eprintln!("✅ {} prompts generated.", count),
            RadarEvent::Querying {
                index,
                total,
                stage,
                ..
            } => eprintln!("   [{}/{}] asking ({})", index + 1, total, stage),
            RadarEvent::AnswerFailed { index, reason } => {
                eprintln!("   [{}] failed: {}", index + 1, reason)
            }
            RadarEvent::Completed { answered, failed } => {
                eprintln!("✅ Done: {} answered, {} failed.", answered, failed)
            }
        }
    }
}
