mod api;
mod server;

use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use video_analyzer::config::AnalyzerConfig;
use video_analyzer::{
    analyze, format_compact, format_float, format_number, format_percent, Analysis,
};

#[derive(Parser)]
#[command(name = "video-analyzer", about = "Video performance analyzer")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    Analyze(AnalyzeArgs),
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct AnalyzeArgs {
    #[arg(long)]
    url: Option<String>,
    /// Seed the generator for reproducible numbers.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    details: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
    #[arg(long, default_value = "web/dist")]
    web_root: String,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let (config, config_path) = AnalyzerConfig::load(cli.config)?;
    debug!(?config_path, "loaded config");

    let command = cli.command.unwrap_or(Command::Analyze(AnalyzeArgs::default()));
    match command {
        Command::Analyze(args) => run_analyze(args, &config),
        Command::Serve(args) => {
            info!(host = %args.host, port = args.port, "starting server");
            server::serve(args, config).await
        }
    }
}

fn run_analyze(args: AnalyzeArgs, config: &AnalyzerConfig) -> Result<(), String> {
    let url = read_url(args.url)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let analysis = analyze(&url, config.link.host_policy, &config.generator(), &mut rng)
        .map_err(|err| err.to_string())?;

    if args.json {
        let payload = serde_json::to_string_pretty(&analysis)
            .map_err(|err| format!("failed to serialize analysis: {}", err))?;
        println!("{}", payload);
        return Ok(());
    }

    print_analysis(&analysis, args.details);
    Ok(())
}

fn print_analysis(analysis: &Analysis, details: bool) {
    let metrics = &analysis.metrics;
    println!("{} ({})", metrics.title, analysis.video_id);
    println!(
        "Views: {} ({})",
        format_compact(metrics.views),
        format_number(metrics.views as f64)
    );
    println!(
        "Likes: {} ({} like ratio)",
        format_compact(metrics.likes),
        format_percent(metrics.like_ratio())
    );
    println!("Comments: {}", format_compact(metrics.comments));
    println!("Shares: {}", format_compact(metrics.shares));
    println!(
        "Engagement: {} ({})",
        format_percent(metrics.engagement),
        metrics.engagement_band().label()
    );

    if details {
        println!("\n7-day engagement trend:");
        for point in &metrics.engagement_trend {
            println!("  {}: {}", point.day, format_float(point.engagement, 1));
        }
        println!("\nViewer demographics:");
        for share in &metrics.viewer_demographics {
            println!("  {}: {}%", share.category, share.percentage);
        }
    }

    if !metrics.suggestions.is_empty() {
        println!("\nSuggestions:");
        for suggestion in &metrics.suggestions {
            println!("- {}", suggestion);
        }
    }
}

fn read_url(arg: Option<String>) -> Result<String, String> {
    if let Some(url) = arg {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("failed reading stdin: {}", err))?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Err("missing video url: pass --url or pipe stdin".to_string());
    }
    Ok(trimmed.to_string())
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|value| value.to_lowercase() == "json")
        .unwrap_or(false);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("video_analyzer=info"));

    // Logs go to stderr so `analyze --json` output stays clean.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .with(env_filter)
            .init();
    }
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
