mod server;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use feed_rank::api::{explain_request, rank_request, ApiExplainRequest, ApiItem, ApiRankRequest};
use feed_rank::config::{ConfigFile, RankingConfig};
use feed_rank::scoring::RankingPipeline;
use feed_rank::{format_percent, format_score};

#[derive(Parser)]
#[command(name = "feed-rank", about = "Community feed ranking engine")]
struct Cli {
    /// Path to the ranking config (defaults to FEED_RANK_CONFIG_PATH or config/feed_rank.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Tenant profile to apply on top of the defaults
    #[arg(long, global = true)]
    tenant: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Rank(RankArgs),
    Explain(ExplainArgs),
    Config(ConfigArgs),
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct RankArgs {
    /// JSON file with a rank request or a bare array of items; `-` reads stdin
    #[arg(long, default_value = "-")]
    input: String,
    #[arg(long, allow_hyphen_values = true)]
    viewer_lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    viewer_lon: Option<f64>,
    #[arg(long)]
    admin: bool,
    #[arg(long)]
    details: bool,
}

#[derive(Args, Debug, Clone)]
struct ExplainArgs {
    #[arg(long, default_value = "-")]
    input: String,
    /// Id of the item to explain
    #[arg(long)]
    item: String,
    #[arg(long, allow_hyphen_values = true)]
    viewer_lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    viewer_lon: Option<f64>,
    #[arg(long)]
    admin: bool,
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Write the resolved configuration to this path
    #[arg(long)]
    write: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
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
    let (file, path) = ConfigFile::load(cli.config).map_err(|err| err.to_string())?;
    let config = file
        .resolve(cli.tenant.as_deref())
        .map_err(|err| err.to_string())?;
    if let Some(path) = path.as_ref() {
        info!(path = %path.display(), tenant = ?cli.tenant, "resolved ranking config");
    }

    match cli.command {
        Command::Rank(args) => run_rank(args, config),
        Command::Explain(args) => run_explain(args, config),
        Command::Config(args) => run_config(args, &config),
        Command::Serve(args) => server::serve(args, file, config).await,
    }
}

fn run_rank(args: RankArgs, config: RankingConfig) -> Result<(), String> {
    let mut request = read_request(&args.input)?;
    if args.viewer_lat.is_some() || args.viewer_lon.is_some() {
        request.viewer_lat = args.viewer_lat;
        request.viewer_lon = args.viewer_lon;
    }
    if args.admin {
        request.is_admin = Some(true);
    }
    request.include_breakdown = Some(args.details);

    let pipeline = RankingPipeline::new(config);
    let response = rank_request(&pipeline, request, Utc::now());

    for result in &response.results {
        let badges: Vec<&str> = result.badges.iter().map(|badge| badge.label.as_str()).collect();
        println!(
            "{:>4}. {:<24} score {:>10}{}{}",
            result.rank,
            result.item_id,
            format_score(result.composite_score, 3),
            if result.signal_penalty > 0.0 {
                format!(" | penalty {}", format_percent(result.signal_penalty))
            } else {
                String::new()
            },
            if badges.is_empty() {
                String::new()
            } else {
                format!(" [{}]", badges.join(", "))
            }
        );

        if let Some(breakdown) = result.breakdown.as_ref() {
            println!(
                "      engagement {} | freshness {} | geo {} | vitality {} | quality {} | diversity {}",
                format_score(breakdown.base_score, 2),
                format_score(breakdown.freshness, 2),
                format_score(breakdown.geo, 2),
                format_score(breakdown.vitality, 2),
                format_score(breakdown.quality, 2),
                format_score(result.diversity_multiplier, 2)
            );
        }
    }

    if !response.skipped.is_empty() {
        eprintln!("\nSkipped items:");
        for diagnostic in &response.skipped {
            eprintln!(
                "- #{} {}: {}",
                diagnostic.index,
                diagnostic.item_id.as_deref().unwrap_or("<no id>"),
                diagnostic.reason
            );
        }
    }

    Ok(())
}

fn run_explain(args: ExplainArgs, config: RankingConfig) -> Result<(), String> {
    let request = read_request(&args.input)?;
    let item = request
        .items
        .into_iter()
        .find(|item| item.id.as_deref() == Some(args.item.as_str()))
        .ok_or_else(|| format!("item not found: {}", args.item))?;

    let pipeline = RankingPipeline::new(config);
    let response = explain_request(
        &pipeline,
        ApiExplainRequest {
            item,
            viewer_lat: args.viewer_lat.or(request.viewer_lat),
            viewer_lon: args.viewer_lon.or(request.viewer_lon),
            is_admin: Some(args.admin),
        },
        Utc::now(),
    )
    .map_err(|err| err.to_string())?;

    let payload = serde_json::to_string_pretty(&response)
        .map_err(|err| format!("failed to serialize breakdown: {}", err))?;
    println!("{}", payload);
    Ok(())
}

fn run_config(args: ConfigArgs, config: &RankingConfig) -> Result<(), String> {
    match args.write {
        Some(path) => {
            config.write(&path).map_err(|err| err.to_string())?;
            println!("Wrote config to {}", path.display());
        }
        None => {
            let payload = toml::to_string_pretty(config)
                .map_err(|err| format!("failed to serialize config: {}", err))?;
            print!("{}", payload);
        }
    }
    Ok(())
}

fn read_request(input: &str) -> Result<ApiRankRequest, String> {
    let raw = if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|err| format!("failed reading stdin: {}", err))?;
        buffer
    } else {
        std::fs::read_to_string(input).map_err(|err| format!("failed to read {}: {}", input, err))?
    };

    if raw.trim().is_empty() {
        return Err("missing items: pass --input or pipe JSON on stdin".to_string());
    }

    if raw.trim_start().starts_with('[') {
        let items: Vec<ApiItem> =
            serde_json::from_str(&raw).map_err(|err| format!("invalid items: {}", err))?;
        return Ok(ApiRankRequest {
            items,
            ..ApiRankRequest::default()
        });
    }

    serde_json::from_str(&raw).map_err(|err| format!("invalid rank request: {}", err))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
