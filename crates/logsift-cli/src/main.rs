// logsift - OpenSearch error log analysis pipeline

mod config;

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use colored::Colorize;

use logsift_analysis::{analyze, AggregationStats, Aggregator};
use logsift_core::normalizer::{normalization_stats, GroupingConfig, Normalizer};
use logsift_core::parser::{LogPreprocessor, ProcessingStats};
use logsift_fetch::{parse_time_range, SearchClient, WindowedFetcher};
use logsift_report::{save_analysis_json, MarkdownReporter};

#[derive(Parser)]
#[command(name = "logsift")]
#[command(version = "0.1.0")]
#[command(about = "Fetch error logs from OpenSearch and produce per-service diagnostic reports", long_about = None)]
struct Cli {
    /// Time range to analyze (e.g. 1h, 24h, 7d)
    #[arg(long)]
    time: Option<String>,

    /// Path to the YAML configuration file
    #[arg(long, default_value = "./configs/config.yaml")]
    config: String,

    /// Override the report output directory
    #[arg(long)]
    output: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {}", "Fatal:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load(&cli.config)?;
    init_tracing(&config.logging.level);

    let time_range = cli
        .time
        .clone()
        .unwrap_or_else(|| config.analysis.time_range.clone());
    let range = parse_time_range(&time_range)?;

    println!("{}", "🚀 Starting log analysis pipeline".cyan().bold());
    println!();

    // Step 1: fetch across time windows
    println!(
        "{} fetching logs from OpenSearch (past {}, 30m windows)...",
        "📡 Step 1:".cyan().bold(),
        time_range
    );
    let client = SearchClient::new(
        &config.opensearch.url,
        &config.opensearch.username,
        &config.opensearch.password,
        Duration::from_secs(config.query.timeout),
    )?;
    // fail fast before fanning out the window requests
    client.ping().await?;

    let fetcher = WindowedFetcher::new(
        client,
        config.opensearch.indices.clone(),
        config.query.keyword.clone(),
    );
    // Ctrl-C during the fetch aborts in-flight requests; the run continues
    // with whatever windows were already collected
    let raw_logs = fetcher
        .fetch_with_cancel(range, Utc::now(), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    println!("{} fetched {} documents", "✅".green(), raw_logs.len());
    println!();

    if raw_logs.is_empty() {
        println!(
            "{}",
            "⚠️  No logs found in the requested time range.".yellow()
        );
        println!("   Hint: try a longer range or a different keyword");
        println!("   Example: --time 48h");
        return Ok(());
    }

    // Step 2: preprocess
    println!("{} preprocessing logs...", "🔄 Step 2:".cyan().bold());
    let preprocessor = LogPreprocessor::new();
    let parsed = preprocessor.process(&raw_logs);
    let stats = ProcessingStats::collect(&raw_logs, &parsed);
    println!(
        "{} parsed {} of {} documents ({:.1}% success)",
        "✅".green(),
        stats.successfully_parsed,
        stats.total_raw_logs,
        stats.success_rate * 100.0
    );
    println!();

    // Step 3: normalize and group by fingerprint
    println!(
        "{} normalizing and grouping errors...",
        "🔐 Step 3:".cyan().bold()
    );
    let normalizer = Normalizer::new();
    let grouping = GroupingConfig {
        min_samples: 3,
        max_samples: config.analysis.sample_size,
    };
    let groups = normalizer.group(&parsed, grouping);
    let norm_stats = normalization_stats(parsed.len(), &groups);
    println!(
        "{} grouped into {} unique error patterns ({:.1}% duplication)",
        "✅".green(),
        groups.len(),
        norm_stats.duplication_rate * 100.0
    );
    println!();

    // Step 4: aggregate statistics
    println!("{} aggregating statistics...", "📊 Step 4:".cyan().bold());
    let aggregation = Aggregator::new().aggregate(&groups);
    let agg_stats = AggregationStats::from_result(&aggregation);
    println!("{} aggregation complete:", "✅".green());
    println!("   - total errors: {}", agg_stats.total_logs);
    println!("   - services: {}", agg_stats.total_services);
    println!(
        "   - peak hour: {:02}:00 ({} errors)",
        agg_stats.peak_hour, agg_stats.peak_count
    );
    println!(
        "   - average density: {:.2} errors/minute",
        agg_stats.average_density
    );
    println!();

    // Step 5: classify against known issues
    println!("{} analyzing error patterns...", "🔍 Step 5:".cyan().bold());
    let analyses = analyze(&groups);
    let known = analyses.iter().filter(|a| a.is_known).count();
    println!(
        "{} built {} analyses ({} known issues, {} new)",
        "✅".green(),
        analyses.len(),
        known,
        analyses.len() - known
    );
    println!();

    // Step 6: render per-service markdown reports
    println!(
        "{} generating Markdown reports...",
        "📄 Step 6:".cyan().bold()
    );
    let output_dir = cli
        .output
        .unwrap_or_else(|| config.output.report_path.clone());
    let reporter = MarkdownReporter::new(&output_dir);
    let report = reporter.generate_per_service(&analyses, &groups, &aggregation)?;
    println!("{} reports written to {}", "✅".green(), output_dir);
    println!();

    // Step 7: persist the JSON snapshot
    println!("{} saving analysis JSON...", "💾 Step 7:".cyan().bold());
    let snapshot_path = save_analysis_json(&analyses, &aggregation, Path::new(&output_dir))?;
    println!("{} snapshot saved", "✅".green());
    println!();

    // Summary
    println!("{}", "=".repeat(60));
    println!("{}", "✨ Pipeline completed".green().bold());
    println!("{}", "=".repeat(60));
    println!();
    println!("📊 Final statistics:");
    println!("   input documents: {}", raw_logs.len());
    println!("   parsed records: {}", parsed.len());
    println!("   error groups: {}", groups.len());
    println!("   affected services: {}", aggregation.service_stats.len());
    println!("   high-priority issues: {}", report.high_priority_count);
    println!(
        "   processing time: {}ms",
        aggregation.processing_time.as_millis()
    );
    println!();
    println!("📁 Output files:");
    println!("   reports: {}", report.report_path);
    println!("   snapshot: {}", snapshot_path.display());

    Ok(())
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
