use analytics::PreferenceAnalyzer;
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use core_types::{AllocationRecord, MarketSnapshot, Window};
use engine::{AnalyticsService, InMemoryStore, PerformanceEnvelope, SummaryReport};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// The main entry point for the Meridian analytics CLI.
fn main() {
    // Load environment variables (e.g. RUST_LOG) from a .env file if present.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate(args) => handle_simulate(args),
        Commands::Metrics(args) => handle_metrics(args),
        Commands::Preference(args) => handle_preference(args),
        Commands::Backtest(args) => handle_backtest(args),
        Commands::Summary(args) => handle_summary(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Strategy analytics for two-asset DeFi allocations: NAV simulation,
/// performance metrics, allocation preference, and backtesting.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the recorded strategy's NAV curve against buy-and-hold.
    Simulate(SeriesArgs),
    /// Compute windowed performance metrics for the recorded strategy.
    Metrics(MetricsArgs),
    /// Summarize the allocation history's bias and rebalancing.
    Preference(PreferenceArgs),
    /// Replay the engine with a hypothetical allocation schedule.
    Backtest(BacktestArgs),
    /// The combined dashboard overview.
    Summary(SeriesArgs),
}

#[derive(Args)]
struct SeriesArgs {
    /// Path to a JSON array of market snapshots.
    #[arg(long)]
    market: PathBuf,

    /// Path to a JSON array of recorded allocation records.
    /// Omitted: the engine substitutes the configured default split.
    #[arg(long)]
    allocations: Option<PathBuf>,

    /// Pool label used in logs and cache keys.
    #[arg(long, default_value = "wBTC-USDC")]
    pool: String,

    /// Trailing data window to load, in hours.
    #[arg(long, default_value_t = 720)]
    hours: u32,

    /// Print the full report as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct MetricsArgs {
    #[command(flatten)]
    series: SeriesArgs,

    /// Metrics window: 1D, 7D, 30D, or ALL.
    #[arg(long, default_value = "ALL")]
    window: String,
}

#[derive(Args)]
struct PreferenceArgs {
    /// Path to a JSON array of allocation records.
    #[arg(long)]
    allocations: PathBuf,

    /// Print the full report as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct BacktestArgs {
    #[command(flatten)]
    series: SeriesArgs,

    /// Path to the hypothetical allocation schedule to replay.
    #[arg(long)]
    user: PathBuf,
}

// ==============================================================================
// Command Handlers
// ==============================================================================

fn handle_simulate(args: SeriesArgs) -> anyhow::Result<()> {
    let service = build_service(&args)?;
    let result = service.nav_curve(&args.pool, args.hours, false)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let last = result.points.last().expect("curve is never empty");
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Points".to_string(), result.points.len().to_string()]);
    table.add_row(vec!["Final strategy NAV".to_string(), format!("{:.2}", last.strategy_nav)]);
    table.add_row(vec!["Final baseline NAV".to_string(), format!("{:.2}", last.baseline_nav)]);
    table.add_row(vec!["Strategy return".to_string(), fmt_pct(result.strategy_final_return)]);
    table.add_row(vec!["Baseline return".to_string(), fmt_pct(result.baseline_final_return)]);
    table.add_row(vec!["Excess return".to_string(), fmt_pct(result.excess_return)]);
    println!("{table}");
    Ok(())
}

fn handle_metrics(args: MetricsArgs) -> anyhow::Result<()> {
    let window: Window = args.window.parse()?;
    let service = build_service(&args.series)?;
    let envelope = service.performance(&args.series.pool, window, false)?;

    if args.series.json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    println!("{}", render_metrics(&envelope));
    Ok(())
}

fn handle_preference(args: PreferenceArgs) -> anyhow::Result<()> {
    let settings = configuration::load_settings()?;
    let allocations: Vec<AllocationRecord> = load_json(&args.allocations)?;
    let report = PreferenceAnalyzer::new(settings.engine.rebalance_threshold).analyze(&allocations);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Avg lending allocation".to_string(), fmt_pct(report.avg_lending_allocation)]);
    table.add_row(vec!["Avg LP allocation".to_string(), fmt_pct(report.avg_lp_allocation)]);
    table.add_row(vec!["Allocation volatility".to_string(), format!("{:.4}", report.allocation_volatility)]);
    table.add_row(vec!["Rebalances".to_string(), report.rebalance_count.to_string()]);
    table.add_row(vec!["Preference".to_string(), report.preference.to_string()]);
    table.add_row(vec!["History points".to_string(), report.history.len().to_string()]);
    println!("{table}");
    Ok(())
}

fn handle_backtest(args: BacktestArgs) -> anyhow::Result<()> {
    let service = build_service(&args.series)?;
    let user: Vec<AllocationRecord> = load_json(&args.user)?;
    let report = service.backtest(&args.series.pool, &user)?;

    if args.series.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let c = &report.comparison;
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Run ID".to_string(), report.run_id.to_string()]);
    table.add_row(vec!["User return".to_string(), fmt_pct(c.user_return)]);
    table.add_row(vec!["Recorded return".to_string(), fmt_pct(c.recorded_return)]);
    table.add_row(vec!["Baseline return".to_string(), fmt_pct(c.baseline_return)]);
    table.add_row(vec!["User vs recorded".to_string(), fmt_pct(c.user_vs_recorded)]);
    table.add_row(vec!["User vs baseline".to_string(), fmt_pct(c.user_vs_baseline)]);
    table.add_row(vec![
        "User outperforms".to_string(),
        if c.user_outperforms { "yes" } else { "no" }.to_string(),
    ]);
    println!("{table}");
    Ok(())
}

fn handle_summary(args: SeriesArgs) -> anyhow::Result<()> {
    let service = build_service(&args)?;
    let summary = service.summary(&args.pool, false)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", render_summary(&summary));
    Ok(())
}

// ==============================================================================
// Helpers
// ==============================================================================

/// Loads the series files into an in-memory store and wires up the service.
fn build_service(args: &SeriesArgs) -> anyhow::Result<AnalyticsService> {
    let settings = configuration::load_settings()?;

    let snapshots: Vec<MarketSnapshot> = load_json(&args.market)?;
    let allocations: Vec<AllocationRecord> = match &args.allocations {
        Some(path) => load_json(path)?,
        None => Vec::new(),
    };

    tracing::info!(
        pool = %args.pool,
        snapshots = snapshots.len(),
        allocations = allocations.len(),
        "series loaded"
    );

    let mut store = InMemoryStore::new();
    store.insert_pool(args.pool.clone(), snapshots, allocations);
    Ok(AnalyticsService::new(Box::new(store), settings))
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))
}

fn render_metrics(envelope: &PerformanceEnvelope) -> Table {
    let m = &envelope.metrics;
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Window".to_string(), m.window.to_string()]);
    table.add_row(vec!["Period return".to_string(), fmt_pct(m.period_return)]);
    table.add_row(vec!["Annualized return".to_string(), fmt_pct(m.annualized_return)]);
    table.add_row(vec!["Max drawdown".to_string(), fmt_pct(m.max_drawdown)]);
    table.add_row(vec!["Volatility".to_string(), format!("{:.4}", m.volatility)]);
    table.add_row(vec!["Sharpe ratio".to_string(), format!("{:.2}", m.sharpe_ratio)]);
    table.add_row(vec!["Win rate".to_string(), fmt_pct(m.win_rate)]);
    table.add_row(vec!["Excess return".to_string(), fmt_pct(envelope.excess_return)]);
    table
}

fn render_summary(summary: &SummaryReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Section", "Metric", "Value"]);

    let mut row = |section: &str, metric: &str, value: String| {
        table.add_row(vec![section.to_string(), metric.to_string(), value]);
    };

    let p = &summary.performance;
    row("Performance", "Current NAV", format!("{:.2}", p.current_nav));
    row("Performance", "Total return", fmt_pct(p.total_return));
    row("Performance", "Excess return", fmt_pct(p.excess_return));
    row("Performance", "Annualized return", fmt_pct(p.annualized_return));
    row("Performance", "Max drawdown", fmt_pct(p.max_drawdown));
    row("Performance", "Sharpe ratio", format!("{:.2}", p.sharpe_ratio));
    row("Performance", "Win rate", fmt_pct(p.win_rate));

    let a = &summary.allocation;
    row("Allocation", "Current lending", fmt_pct(a.current_lending));
    row("Allocation", "Current LP", fmt_pct(a.current_lp));
    row("Allocation", "Preference", a.preference.to_string());
    row("Allocation", "Rebalances", a.rebalance_count.to_string());

    let m = &summary.market;
    row("Market", "Current price", format!("{:.2}", m.current_price));
    row("Market", "24h change", fmt_pct(m.price_change_24h));
    row("Market", "TVL (USD)", format!("{:.0}", m.pool_tvl_usd));
    row("Market", "Lending APY", fmt_pct(m.lending_apy_annualized));
    row("Market", "LP fee APY", fmt_pct(m.lp_fee_apy_annualized));

    let d = &summary.data_stats;
    row("Data", "Snapshots", d.snapshot_count.to_string());
    row("Data", "Allocation points", d.allocation_count.to_string());
    row("Data", "Coverage (days)", format!("{:.1}", d.coverage_days));

    table
}

fn fmt_pct(value: f64) -> String {
    format!("{:+.2}%", value * 100.0)
}
