//! codemd CLI - Linked code-analytics views over precomputed payloads

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use codemd::{
    html::{self, ReportConfig},
    svg,
};
use codemd_core::{
    load_commits_from_file, load_hierarchy_from_file, AnnotationMode, Binning, Dashboard,
    DashboardConfig, PackConfig, PackingView, TimeRange, Transition,
};
use codemd_core::labels::MonospaceMeasure;
use codemd_core::zoom::ZoomConfig;

/// codemd: hotspots and crossfiltered commit dashboards for a code base
#[derive(Parser, Debug)]
#[command(name = "codemd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print totals, top authors and churn for a selection
    Summary(SummaryArgs),

    /// Print the hotspot URL for a selection
    Hotspots(HotspotsArgs),

    /// Render the packed hierarchy as SVG
    Pack(PackArgs),

    /// Write a static HTML report
    Report(ReportArgs),
}

/// Which commits to look at
#[derive(clap::Args, Debug)]
struct SelectionArgs {
    /// Path to the commit-list JSON file
    #[arg(short, long, value_name = "FILE")]
    commits: PathBuf,

    /// Start of the window, epoch seconds
    #[arg(long)]
    start: Option<i64>,

    /// End of the window (exclusive), epoch seconds
    #[arg(long)]
    end: Option<i64>,

    /// Restrict to one author
    #[arg(long)]
    author: Option<String>,

    /// Bin dates by week whatever the record count
    #[arg(long, default_value = "false")]
    weekly: bool,
}

#[derive(Parser, Debug)]
struct SummaryArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Parser, Debug)]
struct HotspotsArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Project name on the hotspot server
    #[arg(short, long)]
    project: String,

    /// Hotspot server base URL
    #[arg(long, env = "CODEMD_BASE_URL", default_value = "localhost:5000")]
    base_url: String,
}

#[derive(Parser, Debug)]
struct PackArgs {
    /// Path to the hierarchy JSON file
    #[arg(long, value_name = "FILE")]
    hierarchy: PathBuf,

    /// Annotation mode (file-info, bugs, temporal-coupling, knowledge-map)
    #[arg(short, long, default_value = "knowledge-map")]
    mode: AnnotationMode,

    /// Diameter of the root circle in pixels
    #[arg(long, default_value = "960")]
    diameter: f64,

    /// Slash-separated path of the node to focus
    #[arg(long)]
    focus: Option<String>,

    /// Output SVG file (stdout when absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file for the knowledge-map legend
    #[arg(long)]
    legend: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ReportArgs {
    /// Path to the commit-list JSON file
    #[arg(long, value_name = "FILE")]
    commits: PathBuf,

    /// Path to the hierarchy JSON file
    #[arg(long, value_name = "FILE")]
    hierarchy: PathBuf,

    /// Output directory for the report
    #[arg(short, long, default_value = "codemd-report")]
    output_dir: PathBuf,

    /// Report title
    #[arg(long, default_value = "Code Analytics")]
    title: String,

    /// Project name, enables the hotspot link
    #[arg(short, long)]
    project: Option<String>,

    /// Hotspot server base URL
    #[arg(long, env = "CODEMD_BASE_URL", default_value = "localhost:5000")]
    base_url: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Summary(args) => summary_command(args),
        Commands::Hotspots(args) => hotspots_command(args),
        Commands::Pack(args) => pack_command(args),
        Commands::Report(args) => report_command(args),
    }
}

fn epoch(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).with_context(|| format!("{} is not a valid epoch time", secs))
}

/// Load the commits and apply the requested brush and author
fn load_dashboard(args: &SelectionArgs) -> Result<Dashboard> {
    let records = load_commits_from_file(&args.commits)
        .with_context(|| format!("Failed to load commits from {:?}", args.commits))?;

    let config = DashboardConfig {
        binning: args.weekly.then_some(Binning::Week),
        ..Default::default()
    };
    let mut dashboard =
        Dashboard::build(records, config).with_context(|| "Failed to build the dashboard")?;

    if args.start.is_some() || args.end.is_some() {
        let (first, last) = dashboard
            .selection()
            .context("Cannot select a window of an empty history")?;
        let start = args.start.map(epoch).transpose()?.unwrap_or(first);
        // Keep the last record inside the half-open window
        let end = args
            .end
            .map(epoch)
            .transpose()?
            .unwrap_or(last + chrono::Duration::seconds(1));
        let range = TimeRange::new(start, end).with_context(|| "Invalid time window")?;
        let frame = dashboard.apply(Transition::Brush(range))?;
        debug!(charts = ?frame.views(), "brush applied");
    }

    if let Some(author) = &args.author {
        dashboard.apply(Transition::SelectAuthor(Some(author.clone())))?;
    }

    Ok(dashboard)
}

/// Print a summary of the selection
fn summary_command(args: SummaryArgs) -> Result<()> {
    let dashboard = load_dashboard(&args.selection)?;
    let totals = dashboard.totals();
    let selection = dashboard.selection();
    let top_authors = dashboard.top_authors();
    let churn = dashboard.churn_series();

    match args.format.as_str() {
        "json" => {
            let output = serde_json::json!({
                "totals": totals,
                "binning": format!("{:?}", dashboard.binning()).to_lowercase(),
                "selection": selection.map(|(start, end)| serde_json::json!({
                    "start": start.timestamp(),
                    "end": end.timestamp(),
                })),
                "baseline": {
                    "insertions": dashboard.baseline().insertions,
                    "deletions": dashboard.baseline().deletions,
                },
                "top_authors": top_authors,
                "churn": churn,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            println!("Commits: {}", totals.commits);
            println!("Bugs:    {}", totals.bugs);
            match selection {
                Some((start, end)) => println!(
                    "Window:  {} - {}",
                    start.format("%Y-%m-%d"),
                    end.format("%Y-%m-%d")
                ),
                None => println!("Window:  (empty)"),
            }

            if !top_authors.is_empty() {
                println!("\nTop authors:");
                for (author, commits) in &top_authors {
                    println!("  {:>6}  {}", commits, author);
                }
            }

            if !churn.is_empty() {
                println!("\nChurned / deleted:");
                for point in &churn {
                    println!("  {}  {:.2}", point.date.format("%Y-%m-%d"), point.value);
                }
            }
        }
    }

    Ok(())
}

/// Print the hotspot URL of the selection
fn hotspots_command(args: HotspotsArgs) -> Result<()> {
    let dashboard = load_dashboard(&args.selection)?;
    let url = dashboard
        .hotspots_url(&args.base_url, &args.project)
        .with_context(|| "Failed to build the hotspot URL")?;
    println!("{}", url);
    Ok(())
}

/// Render the packed hierarchy
fn pack_command(args: PackArgs) -> Result<()> {
    let tree = load_hierarchy_from_file(&args.hierarchy)
        .with_context(|| format!("Failed to load hierarchy from {:?}", args.hierarchy))?;

    let config = PackConfig {
        diameter: args.diameter,
        ..Default::default()
    };
    let mut view = PackingView::new(&tree, config, ZoomConfig::default(), MonospaceMeasure::default());
    view.set_mode(args.mode);

    if let Some(path) = &args.focus {
        let node = view
            .tree()
            .find_path(path)
            .with_context(|| format!("No node at '{}'", path))?;
        let focus = view.jump_to(node);
        info!(focus = %view.tree().path(focus), "focused");
    }

    let rendered = svg::render_packing(&view);
    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote {:?}", path);
        }
        None => println!("{}", rendered),
    }

    if let Some(path) = &args.legend {
        match svg::render_legend(&view, config.outer_diameter()) {
            Some(legend) => {
                std::fs::write(path, legend)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                info!("Wrote legend to {:?}", path);
            }
            None => info!(mode = %args.mode, "legend only exists in the knowledge map"),
        }
    }

    Ok(())
}

/// Write the HTML report
fn report_command(args: ReportArgs) -> Result<()> {
    info!("Generating report");

    let records = load_commits_from_file(&args.commits)
        .with_context(|| format!("Failed to load commits from {:?}", args.commits))?;
    let tree = load_hierarchy_from_file(&args.hierarchy)
        .with_context(|| format!("Failed to load hierarchy from {:?}", args.hierarchy))?;

    let dashboard = Dashboard::build(records, DashboardConfig::default())
        .with_context(|| "Failed to build the dashboard")?;
    let packing = PackingView::for_container(&tree, 960.0, 960.0);

    let config = ReportConfig {
        title: args.title,
        output_dir: args.output_dir,
        hotspots_base: args.project.as_ref().map(|_| args.base_url.clone()),
        project: args.project,
        ..Default::default()
    };

    let index = html::write_report(&dashboard, &packing, &tree, &config)
        .with_context(|| "Failed to generate report")?;
    info!("Report generated at {:?}", index);

    Ok(())
}
