//! Static HTML report: the commit dashboard and the hierarchy view as SVG

use crate::error::{Error, Result};
use crate::svg::{render_legend, render_packing, ChartSize, SvgRenderer};
use codemd_core::labels::TextMeasure;
use codemd_core::views::Frame;
use codemd_core::{ChartId, Dashboard, HierarchyNode, PackingView};
use minijinja::{context, Environment};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// HTML template for the report
const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}</title>
    <style>
        :root {
            --bg-primary: #0d1117;
            --bg-secondary: #161b22;
            --bg-tertiary: #21262d;
            --text-primary: #c9d1d9;
            --text-secondary: #8b949e;
            --text-muted: #6e7681;
            --border-color: #30363d;
            --accent-blue: #58a6ff;
            --accent-red: #f85149;
        }

        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }

        .container {
            max-width: 1400px;
            margin: 0 auto;
            padding: 2rem;
        }

        header {
            text-align: center;
            margin-bottom: 2rem;
            padding: 2rem;
            background: var(--bg-secondary);
            border-radius: 16px;
            border: 1px solid var(--border-color);
        }

        .counters {
            display: flex;
            justify-content: center;
            gap: 2rem;
            margin-top: 1rem;
        }

        .number-display {
            font-size: 2rem;
            font-weight: 600;
            fill: var(--accent-blue);
            color: var(--accent-blue);
        }

        .grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(560px, 1fr));
            gap: 1.5rem;
        }

        .chart {
            background: var(--bg-secondary);
            border: 1px solid var(--border-color);
            border-radius: 12px;
            padding: 1rem;
        }

        .chart h2 {
            font-size: 1rem;
            color: var(--text-secondary);
            margin-bottom: 0.5rem;
        }

        .chart svg text {
            fill: var(--text-secondary);
            font-size: 11px;
        }

        .packing {
            margin-top: 2rem;
            text-align: center;
        }

        .node {
            cursor: pointer;
            stroke: var(--border-color);
        }

        .node--leaf {
            stroke: none;
        }

        .label {
            font: 11px "Helvetica Neue", Helvetica, Arial, sans-serif;
            text-shadow: 0 1px 0 #fff, 1px 0 0 #fff, -1px 0 0 #fff, 0 -1px 0 #fff;
            pointer-events: none;
        }

        .legend text {
            fill: var(--text-primary);
            font-size: 14px;
        }

        .hotspots a {
            color: var(--accent-blue);
        }

        .no-data {
            text-align: center;
            padding: 3rem;
            color: var(--text-muted);
        }

        footer {
            text-align: center;
            padding: 2rem;
            color: var(--text-muted);
            font-size: 0.9rem;
        }
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>{{ title }}</h1>
            {% if selection %}
            <p class="subtitle">{{ selection }}</p>
            {% endif %}
            <div class="counters">
                <div id="{{ mounts.total_commits }}"><span class="number-display">{{ totals.commits }}</span> commits</div>
                <div id="{{ mounts.total_bugs }}"><span class="number-display">{{ totals.bugs }}</span> bugs</div>
            </div>
            {% if hotspots_url %}
            <p class="hotspots"><a href="{{ hotspots_url }}">Open hotspots for this selection</a></p>
            {% endif %}
        </header>

        {% if charts %}
        <div class="grid">
            {% for chart in charts %}
            <div class="chart" id="{{ chart.mount_id }}">
                <h2>{{ chart.title }}</h2>
                {{ chart.svg | safe }}
            </div>
            {% endfor %}
        </div>
        {% else %}
        <div class="no-data">
            <p>No commits in this history.</p>
        </div>
        {% endif %}

        <div class="packing">
            <div id="{{ mounts.packing }}">{{ packing_svg | safe }}</div>
            {% if legend_svg %}
            <div id="{{ mounts.legend }}">{{ legend_svg | safe }}</div>
            {% endif %}
        </div>

        <footer>
            <p>Generated by codemd{% if generated_at %} on {{ generated_at }}{% endif %}</p>
        </footer>
    </div>
</body>
</html>
"#;

/// Report configuration
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Title for the report
    pub title: String,
    /// Directory receiving `index.html` and the payload copies
    pub output_dir: PathBuf,
    pub chart_size: ChartSize,
    /// Hotspot server, e.g. `localhost:5000`
    pub hotspots_base: Option<String>,
    /// Project name used in the hotspot URL
    pub project: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Code Analytics".to_string(),
            output_dir: PathBuf::from("codemd-report"),
            chart_size: ChartSize::default(),
            hotspots_base: None,
            project: None,
        }
    }
}

/// Chart data for template rendering
#[derive(Debug, Clone, serde::Serialize)]
struct ChartEntry {
    mount_id: String,
    title: String,
    svg: String,
}

/// Render the report page
pub fn generate_report<M: TextMeasure>(
    dashboard: &Dashboard,
    packing: &PackingView<M>,
    config: &ReportConfig,
) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("report.html", REPORT_TEMPLATE)?;
    let template = env.get_template("report.html")?;

    let defect_max = dashboard
        .bugs_series()
        .iter()
        .map(|p| p.value)
        .fold(0.0, f64::max);
    let mut renderer = SvgRenderer::new(config.chart_size).with_defect_max(defect_max);

    let mut frame = Frame::new();
    frame.extend(ChartId::ALL);
    let report = dashboard.flush(&frame, &mut renderer);
    for (id, err) in &report.errors {
        warn!(chart = %id, error = %err, "chart left out of the report");
    }

    // Counters are rendered by the template itself
    let charts: Vec<ChartEntry> = if dashboard.index().is_empty() {
        Vec::new()
    } else {
        ChartId::ALL
            .into_iter()
            .filter(|id| !matches!(id, ChartId::TotalCommits | ChartId::TotalBugs))
            .filter_map(|id| {
                let mount_id = dashboard.config().mounts.for_chart(id);
                renderer.get(mount_id).map(|svg| ChartEntry {
                    mount_id: mount_id.to_string(),
                    title: id.title().to_string(),
                    svg: svg.to_string(),
                })
            })
            .collect()
    };

    let selection = dashboard.selection().map(|(start, end)| {
        format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
    });

    let hotspots_url = match (&config.hotspots_base, &config.project) {
        (Some(base), Some(project)) => match dashboard.hotspots_url(base, project) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!(error = %e, "no hotspot link in the report");
                None
            }
        },
        _ => None,
    };

    let html = template.render(context! {
        title => &config.title,
        selection => selection,
        totals => dashboard.totals(),
        mounts => &dashboard.config().mounts,
        charts => charts,
        hotspots_url => hotspots_url,
        packing_svg => render_packing(packing),
        legend_svg => render_legend(packing, packing.config().outer_diameter()),
        generated_at => chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    })?;

    Ok(html)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|source| Error::FileWriteError {
        path: path.display().to_string(),
        source,
    })
}

/// Write `index.html` plus `commits.json` and `hierarchy.json` into the
/// configured output directory
pub fn write_report<M: TextMeasure>(
    dashboard: &Dashboard,
    packing: &PackingView<M>,
    hierarchy: &HierarchyNode,
    config: &ReportConfig,
) -> Result<PathBuf> {
    std::fs::create_dir_all(&config.output_dir)?;

    let html = generate_report(dashboard, packing, config)?;
    let index_path = config.output_dir.join("index.html");
    write_file(&index_path, &html)?;

    // Also copy the payloads the report was built from
    let commits = serde_json::to_string_pretty(dashboard.index().records())?;
    write_file(&config.output_dir.join("commits.json"), &commits)?;
    let tree = serde_json::to_string_pretty(hierarchy)?;
    write_file(&config.output_dir.join("hierarchy.json"), &tree)?;

    info!(path = %index_path.display(), "report written");
    Ok(index_path)
}
