//! Dioxus dashboard for codemd
//!
//! A pure Rust frontend compiled to WebAssembly. It fetches `commits.json`
//! and `hierarchy.json` (the payloads `codemd report` writes next to its
//! `index.html`) and drives the codemd engine from DOM events:
//!
//! - the zoomable hierarchy view, recoloured by annotation mode, with the
//!   knowledge-map legend and a hover tooltip;
//! - the linked commit charts: brushing the timeline refocuses the other
//!   charts, clicking an author in the top-authors chart filters by author;
//! - a link to the hotspot view of the current selection.
//!
//! All styling is inline in Rust code, see [`styles`].

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use codemd_core::mode::{LegendConfig, LegendEntry};
use codemd_core::{
    parse_commits, parse_hierarchy, AnnotationMode, ChartId, ChartSeries, ChartView, CommitRecord,
    Dashboard, DashboardConfig, Debouncer, Frame, HierarchyNode, NodeId, PackingView, TimeRange,
    Transition, ViewRenderer, ZoomEvent,
};
use dioxus::prelude::*;
use gloo_net::http::Request;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

mod styles;

use styles::*;

/// Global theme context - true = dark mode
#[derive(Clone, Copy)]
struct ThemeCtx(Signal<bool>);

/// Engine state shared by every panel
#[derive(Clone, Copy)]
struct EngineCtx {
    dashboard: Signal<Option<Dashboard>>,
    charts: Signal<ChartStore>,
    packing: Signal<Option<PackingView>>,
}

const COMMITS_URL: &str = "commits.json";
const HIERARCHY_URL: &str = "hierarchy.json";

/// Container side used until the first resize observation
const DEFAULT_SIDE: f64 = 600.0;

const CHART_WIDTH: f64 = 560.0;
const CHART_HEIGHT: f64 = 200.0;
const PADDING: f64 = 40.0;

/// Drags narrower than this (in chart units) clear the brush
const MIN_BRUSH_WIDTH: f64 = 3.0;

/// Charts drawn in the right column, counters go to the header
const CHART_ORDER: [ChartId; 6] = [
    ChartId::Timeline,
    ChartId::Churn,
    ChartId::TotalLoc,
    ChartId::CodeFrequency,
    ChartId::Defects,
    ChartId::TopAuthors,
];

/// Last data each chart was redrawn with.
///
/// Filled by [`Dashboard::flush`], so only the charts of a frame change.
#[derive(Debug, Default)]
struct ChartStore {
    charts: BTreeMap<ChartId, (ChartView, ChartSeries)>,
}

impl ChartStore {
    fn get(&self, id: ChartId) -> Option<&(ChartView, ChartSeries)> {
        self.charts.get(&id)
    }

    fn number(&self, id: ChartId) -> Option<f64> {
        match self.get(id) {
            Some((_, ChartSeries::Number(value))) => Some(*value),
            _ => None,
        }
    }
}

impl ViewRenderer for ChartStore {
    fn render(&mut self, view: &ChartView, series: &ChartSeries) -> codemd_core::Result<()> {
        if view.kind != view.id.kind() {
            return Err(codemd_core::Error::RenderError {
                view: view.id.to_string(),
                reason: format!("mounted as {:?}", view.kind),
            });
        }
        self.charts.insert(view.id, (view.clone(), series.clone()));
        Ok(())
    }
}

fn main() {
    tracing_wasm::set_as_global_default();
    launch(App);
}

#[component]
fn App() -> Element {
    // Theme state - default to dark mode
    let dark_mode = use_signal(|| true);
    use_context_provider(|| ThemeCtx(dark_mode));

    let mut dashboard = use_signal(|| None::<Dashboard>);
    let mut charts = use_signal(ChartStore::default);
    let mut packing = use_signal(|| None::<PackingView>);
    use_context_provider(|| EngineCtx {
        dashboard,
        charts,
        packing,
    });

    let mut error = use_signal(|| None::<String>);
    let mut loading = use_signal(|| true);

    use_effect(move || {
        spawn(async move {
            let loaded = load_payloads().await.and_then(|(records, tree)| {
                let board = Dashboard::build(records, DashboardConfig::default())
                    .map_err(|e| format!("Failed to index commits: {}", e))?;
                Ok((board, tree))
            });

            match loaded {
                Ok((board, tree)) => {
                    let mut store = ChartStore::default();
                    let mut frame = Frame::new();
                    frame.extend(ChartId::ALL);
                    let report = board.flush(&frame, &mut store);
                    for (id, err) in &report.errors {
                        warn!(chart = %id, error = %err, "chart not drawn");
                    }
                    info!(records = board.index().len(), binning = ?board.binning(), "dashboard ready");

                    charts.set(store);
                    dashboard.set(Some(board));
                    packing.set(Some(PackingView::for_container(&tree, DEFAULT_SIDE, DEFAULT_SIDE)));
                }
                Err(e) => error.set(Some(e)),
            }
            loading.set(false);
        });
    });

    let dark = *dark_mode.read();

    rsx! {
        div { style: "{app_style(dark)}",
            Header {}

            if *loading.read() {
                LoadingState {}
            } else if let Some(err) = error.read().as_ref() {
                ErrorState { message: err.clone() }
            } else {
                main { style: "{main_content_style(dark)}",
                    PackingPanel {}
                    ChartsPanel {}
                }
            }
        }
    }
}

#[component]
fn Header() -> Element {
    let ThemeCtx(mut dark_mode) = use_context::<ThemeCtx>();
    let dark = *dark_mode.read();
    let ctx = use_context::<EngineCtx>();

    let (commits, bugs) = {
        let store = ctx.charts.read();
        (
            store.number(ChartId::TotalCommits),
            store.number(ChartId::TotalBugs),
        )
    };
    let (window, hotspots) = match ctx.dashboard.read().as_ref() {
        Some(board) => (
            board.selection().map(|(start, end)| {
                format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }),
            hotspot_target().and_then(|(base, project)| match board.hotspots_url(&base, &project) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    debug!(error = %e, "no hotspot link");
                    None
                }
            }),
        ),
        None => (None, None),
    };

    rsx! {
        header { style: "{header_style(dark)}",
            h1 { style: "{title_style(dark)}", "codemd" }

            div { style: "{counters_style(dark)}",
                if let Some(commits) = commits {
                    span { id: "total-commits",
                        span { style: "{number_style(dark)}", "{commits}" }
                        span { style: "{muted_style(dark)}", "commits" }
                    }
                }
                if let Some(bugs) = bugs {
                    span { id: "total-bugs",
                        span { style: "{number_style(dark)}", "{bugs}" }
                        span { style: "{muted_style(dark)}", "bugs" }
                    }
                }
                if let Some(window) = window {
                    span { style: "{muted_style(dark)}", "{window}" }
                }
                if let Some(url) = hotspots {
                    a { style: "{link_style(dark)}", href: "{url}", "hotspots for this selection" }
                }
            }

            div {
                button {
                    style: "{toggle_btn_style(dark)}",
                    onclick: move |_| apply(ctx, Transition::Reset),
                    "reset"
                }
                button {
                    style: "{toggle_btn_style(dark)}",
                    onclick: move |_| {
                        let current = *dark_mode.read();
                        dark_mode.set(!current);
                    },
                    if dark { "☀ light" } else { "☾ dark" }
                }
            }
        }
    }
}

#[component]
fn LoadingState() -> Element {
    let ThemeCtx(dark_mode) = use_context::<ThemeCtx>();
    let dark = *dark_mode.read();

    rsx! {
        div { style: "{loading_style(dark)}",
            "Loading..."
        }
    }
}

#[component]
fn ErrorState(message: String) -> Element {
    let ThemeCtx(dark_mode) = use_context::<ThemeCtx>();
    let dark = *dark_mode.read();

    rsx! {
        div { style: "{error_style(dark)}",
            strong { "Error: " }
            "{message}"
        }
    }
}

#[component]
fn EmptyState() -> Element {
    let ThemeCtx(dark_mode) = use_context::<ThemeCtx>();
    let dark = *dark_mode.read();

    rsx! {
        div { style: "{empty_style(dark)}",
            p { "No commits in this history." }
            code { style: "{code_style(dark)}", "codemd report --commits commits.json --hierarchy hierarchy.json" }
        }
    }
}

// ============================================================================
// Hierarchy view
// ============================================================================

#[component]
fn PackingPanel() -> Element {
    let ThemeCtx(dark_mode) = use_context::<ThemeCtx>();
    let dark = *dark_mode.read();
    let ctx = use_context::<EngineCtx>();
    let mut packing = ctx.packing;

    let mut hovered = use_signal(|| None::<NodeId>);
    let animating = use_signal(|| false);
    let mut debouncer = use_signal(Debouncer::default);
    let mut pending_size = use_signal(|| None::<f64>);

    let snapshot = packing.read().as_ref().map(|view| {
        let side = view.config().outer_diameter();
        (
            side,
            view.config().margin,
            view.mode(),
            view.circles(),
            view.labels(),
            view.legend().map(|legend| legend.entries().to_vec()),
            view.legend_layout(side),
            hovered().and_then(|id| view.tooltip(id)),
        )
    });
    let Some((side, margin, mode, circles, labels, legend, layout, tooltip)) = snapshot else {
        return rsx! {};
    };

    rsx! {
        section { style: "{card_style(dark)}", id: "packing-container",
            div { style: "{card_header_style(dark)}",
                h2 { style: "{card_title_style(dark)}", "Hotspots" }
                div {
                    for candidate in AnnotationMode::ALL {
                        button {
                            key: "{candidate.slug()}",
                            style: "{mode_btn_style(dark, candidate == mode)}",
                            onclick: move |_| {
                                if let Some(view) = packing.write().as_mut() {
                                    view.set_mode(candidate);
                                }
                            },
                            "{candidate.label()}"
                        }
                    }
                }
            }

            div {
                style: "{packing_frame_style(dark)}",
                onresize: move |evt| {
                    let Ok(size) = evt.data().get_content_box_size() else {
                        return;
                    };
                    pending_size.set(Some(size.width));
                    debouncer.write().event(now());
                    spawn(async move {
                        sleep(debouncer.peek().delay()).await;
                        if !debouncer.write().poll(now()) {
                            return;
                        }
                        if let Some(width) = pending_size() {
                            if let Some(view) = packing.write().as_mut() {
                                view.resize(width, width);
                            }
                            apply(ctx, Transition::Resize);
                        }
                    });
                },

                svg {
                    style: "width: 100%; height: auto;",
                    view_box: "0 0 {side} {side}",
                    onclick: move |evt| {
                        let modifier = evt.modifiers().alt();
                        navigate(packing, animating, move |view, at| view.zoom_out(modifier, at));
                    },

                    g { transform: "translate({margin},{margin})",
                        for c in circles {
                            {
                                let id = c.id;
                                let leaf = c.class == codemd_core::CircleClass::Leaf;
                                rsx! {
                                    circle {
                                        key: "{id.0}",
                                        class: "{c.class.css()}",
                                        cx: "{c.x:.2}",
                                        cy: "{c.y:.2}",
                                        r: "{c.r:.2}",
                                        fill: "{c.style.fill}",
                                        "fill-opacity": "{c.style.fill_opacity}",
                                        stroke: "{circle_stroke(dark, leaf)}",
                                        onclick: move |evt| {
                                            evt.stop_propagation();
                                            let modifier = evt.modifiers().alt();
                                            navigate(packing, animating, move |view, at| view.click(id, modifier, at));
                                        },
                                        onmouseenter: move |_| hovered.set(Some(id)),
                                        onmouseleave: move |_| hovered.set(None),
                                    }
                                }
                            }
                        }

                        for label in labels {
                            text {
                                key: "label-{label.id.0}",
                                x: "{label.x:.2}",
                                y: "{label.y:.2}",
                                style: "{label_style(dark)} fill-opacity: {label.fill_opacity}; opacity: {label.opacity};",
                                "{label.text}"
                            }
                        }
                    }
                }
            }

            if let Some(tip) = tooltip {
                div { style: "{hover_tooltip_style(dark)}",
                    div { style: "font-weight: 600; margin-bottom: 0.25rem;", "{tip.title}" }
                    if let Some(heading) = tip.heading.as_ref() {
                        div { style: "{muted_style(dark)} margin-bottom: 0.2rem;", "{heading}" }
                    }
                    for (i, line) in tip.lines.iter().enumerate() {
                        {
                            let label_color = line.label_color.clone().unwrap_or_else(|| "inherit".to_string());
                            let value_color = line.value_color.clone().unwrap_or_else(|| "inherit".to_string());
                            rsx! {
                                div { key: "{i}", style: "display: flex; justify-content: space-between; gap: 0.75rem;",
                                    span { style: "color: {label_color};", "{line.label}" }
                                    span { style: "font-weight: 600; color: {value_color};", "{line.value}" }
                                }
                            }
                        }
                    }
                }
            }

            if let (Some(entries), Some(layout)) = (legend, layout) {
                Legend { entries, width: layout.width, height: layout.height, slots: layout.slots.iter().map(|s| (s.x, s.y)).collect::<Vec<_>>() }
            }
        }
    }
}

/// Knowledge-map legend
#[component]
fn Legend(entries: Vec<LegendEntry>, width: f64, height: f64, slots: Vec<(f64, f64)>) -> Element {
    let ThemeCtx(dark_mode) = use_context::<ThemeCtx>();
    let dark = *dark_mode.read();
    let config = LegendConfig::default();

    rsx! {
        div { id: "legend", style: "margin-top: 0.5rem;",
            svg {
                style: "width: 100%; height: auto;",
                view_box: "0 0 {width} {height}",
                for (i, (entry, (x, y))) in entries.iter().zip(slots.iter()).enumerate() {
                    g { key: "{i}", transform: "translate({x},{y})",
                        rect {
                            width: "{config.rect_size}",
                            height: "{config.rect_size}",
                            fill: "{entry.color}",
                            stroke: "{entry.color}",
                        }
                        text {
                            x: "{config.rect_size + config.spacing}",
                            y: "{config.rect_size - config.spacing}",
                            fill: "{legend_text_color(dark)}",
                            "font-size": "14",
                            "{entry.label}"
                        }
                    }
                }
            }
        }
    }
}

/// Start a zoom and drive it with animation frames until it settles
fn navigate(
    mut packing: Signal<Option<PackingView>>,
    mut animating: Signal<bool>,
    start: impl FnOnce(&mut PackingView, Duration) -> NodeId,
) {
    let focus = match packing.write().as_mut() {
        Some(view) => start(view, now()),
        None => return,
    };
    debug!(target: "zoom", focus = focus.0, "zoom started");

    if *animating.peek() {
        return;
    }
    animating.set(true);
    spawn(async move {
        loop {
            next_frame().await;
            let event = match packing.write().as_mut() {
                Some(view) => view.tick(now()),
                None => break,
            };
            match event {
                ZoomEvent::Animating { .. } => {}
                ZoomEvent::Settled { focus, k } => {
                    debug!(target: "zoom", focus = focus.0, k, "zoom settled");
                    break;
                }
                ZoomEvent::Idle => break,
            }
        }
        animating.set(false);
    });
}

// ============================================================================
// Commit charts
// ============================================================================

#[component]
fn ChartsPanel() -> Element {
    let ctx = use_context::<EngineCtx>();
    let empty = ctx
        .dashboard
        .read()
        .as_ref()
        .map_or(true, |board| board.index().is_empty());

    rsx! {
        div {
            if empty {
                EmptyState {}
            } else {
                for id in CHART_ORDER {
                    ChartCard { key: "{id}", id }
                }
            }
        }
    }
}

#[component]
fn ChartCard(id: ChartId) -> Element {
    let ThemeCtx(dark_mode) = use_context::<ThemeCtx>();
    let dark = *dark_mode.read();
    let ctx = use_context::<EngineCtx>();

    // Brush drag, in chart units
    let mut drag = use_signal(|| None::<(f64, f64)>);
    let mut chart_div_width = use_signal(|| 0.0f64);

    let Some((view, series)) = ctx.charts.read().get(id).cloned() else {
        return rsx! {};
    };
    let mount_id = view.mount_id.clone();
    let brushable = id == ChartId::Timeline;

    let body = match (&series, view.domain.or(view.original_domain)) {
        (ChartSeries::Row(rows), _) => row_chart(ctx, rows, dark),
        (ChartSeries::Line(points), Some(domain)) if id == ChartId::Defects => {
            let colors: Vec<&'static str> = match ctx.dashboard.read().as_ref() {
                Some(board) => points.iter().map(|p| board.defect_color(p.value)).collect(),
                None => Vec::new(),
            };
            bar_chart(points, &colors, &domain, dark)
        }
        (ChartSeries::Line(points), Some(domain)) => {
            let line = codemd_core::views::NamedSeries {
                name: id.title().to_string(),
                color: bar_color(dark, false).to_string(),
                points: points.clone(),
            };
            let brush = if brushable {
                drag().or_else(|| {
                    ctx.dashboard
                        .read()
                        .as_ref()
                        .and_then(|board| board.brush().copied())
                        .map(|range| (time_x(range.start, &domain), time_x(range.end, &domain)))
                })
            } else {
                None
            };
            line_chart(&[line], &series, &domain, brush, dark)
        }
        (ChartSeries::Composite(lines), Some(domain)) => line_chart(lines, &series, &domain, None, dark),
        _ => rsx! {
            p { style: "{muted_style(dark)}", "No data" }
        },
    };

    let domain = view.original_domain;
    let to_chart_x = move |element_x: f64| {
        let div_width = *chart_div_width.peek();
        (div_width > 0.0).then(|| element_x / div_width * CHART_WIDTH)
    };

    rsx! {
        section { style: "{card_style(dark)}", id: "{mount_id}",
            div { style: "{card_header_style(dark)}",
                h2 { style: "{card_title_style(dark)}", "{id.title()}" }
                if brushable {
                    span { style: "{muted_style(dark)} font-size: 0.75rem;", "drag to select a window" }
                }
            }
            div {
                style: if brushable { "cursor: crosshair; user-select: none;" } else { "" },
                onmounted: move |evt| {
                    let mounted_data = evt.data().clone();
                    spawn(async move {
                        if let Ok(rect) = mounted_data.get_client_rect().await {
                            chart_div_width.set(rect.width());
                        }
                    });
                },
                onmousedown: move |e| {
                    if !brushable {
                        return;
                    }
                    if let Some(x) = to_chart_x(e.data().element_coordinates().x) {
                        drag.set(Some((x, x)));
                    }
                },
                onmousemove: move |e| {
                    let Some((anchor, _)) = *drag.peek() else {
                        return;
                    };
                    if let Some(x) = to_chart_x(e.data().element_coordinates().x) {
                        drag.set(Some((anchor, x)));
                    }
                },
                onmouseup: move |_| {
                    let Some((a, b)) = drag.take() else {
                        return;
                    };
                    let Some(domain) = domain else {
                        return;
                    };
                    let (left, right) = (a.min(b), a.max(b));
                    if right - left < MIN_BRUSH_WIDTH {
                        apply(ctx, Transition::ClearBrush);
                        return;
                    }
                    match TimeRange::new(time_at(left, &domain), time_at(right, &domain)) {
                        Ok(range) => apply(ctx, Transition::Brush(range)),
                        Err(e) => warn!(error = %e, "brush ignored"),
                    }
                },
                {body}
            }
        }
    }
}

fn line_chart(
    lines: &[codemd_core::views::NamedSeries],
    series: &ChartSeries,
    domain: &TimeRange,
    brush: Option<(f64, f64)>,
    dark: bool,
) -> Element {
    let (lo, hi) = series
        .value_extent()
        .map_or((0.0, 1.0), |(lo, hi)| (lo.min(0.0), hi.max(0.0)));
    let grid_c = grid_color(dark);
    let axis_c = axis_color(dark);
    let start_label = domain.start.format("%Y-%m-%d").to_string();
    let end_label = domain.end.format("%Y-%m-%d").to_string();

    rsx! {
        svg {
            style: "width: 100%; height: auto; pointer-events: none;",
            view_box: "0 0 {CHART_WIDTH} {CHART_HEIGHT}",

            for i in 0..5 {
                {
                    let y = PADDING + (CHART_HEIGHT - 2.0 * PADDING) * (i as f64 / 4.0);
                    let value = hi - (hi - lo) * (i as f64 / 4.0);
                    rsx! {
                        line {
                            key: "grid-{i}",
                            x1: "{PADDING}", y1: "{y}", x2: "{CHART_WIDTH - PADDING}", y2: "{y}",
                            stroke: "{grid_c}", "stroke-width": "1",
                        }
                        text {
                            key: "tick-{i}",
                            x: "{PADDING - 4.0}", y: "{y + 3.0}",
                            fill: "{axis_c}", "font-size": "10", "text-anchor": "end",
                            "{format_value(value)}"
                        }
                    }
                }
            }

            text { x: "{PADDING}", y: "{CHART_HEIGHT - PADDING + 14.0}", fill: "{axis_c}", "font-size": "10", "{start_label}" }
            text { x: "{CHART_WIDTH - PADDING}", y: "{CHART_HEIGHT - PADDING + 14.0}", fill: "{axis_c}", "font-size": "10", "text-anchor": "end", "{end_label}" }

            if let Some((a, b)) = brush {
                rect {
                    x: "{a.min(b).max(PADDING)}",
                    y: "{PADDING}",
                    width: "{(a.max(b).min(CHART_WIDTH - PADDING) - a.min(b).max(PADDING)).max(0.0)}",
                    height: "{CHART_HEIGHT - 2.0 * PADDING}",
                    fill: "{brush_color(dark)}",
                }
            }

            for named in lines.iter() {
                path {
                    key: "{named.name}",
                    d: "{generate_line_path(&named.points, domain, lo, hi)}",
                    fill: "none",
                    stroke: "{named.color}",
                    "stroke-width": "1.5",
                }
            }
        }
    }
}

/// Defects: one bar per bucket, coloured by quantile
fn bar_chart(
    points: &[codemd_core::views::SeriesPoint],
    colors: &[&'static str],
    domain: &TimeRange,
    dark: bool,
) -> Element {
    let hi = points.iter().map(|p| p.value).fold(0.0, f64::max);
    let bar_width = ((CHART_WIDTH - 2.0 * PADDING) / points.len().max(1) as f64 - 1.0).max(1.0);
    let axis_c = axis_color(dark);

    rsx! {
        svg {
            style: "width: 100%; height: auto; pointer-events: none;",
            view_box: "0 0 {CHART_WIDTH} {CHART_HEIGHT}",
            text { x: "{PADDING - 4.0}", y: "{PADDING + 3.0}", fill: "{axis_c}", "font-size": "10", "text-anchor": "end", "{format_value(hi)}" }
            for (i, (point, color)) in points.iter().zip(colors.iter()).enumerate() {
                {
                    let top = value_y(point.value, 0.0, hi);
                    rsx! {
                        rect {
                            key: "{i}",
                            x: "{time_x(point.date, domain)}",
                            y: "{top}",
                            width: "{bar_width}",
                            height: "{(CHART_HEIGHT - PADDING - top).max(0.0)}",
                            fill: "{color}",
                        }
                    }
                }
            }
        }
    }
}

/// Top authors: clicking a bar filters by that author, clicking it again clears
fn row_chart(ctx: EngineCtx, rows: &[(String, f64)], dark: bool) -> Element {
    let selected = ctx
        .dashboard
        .read()
        .as_ref()
        .and_then(|board| board.selected_author().map(str::to_string));
    let hi = rows.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let row_height = ((CHART_HEIGHT - 20.0) / rows.len().max(1) as f64).min(24.0);
    let bar_span = CHART_WIDTH - 2.0 * PADDING - 120.0;
    let fg = legend_text_color(dark);

    rsx! {
        svg {
            style: "width: 100%; height: auto;",
            view_box: "0 0 {CHART_WIDTH} {CHART_HEIGHT}",
            for (i, (author, count)) in rows.iter().enumerate() {
                {
                    let is_selected = selected.as_deref() == Some(author.as_str());
                    let y = 10.0 + i as f64 * row_height;
                    let width = if hi > 0.0 { bar_span * count / hi } else { 0.0 };
                    let target = (!is_selected).then(|| author.clone());
                    rsx! {
                        g {
                            key: "{author}",
                            style: "cursor: pointer;",
                            onclick: move |_| apply(ctx, Transition::SelectAuthor(target.clone())),
                            text { x: "{PADDING + 110.0}", y: "{y + row_height * 0.7}", fill: "{fg}", "font-size": "11", "text-anchor": "end", "{author}" }
                            rect {
                                x: "{PADDING + 120.0}",
                                y: "{y}",
                                width: "{width.max(1.0)}",
                                height: "{(row_height - 4.0).max(1.0)}",
                                fill: "{bar_color(dark, is_selected)}",
                            }
                            text { x: "{PADDING + 124.0 + width}", y: "{y + row_height * 0.7}", fill: "{fg}", "font-size": "11", "{count}" }
                        }
                    }
                }
            }
        }
    }
}

/// Feed a transition to the dashboard and redraw the charts of its frame
fn apply(ctx: EngineCtx, transition: Transition) {
    let EngineCtx {
        mut dashboard,
        mut charts,
        ..
    } = ctx;
    let mut guard = dashboard.write();
    let Some(board) = guard.as_mut() else {
        return;
    };

    match board.apply(transition) {
        Ok(frame) => {
            debug!(charts = ?frame.views(), "redrawing");
            let report = board.flush(&frame, &mut *charts.write());
            for (id, err) in &report.errors {
                warn!(chart = %id, error = %err, "chart not redrawn");
            }
        }
        Err(e) => warn!(error = %e, "transition rejected"),
    }
}

fn time_x(date: DateTime<Utc>, domain: &TimeRange) -> f64 {
    let span = (domain.end - domain.start).num_seconds().max(1) as f64;
    let offset = (date - domain.start).num_seconds() as f64;
    PADDING + (CHART_WIDTH - 2.0 * PADDING) * (offset / span)
}

fn time_at(x: f64, domain: &TimeRange) -> DateTime<Utc> {
    let fraction = ((x - PADDING) / (CHART_WIDTH - 2.0 * PADDING)).clamp(0.0, 1.0);
    let span = (domain.end - domain.start).num_seconds() as f64;
    domain.start + ChronoDuration::seconds((span * fraction).round() as i64)
}

fn value_y(value: f64, lo: f64, hi: f64) -> f64 {
    let fraction = if hi > lo { (value - lo) / (hi - lo) } else { 0.0 };
    CHART_HEIGHT - PADDING - (CHART_HEIGHT - 2.0 * PADDING) * fraction
}

fn generate_line_path(
    points: &[codemd_core::views::SeriesPoint],
    domain: &TimeRange,
    lo: f64,
    hi: f64,
) -> String {
    let mut path = String::new();
    for point in points.iter().filter(|p| p.date >= domain.start && p.date <= domain.end) {
        let command = if path.is_empty() { "M" } else { " L" };
        path.push_str(&format!(
            "{} {:.1} {:.1}",
            command,
            time_x(point.date, domain),
            value_y(point.value, lo, hi)
        ));
    }
    path
}

fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else if magnitude >= 10.0 || value == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

// ============================================================================
// Browser plumbing
// ============================================================================

/// Milliseconds since page load as a `Duration`
fn now() -> Duration {
    let ms = web_sys::window()
        .and_then(|w| w.performance())
        .map_or(0.0, |p| p.now());
    Duration::from_secs_f64(ms.max(0.0) / 1000.0)
}

/// Resolves on the next animation frame
async fn next_frame() {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window()
            .map(|w| w.request_animation_frame(&resolve).is_ok())
            .unwrap_or(false);
        if !scheduled {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = JsFuture::from(promise).await;
}

async fn sleep(delay: Duration) {
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window()
            .map(|w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                    .is_ok()
            })
            .unwrap_or(false);
        if !scheduled {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// Hotspot server and project: the page origin and its `?project=` parameter
fn hotspot_target() -> Option<(String, String)> {
    let location = web_sys::window()?.location();
    let origin = location.origin().ok()?;
    let search = location.search().ok()?;
    let project = web_sys::UrlSearchParams::new_with_str(&search).ok()?.get("project")?;
    Some((origin, project))
}

async fn fetch_text(url: &str) -> Result<String, String> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch {}: {}", url, e))?;

    if !response.ok() {
        return Err(format!(
            "HTTP error on {}: {} {}",
            url,
            response.status(),
            response.status_text()
        ));
    }

    response
        .text()
        .await
        .map_err(|e| format!("Failed to read {}: {}", url, e))
}

async fn load_payloads() -> Result<(Vec<CommitRecord>, HierarchyNode), String> {
    let commits = fetch_text(COMMITS_URL).await?;
    let hierarchy = fetch_text(HIERARCHY_URL).await?;

    let records =
        parse_commits(&commits).map_err(|e| format!("Failed to parse {}: {}", COMMITS_URL, e))?;
    let tree = parse_hierarchy(&hierarchy)
        .map_err(|e| format!("Failed to parse {}: {}", HIERARCHY_URL, e))?;
    debug!(records = records.len(), "payloads loaded");
    Ok((records, tree))
}
