//! Inline styles for the dashboard, light and dark
//!
//! No external CSS: every component formats its own `style` attribute.

// ============================================================================
// Layout
// ============================================================================

/// Generate app style based on theme
pub fn app_style(dark: bool) -> String {
    let (bg, fg) = if dark {
        ("#0d1117", "#c9d1d9")
    } else {
        ("#ffffff", "#1a1a1a")
    };
    format!(
        "min-height: 100vh; \
         display: flex; \
         flex-direction: column; \
         font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif; \
         font-size: 14px; \
         background: {bg}; \
         color: {fg}; \
         line-height: 1.5; \
         margin: 0; \
         padding: 0;"
    )
}

pub fn header_style(dark: bool) -> String {
    let (bg, border) = if dark {
        ("#161b22", "#30363d")
    } else {
        ("#f6f8fa", "#d0d7de")
    };
    format!(
        "display: flex; \
         justify-content: space-between; \
         align-items: center; \
         gap: 1rem; \
         padding: 0.75rem 1rem; \
         background: {bg}; \
         border-bottom: 1px solid {border};"
    )
}

pub fn title_style(_dark: bool) -> &'static str {
    "font-size: 1.1rem; \
     font-weight: 600; \
     margin: 0;"
}

pub fn main_content_style(_dark: bool) -> &'static str {
    "flex: 1; \
     display: grid; \
     grid-template-columns: minmax(320px, 1fr) minmax(480px, 1fr); \
     gap: 1rem; \
     padding: 1rem; \
     align-items: start;"
}

pub fn card_style(dark: bool) -> String {
    let (bg, border) = if dark {
        ("#161b22", "#30363d")
    } else {
        ("#ffffff", "#d0d7de")
    };
    format!(
        "background: {bg}; \
         border: 1px solid {border}; \
         border-radius: 6px; \
         padding: 0.75rem; \
         margin-bottom: 1rem; \
         position: relative;"
    )
}

pub fn card_header_style(_dark: bool) -> &'static str {
    "display: flex; \
     justify-content: space-between; \
     align-items: center; \
     margin-bottom: 0.5rem;"
}

pub fn card_title_style(dark: bool) -> String {
    let fg = if dark { "#8b949e" } else { "#57606a" };
    format!(
        "font-size: 0.85rem; \
         font-weight: 600; \
         color: {fg}; \
         margin: 0;"
    )
}

// ============================================================================
// Controls
// ============================================================================

pub fn toggle_btn_style(dark: bool) -> String {
    let (bg, fg, border) = if dark {
        ("#21262d", "#c9d1d9", "#30363d")
    } else {
        ("#f6f8fa", "#1a1a1a", "#d0d7de")
    };
    format!(
        "background: {bg}; \
         color: {fg}; \
         border: 1px solid {border}; \
         border-radius: 6px; \
         padding: 0.25rem 0.75rem; \
         cursor: pointer; \
         font-size: 0.8rem;"
    )
}

/// Annotation mode buttons, the active one highlighted
pub fn mode_btn_style(dark: bool, active: bool) -> String {
    let (bg, fg, border) = match (dark, active) {
        (true, true) => ("#1f6feb", "#ffffff", "#1f6feb"),
        (true, false) => ("#21262d", "#c9d1d9", "#30363d"),
        (false, true) => ("#0969da", "#ffffff", "#0969da"),
        (false, false) => ("#f6f8fa", "#1a1a1a", "#d0d7de"),
    };
    format!(
        "background: {bg}; \
         color: {fg}; \
         border: 1px solid {border}; \
         border-radius: 6px; \
         padding: 0.2rem 0.6rem; \
         margin-right: 0.25rem; \
         cursor: pointer; \
         font-size: 0.75rem;"
    )
}

pub fn link_style(dark: bool) -> String {
    let fg = if dark { "#58a6ff" } else { "#0969da" };
    format!("color: {fg}; text-decoration: none; font-size: 0.8rem;")
}

// ============================================================================
// Counters
// ============================================================================

pub fn counters_style(_dark: bool) -> &'static str {
    "display: flex; \
     gap: 1.5rem; \
     align-items: baseline;"
}

pub fn number_style(dark: bool) -> String {
    let fg = if dark { "#58a6ff" } else { "#0969da" };
    format!(
        "font-size: 1.4rem; \
         font-weight: 600; \
         color: {fg}; \
         margin-right: 0.3rem;"
    )
}

// ============================================================================
// Hierarchy view
// ============================================================================

pub fn packing_frame_style(_dark: bool) -> &'static str {
    "width: 100%; \
     aspect-ratio: 1 / 1; \
     cursor: pointer;"
}

/// Circle outline; leaves are drawn without one
pub fn circle_stroke(dark: bool, leaf: bool) -> &'static str {
    match (leaf, dark) {
        (true, _) => "none",
        (false, true) => "#30363d",
        (false, false) => "#d0d7de",
    }
}

pub fn label_style(dark: bool) -> String {
    let halo = if dark { "#0d1117" } else { "#ffffff" };
    format!(
        "font: 11px 'Helvetica Neue', Helvetica, Arial, sans-serif; \
         text-anchor: middle; \
         pointer-events: none; \
         text-shadow: 0 1px 0 {halo}, 1px 0 0 {halo}, -1px 0 0 {halo}, 0 -1px 0 {halo};"
    )
}

pub fn hover_tooltip_style(dark: bool) -> String {
    let (bg, fg, border) = if dark {
        ("#1c2128", "#c9d1d9", "#444c56")
    } else {
        ("#ffffff", "#1a1a1a", "#d0d7de")
    };
    format!(
        "position: absolute; \
         top: 2.5rem; \
         right: 0.75rem; \
         min-width: 180px; \
         background: {bg}; \
         color: {fg}; \
         border: 1px solid {border}; \
         border-radius: 6px; \
         padding: 0.5rem 0.75rem; \
         font-size: 0.75rem; \
         box-shadow: 0 4px 12px rgba(0,0,0,0.2); \
         pointer-events: none; \
         z-index: 10;"
    )
}

pub fn legend_text_color(dark: bool) -> &'static str {
    if dark {
        "#c9d1d9"
    } else {
        "#1a1a1a"
    }
}

// ============================================================================
// Charts
// ============================================================================

pub fn grid_color(dark: bool) -> &'static str {
    if dark { "#21262d" } else { "#eaeef2" }
}

pub fn axis_color(dark: bool) -> &'static str {
    if dark { "#6e7681" } else { "#8c959f" }
}

/// Fill of the timeline brush
pub fn brush_color(dark: bool) -> &'static str {
    if dark {
        "rgba(88, 166, 255, 0.2)"
    } else {
        "rgba(9, 105, 218, 0.15)"
    }
}

pub fn bar_color(dark: bool, selected: bool) -> &'static str {
    match (selected, dark) {
        (true, _) => "#f78166",
        (false, true) => "#58a6ff",
        (false, false) => "#0969da",
    }
}

// ============================================================================
// States
// ============================================================================

pub fn muted_style(dark: bool) -> String {
    let fg = if dark { "#8b949e" } else { "#57606a" };
    format!("color: {fg};")
}

pub fn loading_style(_dark: bool) -> &'static str {
    "padding: 3rem; \
     text-align: center; \
     font-size: 0.9rem;"
}

pub fn error_style(dark: bool) -> String {
    let (bg, fg) = if dark {
        ("#3d1214", "#f85149")
    } else {
        ("#ffebe9", "#cf222e")
    };
    format!(
        "margin: 2rem; \
         padding: 1rem; \
         border-radius: 6px; \
         background: {bg}; \
         color: {fg};"
    )
}

pub fn empty_style(_dark: bool) -> &'static str {
    "padding: 3rem; \
     text-align: center;"
}

pub fn code_style(dark: bool) -> String {
    let bg = if dark { "#161b22" } else { "#f6f8fa" };
    format!(
        "display: inline-block; \
         margin-top: 0.5rem; \
         padding: 0.25rem 0.5rem; \
         border-radius: 4px; \
         background: {bg}; \
         font-family: 'SF Mono', 'Fira Code', Consolas, monospace; \
         font-size: 0.8rem;"
    )
}
