//! Binary to generate the index.html from Rust
//!
//! Run with: cargo run --bin generate_html
//!
//! Generates the HTML shell for the Dioxus WASM app. The app mounts on
//! `#main`; the payloads are fetched from the same directory.

use std::fs;
use std::path::Path;

fn main() {
    let html = generate_index_html();

    let dist_path = Path::new("dist");
    if let Err(e) = fs::create_dir_all(dist_path) {
        eprintln!("Failed to create {}: {}", dist_path.display(), e);
        std::process::exit(1);
    }

    let index_path = dist_path.join("index.html");
    if let Err(e) = fs::write(&index_path, &html) {
        eprintln!("Failed to write {}: {}", index_path.display(), e);
        std::process::exit(1);
    }

    println!("Generated: {}", index_path.display());
    println!("Copy commits.json and hierarchy.json next to it, e.g. from `codemd report`.");
}

fn generate_index_html() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>codemd</title>
    <style>
{styles}
    </style>
</head>
<body>
    <div id="loading">loading...</div>
    <div id="main"></div>
    <script type="module">
        import init from './codemd_dashboard.js';
        init().then(() => {{
            document.getElementById('loading').remove();
        }});
    </script>
</body>
</html>"#,
        styles = get_styles(),
    )
}

fn get_styles() -> &'static str {
    r#"        * { margin: 0; padding: 0; box-sizing: border-box; }
        html, body { min-height: 100%; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; font-size: 14px; }
        #loading { padding: 2rem; text-align: center; font-family: inherit; }
        #main { min-height: 100vh; }
        .node:hover { stroke: #000; stroke-width: 1.5px; }
        .node--leaf:hover { stroke: #000; }"#
}
