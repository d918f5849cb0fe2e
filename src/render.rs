//! Purpose: Render a decoded query as an aligned, optionally colored table for terminals.
//! Exports: `render_table`.
//! Role: Small, pure formatter used by `geoquery decode --format table`.
//! Invariants: ANSI escapes appear only when explicitly enabled.
//! Invariants: One line per key, in key order; no trailing newline.
use geoquery::api::{DecodedQuery, QueryValue};

// Conservative 8/16-color palette for broad terminal compatibility.
const COLOR_KEY: &str = "36";
const COLOR_STRING: &str = "32";
const COLOR_NUMBER: &str = "33";
const COLOR_BOOL: &str = "35";
const COLOR_GEO: &str = "34";
const COLOR_NULL: &str = "31";
const COLOR_KIND: &str = "90";

const KIND_WIDTH: usize = 6;

pub fn render_table(query: &DecodedQuery, use_color: bool) -> String {
    let key_width = query
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(query.len());
    for (key, value) in query {
        let mut line = String::new();
        push_colored(&pad(key, key_width), COLOR_KEY, use_color, &mut line);
        line.push_str("  ");
        push_colored(&pad(value.kind(), KIND_WIDTH), COLOR_KIND, use_color, &mut line);
        line.push_str("  ");
        push_colored(&value_text(value), value_color(value), use_color, &mut line);
        lines.push(line);
    }
    lines.join("\n")
}

fn value_text(value: &QueryValue) -> String {
    match value {
        QueryValue::Text(text) => {
            serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
        }
        QueryValue::Bounds(bounds) => format!("{} / {}", bounds.north_east, bounds.south_west),
        QueryValue::Null => "null".to_string(),
        other => other.to_query_text(),
    }
}

fn value_color(value: &QueryValue) -> &'static str {
    match value {
        QueryValue::Bool(_) => COLOR_BOOL,
        QueryValue::Number(_) => COLOR_NUMBER,
        QueryValue::LatLng(_) | QueryValue::Bounds(_) => COLOR_GEO,
        QueryValue::Text(_) => COLOR_STRING,
        QueryValue::Null => COLOR_NULL,
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

fn push_colored(text: &str, color: &str, use_color: bool, out: &mut String) {
    if !use_color {
        out.push_str(text);
        return;
    }
    out.push_str("\u{1b}[");
    out.push_str(color);
    out.push('m');
    out.push_str(text);
    out.push_str("\u{1b}[0m");
}
