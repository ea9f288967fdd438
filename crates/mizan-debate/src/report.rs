//! Debate persistence: file naming, JSON, and HTML rendering

use chrono::NaiveDateTime;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use crate::record::DebateRecord;
use crate::transcript::Position;

/// `<topic lower-cased, spaces → _>_<YYYYmmdd_HHMMSS>`
pub fn generate_filename(topic: &str, now: NaiveDateTime) -> String {
    format!(
        "{}_{}",
        topic.to_lowercase().replace(' ', "_"),
        now.format("%Y%m%d_%H%M%S")
    )
}

/// Write `<dir>/<name>.json` and return its path
pub fn save_json(record: &DebateRecord, dir: &Path, name: &str) -> io::Result<PathBuf> {
    let path = dir.join(format!("{name}.json"));
    let json = record.to_json_pretty().map_err(io::Error::other)?;
    std::fs::write(&path, json)?;
    tracing::info!(path = %path.display(), "Debate record saved");
    Ok(path)
}

/// Write `<dir>/<name>.html` and return its path
pub fn save_html(record: &DebateRecord, dir: &Path, name: &str) -> io::Result<PathBuf> {
    let path = dir.join(format!("{name}.html"));
    std::fs::write(&path, render_html(record))?;
    tracing::info!(path = %path.display(), "Debate HTML saved");
    Ok(path)
}

/// Minimal HTML escaping for text nodes and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `round_1` → `Round 1`, `opening_arguments` → `Opening Arguments`
fn section_title(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn render_html(record: &DebateRecord) -> String {
    let meta = &record.metadata;
    let mut body = String::new();

    for (key, pair) in record.debate.iter() {
        let _ = write!(body, "<div class=\"round\"><h2>{}</h2>", section_title(&key));
        for position in [Position::For, Position::Against] {
            let _ = write!(
                body,
                "\n    <div class=\"argument {class}\">\n        <h3>{label}</h3>\n        <p>{text}</p>\n    </div>",
                class = position.as_str(),
                label = position.label(),
                text = escape_html(pair.get(position)),
            );
        }
        body.push_str("</div>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Debate: {topic}</title>
<style>
body {{ font-family: sans-serif; max-width: 960px; margin: 2em auto; line-height: 1.5; }}
.metadata {{ color: #555; }}
.round {{ border-top: 1px solid #ccc; padding-top: 1em; }}
.argument {{ padding: 0.5em 1em; margin: 0.5em 0; border-radius: 4px; }}
.argument.for {{ background: #eef6ee; }}
.argument.against {{ background: #f6eeee; }}
p {{ white-space: pre-wrap; }}
</style>
</head>
<body>
<h1>{topic}</h1>
<div class="metadata">
<p>Mode: {mode} | Model: {model}</p>
<p>Date: {date} | Time taken: {time_taken:.2} seconds</p>
</div>
{body}</body>
</html>
"#,
        topic = escape_html(&meta.topic),
        mode = escape_html(&meta.mode),
        model = escape_html(&meta.model),
        date = escape_html(&meta.date),
        time_taken = meta.time_taken,
    )
}
