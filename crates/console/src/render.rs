//! Plain-text tables for the terminal.

use browse::{Pagination, Selection, Stats};
use records::{Chunk, Collection, DocumentGroup, NOT_AVAILABLE};
use serde_json::Value;
use std::fmt::Write;

const CONTENT_WIDTH: usize = 48;
const SOURCE_WIDTH: usize = 32;

/// Cuts `text` to `width` characters, marking the cut with `...`, and puts
/// it on one line.
pub fn truncate(text: &str, width: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= width {
        return flat;
    }
    let kept: String = flat.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn mark(selected: bool) -> &'static str {
    if selected { "[x]" } else { "[ ]" }
}

fn flag(value: Option<bool>, pending: bool) -> &'static str {
    match (pending, value) {
        (true, _) => "...",
        (false, Some(true)) => "yes",
        (false, Some(false)) => "no",
        (false, None) => "-",
    }
}

fn scalar(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

pub fn collections_table(collections: &[Collection], selected: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "    {:<38} {:<28} {:>9}", "UUID", "NAME", "VERIFY");
    for c in collections {
        let active = if Some(c.uuid.as_str()) == selected { "*" } else { " " };
        let _ = writeln!(
            out,
            "{active}   {:<38} {:<28} {:>9}",
            c.uuid,
            truncate(&c.name, 28),
            if c.verify_checkbox() { "on" } else { "off" }
        );
    }
    out
}

pub fn groups_table(groups: &[DocumentGroup], selection: &Selection) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "    {:<SOURCE_WIDTH$} {:<38} {:>6} {:>9} {:<20}",
        "SOURCE", "FILE ID", "CHUNKS", "CHARS", "CREATED"
    );
    for g in groups {
        let _ = writeln!(
            out,
            "{} {:<SOURCE_WIDTH$} {:<38} {:>6} {:>9} {:<20}",
            mark(selection.contains(&g.file_id)),
            truncate(&g.source, SOURCE_WIDTH),
            g.file_id,
            g.chunk_count,
            g.total_chars,
            g.created_at
        );
    }
    out
}

/// Chunk rows. The verification columns only appear for collections with
/// `verify_checkbox`; rows with a flag update in flight show `...`.
pub fn chunks_table(
    chunks: &[Chunk],
    selection: &Selection,
    verify_columns: bool,
    is_pending: impl Fn(&str) -> bool,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "    {:<38} {:<24} {:<CONTENT_WIDTH$} {:>6}",
        "ID", "SOURCE", "CONTENT", "CHARS"
    );
    if verify_columns {
        let _ = write!(out, " {:<9} {:>6} {:<8} {:<10}", "SEVERITY", "SCORE", "VERIFIED", "VULNERABLE");
    }
    out.push('\n');

    for chunk in chunks {
        let _ = write!(
            out,
            "{} {:<38} {:<24} {:<CONTENT_WIDTH$} {:>6}",
            mark(selection.contains(&chunk.id)),
            chunk.id,
            truncate(chunk.source(), 24),
            truncate(&chunk.content, CONTENT_WIDTH),
            chunk.char_count()
        );
        if verify_columns {
            let pending = is_pending(&chunk.id);
            let _ = write!(
                out,
                " {:<9} {:>6} {:<8} {:<10}",
                truncate(&scalar(chunk.metadata.get("severity")), 9),
                truncate(&scalar(chunk.metadata.get("score")), 6),
                flag(chunk.metadata.verified, pending),
                flag(chunk.metadata.vulnerable, pending)
            );
        }
        out.push('\n');
    }
    out
}

/// Full content and metadata of one chunk.
pub fn chunk_detail(chunk: &Chunk) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Chunk {} ===", chunk.id);
    let _ = writeln!(out, "Source:     {}", chunk.source());
    let _ = writeln!(out, "File ID:    {}", chunk.file_id());
    let _ = writeln!(out, "Timestamp:  {}", chunk.metadata.display_timestamp());
    let _ = writeln!(out, "Characters: {}", chunk.char_count());
    if let Some(index) = chunk.chunk_index {
        let total = chunk
            .total_chunks
            .map_or_else(|| NOT_AVAILABLE.to_string(), |t| t.to_string());
        let _ = writeln!(out, "Chunk:      {index} of {total}");
    }
    let _ = writeln!(out, "\n{}\n", chunk.content);
    let _ = writeln!(out, "--- metadata ---");
    for (key, value) in chunk.metadata.entries() {
        let _ = writeln!(out, "{key}: {}", scalar(Some(value)));
    }
    out
}

/// Summary of one document and the chunks it was split into.
pub fn group_detail(group: &DocumentGroup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", group.source);
    let _ = writeln!(out, "File ID:    {}", group.file_id);
    let _ = writeln!(out, "Created:    {}", group.created_at);
    let _ = writeln!(out, "Chunks:     {}", group.chunk_count);
    let _ = writeln!(out, "Characters: {}", group.total_chars);
    for (n, chunk) in group.chunks.iter().enumerate() {
        let _ = writeln!(out, "  {:>3}. {}", n + 1, truncate(&chunk.content, CONTENT_WIDTH + 20));
    }
    out
}

pub fn stats_line(stats: &Stats) -> String {
    format!(
        "Documents: {}  Chunks: {}  Characters: {}",
        stats.total_documents, stats.total_chunks, stats.total_characters
    )
}

pub fn page_footer(pagination: &Pagination) -> String {
    format!(
        "Page {} of {} ({} items)",
        pagination.current_page(),
        pagination.total_pages().max(1),
        pagination.total_items()
    )
}
