//! Plain-text layout of the message detail view.
//!
//! Rendering, scroll bounds and find-in-page all work on the same lines.

use unicode_width::UnicodeWidthChar;

use crate::export::format_bytes_long;
use crate::query::{Address, MessageDetail};

fn format_addresses(addrs: &[Address]) -> String {
    addrs
        .iter()
        .map(|a| {
            if a.name.is_empty() {
                a.email.clone()
            } else {
                format!("{} <{}>", a.name, a.email)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Header, attachment and body lines, wrapped to `width` columns
pub fn detail_lines(detail: &MessageDetail, width: u16, date_format: &str) -> Vec<String> {
    let mut raw = Vec::new();
    raw.push(format!("From: {}", format_addresses(&detail.from)));
    raw.push(format!("To: {}", format_addresses(&detail.to)));
    if !detail.cc.is_empty() {
        raw.push(format!("Cc: {}", format_addresses(&detail.cc)));
    }
    if !detail.bcc.is_empty() {
        raw.push(format!("Bcc: {}", format_addresses(&detail.bcc)));
    }
    raw.push(format!("Date: {}", detail.sent_at.format(date_format)));
    raw.push(format!("Subject: {}", detail.subject));
    if !detail.labels.is_empty() {
        raw.push(format!("Labels: {}", detail.labels.join(", ")));
    }
    if !detail.attachments.is_empty() {
        raw.push(format!("Attachments ({}):", detail.attachments.len()));
        for att in &detail.attachments {
            raw.push(format!("  {} ({})", att.filename, format_bytes_long(att.size)));
        }
    }
    raw.push(String::new());
    raw.extend(detail.body_text.lines().map(|l| l.replace('\t', "    ")));

    let width = width.max(1) as usize;
    raw.iter().flat_map(|line| wrap_line(line, width)).collect()
}

/// Split `line` into chunks no wider than `width` display columns
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for ch in line.chars() {
        let w = ch.width().unwrap_or(0);
        if current_width + w > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += w;
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Indices of lines containing `query`, case-insensitively
pub fn find_matches(lines: &[String], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(&needle))
        .map(|(idx, _)| idx)
        .collect()
}
