//! Line-level classification of the markdown body into [`Block`]s.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Block, BlockKind};

static HEADER1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[一二三四五六七八九十]+、").expect("valid header1 regex"));
static HEADER2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^（[一二三四五六七八九十]+）").expect("valid header2 regex"));
static HEADER3: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\.)\s*([^，。；：？！,.!?]+)([，。；：？！,.!?])(.*)")
        .expect("valid header3 regex")
});
static DUPLICATE_NUMBERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"（[一二三四五六七八九十]+）\s*[一二三四五六七八九十]+、")
        .expect("valid duplicate numbering regex")
});

/// Remove lines that repeat the header fields, plus lines carrying doubled
/// numbering such as `（一）一、`.
pub fn clean_body(
    body: &str,
    title: &str,
    department: &str,
    date: &str,
    recipient: Option<&str>,
) -> String {
    let title = title.trim();
    let heading_forms = [
        title.to_string(),
        format!("# {title}"),
        format!("## {title}"),
        format!("### {title}"),
    ];
    let mut echoes: Vec<&str> = heading_forms.iter().map(String::as_str).collect();
    echoes.push(department.trim());
    echoes.push(date.trim());
    if let Some(r) = recipient.map(str::trim).filter(|r| !r.is_empty()) {
        echoes.push(r);
    }

    let kept: Vec<&str> = body
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if !trimmed.is_empty() && echoes.contains(&trimmed) {
                log::debug!("dropping header echo line: {trimmed}");
                return false;
            }
            if DUPLICATE_NUMBERING.is_match(trimmed) {
                log::debug!("dropping duplicated numbering line: {trimmed}");
                return false;
            }
            true
        })
        .collect();
    kept.join("\n").trim().to_string()
}

/// Classify every non-blank line. Numbering markers are stripped; the
/// builder regenerates them.
pub fn classify(body: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(m) = HEADER1.find(line) {
            blocks.push(Block::new(BlockKind::Header1, line[m.end()..].trim()));
        } else if let Some(m) = HEADER2.find(line) {
            blocks.push(Block::new(BlockKind::Header2, line[m.end()..].trim()));
        } else if let Some(caps) = HEADER3.captures(line) {
            let heading = format!("{}{}", caps[2].trim(), &caps[3]);
            blocks.push(Block::new(BlockKind::Header3, heading));
            let rest = caps[4].trim();
            if !rest.is_empty() {
                blocks.push(Block::new(BlockKind::Paragraph, rest));
            }
        } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            blocks.push(Block::new(BlockKind::ListItem, item.trim()));
        } else {
            blocks.push(Block::new(BlockKind::Paragraph, line));
        }
    }
    blocks
}
