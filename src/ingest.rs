//! Turning uploaded files into [`Attachment`]s.
//!
//! Tabular and text formats are normalised to markdown up front; Word files
//! keep their bytes for the merge engine and get a title recovered from
//! their content.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use regex::Regex;

use crate::docx::SourceDocument;
use crate::error::Error;
use crate::merge::PLACEHOLDER;
use crate::model::{Attachment, AttachmentKind};
use crate::title;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Upload timestamp prefix, e.g. `20250711_085907_`.
static TIMESTAMP_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}_\d{6}_").expect("valid timestamp prefix regex"));

/// Lower-cased extension including the dot, or an empty string.
fn extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Attachment kind from a file name, `None` for unsupported extensions.
pub fn detect_kind(name: &str) -> Option<AttachmentKind> {
    match extension(name).as_str() {
        ".docx" | ".doc" => Some(AttachmentKind::Word),
        ".csv" => Some(AttachmentKind::Csv),
        ".xlsx" | ".xls" => Some(AttachmentKind::Excel),
        ".txt" => Some(AttachmentKind::Text),
        ".md" => Some(AttachmentKind::Markdown),
        _ => None,
    }
}

/// File name without extension or upload timestamp prefix.
pub fn clean_filename(name: &str) -> String {
    let stem = title::filename_stem(name);
    TIMESTAMP_PREFIX.replace(stem, "").trim().to_string()
}

/// Decode text as UTF-8 (with or without BOM), falling back to GBK and
/// finally to lossy UTF-8.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }
    if let Some(text) = encoding_rs::GBK.decode_without_bom_handling_and_without_replacement(bytes) {
        log::debug!("decoded {} bytes as GBK", bytes.len());
        return text;
    }
    log::warn!("text is neither UTF-8 nor GBK, decoding lossily");
    String::from_utf8_lossy(bytes)
}

fn escape_cell(text: &str) -> String {
    text.trim().replace(['\r', '\n'], " ").replace('|', "｜")
}

/// Markdown pipe table. Rows are padded or cut to the header's width.
pub fn to_markdown_table(header: &[String], rows: &[Vec<String>]) -> String {
    let width = header.len();
    let line = |cells: &[String]| {
        let cells: Vec<String> = (0..width)
            .map(|i| cells.get(i).map(|c| escape_cell(c)).unwrap_or_default())
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(header));
    lines.push(format!("| {} |", vec!["---"; width].join(" | ")));
    lines.extend(rows.iter().map(|r| line(r.as_slice())));
    lines.join("\n")
}

/// CSV text to a markdown table; the first record is the header.
pub fn csv_to_markdown(text: &str) -> Result<String, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    let Some((header, rows)) = records.split_first() else {
        return Err(Error::Validation("CSV file has no rows".into()));
    };
    Ok(to_markdown_table(header, rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR:{e:?}"),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// First worksheet of a workbook to a markdown table; the first row is the
/// header and fully empty rows are skipped.
pub fn excel_to_markdown(bytes: &[u8]) -> Result<String, Error> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Validation("workbook has no worksheets".into()))??;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();
    let Some((header, rows)) = rows.split_first() else {
        return Err(Error::Validation("worksheet is empty".into()));
    };
    Ok(to_markdown_table(header, rows))
}

/// Paragraph text followed by each table as markdown. Table rows whose
/// width differs from the first row are dropped.
pub fn word_to_markdown(source: &SourceDocument) -> String {
    let mut chunks: Vec<String> = source
        .paragraph_texts()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    for table in source.tables() {
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|r| r.cells.iter().map(|c| escape_cell(&c.text())).collect())
            .collect();
        let Some((header, rest)) = rows.split_first() else {
            continue;
        };
        let kept: Vec<Vec<String>> = rest
            .iter()
            .filter(|r| r.len() == header.len())
            .cloned()
            .collect();
        chunks.push(to_markdown_table(header, &kept));
    }
    chunks.join("\n\n")
}

fn ingest(kind: AttachmentKind, attachment: &mut Attachment, bytes: Vec<u8>) -> Result<(), Error> {
    match kind {
        AttachmentKind::Word => {
            let source = SourceDocument::from_bytes(&bytes)?;
            attachment.extracted_title = title::recovered_title(&source, &attachment.name);
            attachment.markdown_body = Some(word_to_markdown(&source));
            attachment.raw_bytes = Some(bytes);
        }
        AttachmentKind::Csv => {
            attachment.markdown_body = Some(csv_to_markdown(&decode_text(&bytes))?);
        }
        AttachmentKind::Excel => {
            attachment.markdown_body = Some(excel_to_markdown(&bytes)?);
        }
        AttachmentKind::Text | AttachmentKind::Markdown => {
            attachment.markdown_body = Some(decode_text(&bytes).into_owned());
        }
        AttachmentKind::Error => {}
    }
    Ok(())
}

impl Attachment {
    /// Build an attachment from an uploaded file. Never fails: content that
    /// cannot be read yields an [`AttachmentKind::Error`] attachment whose
    /// body carries the cause.
    pub fn from_file(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let title = clean_filename(&name);

        let Some(kind) = detect_kind(&name) else {
            let ext = extension(&name);
            log::warn!("unsupported attachment type {ext:?}: {name}");
            let mut attachment = Attachment::new(AttachmentKind::Text, name);
            attachment.title = title;
            attachment.markdown_body = Some(format!("不支持的文件类型: {ext}"));
            return attachment;
        };

        let mut attachment = Attachment::new(kind, name);
        attachment.title = title;
        match ingest(kind, &mut attachment, bytes) {
            Ok(()) => {
                log::info!("attachment {} read as {kind:?}", attachment.name);
                attachment
            }
            Err(e) => {
                log::warn!("attachment {}: stage=ingest, {e}", attachment.name);
                let mut failed = Attachment::new(AttachmentKind::Error, attachment.name);
                failed.title = attachment.title;
                failed.markdown_body = Some(format!("{PLACEHOLDER}: {e}"));
                failed
            }
        }
    }
}

/// Read and ingest a file from disk.
pub fn read_attachment(path: &Path) -> Result<Attachment, Error> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Attachment::from_file(name, bytes))
}
