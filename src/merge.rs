//! Attachment merge engine.
//!
//! Word attachments with bytes go through up to three stages: a verbatim
//! splice of the source body, a structural reconstruction from the parsed
//! model, and finally plain text. Every other kind is rendered from its
//! markdown body. Only builder defects escape; everything else is logged
//! and degraded.

use std::sync::LazyLock;

use regex::Regex;

use crate::builder::DocumentBuilder;
use crate::docx::SourceDocument;
use crate::error::Error;
use crate::model::{
    Attachment, AttachmentKind, DocumentTree, Element, Paragraph, RawXml, Table, TableCell,
    TableRow, VMerge,
};
use crate::styles::{self, StyleRegistry};
use crate::table;

/// Text of the paragraph standing in for an attachment that could not be
/// processed.
pub const PLACEHOLDER: &str = "处理附件时发生错误";

/// Word refuses tables wider than this.
const MAX_TABLE_COLUMNS: usize = 63;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Source body copied verbatim.
    Spliced,
    /// Rebuilt element by element from the parsed source.
    Reconstructed,
    /// Only paragraph text survived.
    PlainText,
    /// Rendered from the attachment's markdown body.
    Rendered,
    PlaceholderError,
}

/// Result of a successful splice: raw elements plus the namespace
/// declarations they need on the target root.
#[derive(Clone, Debug, PartialEq)]
pub struct SplicedContent {
    pub elements: Vec<Element>,
    pub namespaces: Vec<(String, String)>,
    pub ignorable: Vec<String>,
}

pub type SpliceFn = fn(&SourceDocument, &DocumentTree) -> Result<SplicedContent, Error>;

/// Open section `order` and fill it with the attachment's content.
pub fn merge_attachment(
    builder: &mut DocumentBuilder,
    order: usize,
    attachment: &Attachment,
) -> Result<MergeOutcome, Error> {
    merge_attachment_with(builder, order, attachment, direct_splice)
}

/// As [`merge_attachment`], with the splice stage supplied by the caller.
pub fn merge_attachment_with(
    builder: &mut DocumentBuilder,
    order: usize,
    attachment: &Attachment,
    splice: SpliceFn,
) -> Result<MergeOutcome, Error> {
    builder.begin_attachment(order)?;

    let body = attachment.markdown_body.as_deref().unwrap_or("");
    match attachment.kind {
        AttachmentKind::Word => match attachment.raw_bytes.as_deref() {
            Some(bytes) => merge_word(builder, order, bytes, splice),
            None => {
                let elements: Vec<Element> = content_title(builder.registry(), &attachment.display_title(order))?
                    .into_iter()
                    .chain(render_word_content(builder.registry(), content_width(builder), body)?)
                    .collect();
                builder.append(elements)?;
                Ok(MergeOutcome::Rendered)
            }
        },
        AttachmentKind::Csv | AttachmentKind::Excel => {
            let mut elements = content_title(builder.registry(), &attachment.display_title(order))?;
            match render_markdown_table(builder.registry(), content_width(builder), body)? {
                Some(table) => elements.push(Element::Table(table)),
                None => log::warn!("attachment {order}: stage=table, no markdown table in content"),
            }
            builder.append(elements)?;
            Ok(MergeOutcome::Rendered)
        }
        AttachmentKind::Text | AttachmentKind::Markdown => {
            let mut elements = content_title(builder.registry(), &attachment.display_title(order))?;
            elements.extend(render_text(builder.registry(), body)?);
            builder.append(elements)?;
            Ok(MergeOutcome::Rendered)
        }
        AttachmentKind::Error => {
            let mut elements = content_title(builder.registry(), &attachment.display_title(order))?;
            let message = if body.starts_with(PLACEHOLDER) {
                body.to_string()
            } else {
                placeholder_text(body)
            };
            elements.push(Element::Paragraph(builder.registry().apply(styles::BODY, &message)?));
            builder.append(elements)?;
            Ok(MergeOutcome::PlaceholderError)
        }
    }
}

fn placeholder_text(cause: &str) -> String {
    if cause.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        format!("{PLACEHOLDER}: {}", cause.trim())
    }
}

fn content_width(builder: &DocumentBuilder) -> f32 {
    let page = &builder.options().page;
    page.page_width - page.margin_left - page.margin_right
}

/// Centred attachment title followed by a blank line.
fn content_title(registry: &StyleRegistry, title: &str) -> Result<Vec<Element>, Error> {
    Ok(vec![
        Element::Paragraph(registry.apply(styles::ATTACHMENT_CONTENT_TITLE, title)?),
        Element::Paragraph(registry.apply(styles::BODY, "")?),
    ])
}

fn merge_word(
    builder: &mut DocumentBuilder,
    order: usize,
    bytes: &[u8],
    splice: SpliceFn,
) -> Result<MergeOutcome, Error> {
    let source = match SourceDocument::from_bytes(bytes) {
        Ok(source) => source,
        Err(e) => {
            log::warn!("attachment {order}: stage=parse, {e}");
            let para = builder.registry().apply(styles::BODY, &placeholder_text(&e.to_string()))?;
            builder.append(vec![Element::Paragraph(para)])?;
            return Ok(MergeOutcome::PlaceholderError);
        }
    };

    if table::has_complex_tables(&source) {
        log::info!("attachment {order}: complex tables, reconstructing");
    } else {
        match splice(&source, builder.tree()) {
            Ok(content) => match builder.declare_namespaces(&content.namespaces, &content.ignorable) {
                Ok(()) => {
                    log::info!(
                        "attachment {order}: spliced {} body elements",
                        content.elements.len()
                    );
                    builder.append(content.elements)?;
                    return Ok(MergeOutcome::Spliced);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::warn!("attachment {order}: stage=splice, {e}"),
            },
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => log::warn!("attachment {order}: stage=splice, {e}"),
        }
    }

    match reconstruct(&source, builder.registry(), content_width(builder)) {
        Ok(elements) => {
            builder.append(elements)?;
            Ok(MergeOutcome::Reconstructed)
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            log::warn!("attachment {order}: stage=reconstruct, {e}");
            let elements = plain_text(&source, builder.registry())?;
            builder.append(elements)?;
            Ok(MergeOutcome::PlainText)
        }
    }
}

/// Lift every top-level body child of `source` as verbatim XML.
///
/// Fails, leaving `tree` untouched, when the fragments would not be valid
/// inside the target package: a default namespace on the source root, a
/// prefix bound to a different URI than the target uses, references into
/// the source's relationship table, or an embedded section break.
pub fn direct_splice(source: &SourceDocument, tree: &DocumentTree) -> Result<SplicedContent, Error> {
    if let Some(uri) = source.default_namespace() {
        return Err(Error::Splice(format!("source declares default namespace {uri}")));
    }
    for (prefix, uri) in source.namespaces() {
        tree.check_namespace(prefix, uri)?;
    }

    let mut elements = Vec::with_capacity(source.fragments().len());
    for (i, fragment) in source.fragments().iter().enumerate() {
        if fragment.references_relationships {
            return Err(Error::Splice(format!(
                "body element {i} (w:{}) references package relationships",
                fragment.local_name
            )));
        }
        if fragment.nested_section {
            return Err(Error::Splice(format!(
                "body element {i} (w:{}) carries a section break",
                fragment.local_name
            )));
        }
        elements.push(Element::Raw(RawXml {
            local_name: fragment.local_name.clone(),
            xml: fragment.xml.clone(),
        }));
    }

    Ok(SplicedContent {
        elements,
        namespaces: source.namespaces().to_vec(),
        ignorable: source.ignorable().to_vec(),
    })
}

/// Rebuild the source body from its parsed model, keeping run and paragraph
/// formatting and normalising table shape.
pub fn reconstruct(
    source: &SourceDocument,
    registry: &StyleRegistry,
    content_width: f32,
) -> Result<Vec<Element>, Error> {
    let mut elements = Vec::with_capacity(source.elements().len());
    for element in source.elements() {
        match element {
            Element::Table(t) => {
                if let Some(rebuilt) = rebuild_table(t, registry, content_width)? {
                    elements.push(Element::Table(rebuilt));
                }
            }
            other => elements.push(other.clone()),
        }
    }
    Ok(elements)
}

fn empty_cell(registry: &StyleRegistry) -> Result<TableCell, Error> {
    let para = Paragraph {
        runs: vec![registry.run(styles::BODY, "")?],
        ..Paragraph::default()
    };
    Ok(TableCell::new(vec![para]))
}

/// Pad every row to the table's grid width and drop vertical-merge
/// continuations that have nothing to continue. Returns `None` for a table
/// without cells.
pub fn rebuild_table(
    source: &Table,
    registry: &StyleRegistry,
    content_width: f32,
) -> Result<Option<Table>, Error> {
    if source.rows.iter().all(|r| r.cells.is_empty()) {
        return Ok(None);
    }
    let structure = table::analyze(source);
    let cols = structure.column_count();
    if cols > MAX_TABLE_COLUMNS {
        return Err(Error::Reconstruct(format!(
            "table has {cols} columns, more than {MAX_TABLE_COLUMNS}"
        )));
    }

    // Whether the cell above each grid column is part of a vertical merge.
    let mut merge_open = vec![false; cols];
    let mut rows = Vec::with_capacity(source.rows.len());
    for (ri, row) in source.rows.iter().enumerate() {
        let mut cells = Vec::with_capacity(cols);
        let mut col = 0usize;
        while col < row.grid_before as usize {
            cells.push(empty_cell(registry)?);
            merge_open[col] = false;
            col += 1;
        }
        for cell in &row.cells {
            let mut cell = cell.clone();
            let span = cell.grid_span.max(1) as usize;
            cell.grid_span = span as u16;
            if cell.v_merge == VMerge::Continue && !merge_open[col] {
                log::debug!("row {ri} col {col}: orphan vertical merge continuation dropped");
                cell.v_merge = VMerge::None;
            }
            let open = cell.v_merge != VMerge::None;
            merge_open[col..col + span].fill(open);
            col += span;
            cells.push(cell);
        }
        if col < cols {
            log::debug!("row {ri}: padded from {col} to {cols} columns");
        }
        while col < cols {
            cells.push(empty_cell(registry)?);
            merge_open[col] = false;
            col += 1;
        }
        rows.push(TableRow {
            cells,
            height: row.height,
            height_exact: row.height_exact,
            ..TableRow::default()
        });
    }

    let known: Vec<f32> = structure.column_widths.iter().flatten().copied().collect();
    let col_widths = if structure.column_widths.len() == cols && known.len() == cols {
        known
    } else {
        let fill = if known.is_empty() {
            content_width / cols as f32
        } else {
            known.iter().sum::<f32>() / known.len() as f32
        };
        (0..cols)
            .map(|c| structure.column_widths.get(c).copied().flatten().unwrap_or(fill))
            .collect()
    };

    Ok(Some(Table {
        col_widths,
        rows,
        bordered: source.bordered,
    }))
}

/// One body paragraph per non-blank source paragraph.
pub fn plain_text(source: &SourceDocument, registry: &StyleRegistry) -> Result<Vec<Element>, Error> {
    source
        .paragraphs()
        .map(|p| p.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .map(|t| registry.apply(styles::BODY, &t).map(Element::Paragraph))
        .collect()
}

/// One body paragraph per non-blank line.
pub fn render_text(registry: &StyleRegistry, content: &str) -> Result<Vec<Element>, Error> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| registry.apply(styles::BODY, l).map(Element::Paragraph))
        .collect()
}

static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(第[一二三四五六七八九十]+章|第[一二三四五六七八九十]+节|[一二三四五六七八九十]+、|（[一二三四五六七八九十]+）|\d+\.|[A-Z]+\.)",
    )
    .expect("valid heading line regex")
});

const SENTENCE_PUNCTUATION: [char; 6] = ['。', '，', '；', '：', '？', '！'];

/// Whether a line of extracted Word text reads as a heading: a chapter,
/// section or list marker, or a short line without sentence punctuation.
pub fn is_heading_line(line: &str) -> bool {
    HEADING_LINE.is_match(line)
        || (line.chars().count() < 20 && !line.contains(SENTENCE_PUNCTUATION))
}

/// Render text extracted from a Word file: blank-line separated chunks,
/// markdown tables where a chunk has `|` and `---`, heading lines in the
/// attachment body face.
pub fn render_word_content(
    registry: &StyleRegistry,
    content_width: f32,
    content: &str,
) -> Result<Vec<Element>, Error> {
    let mut elements = Vec::new();
    for chunk in content.split("\n\n").map(str::trim).filter(|c| !c.is_empty()) {
        if chunk.contains('|') && chunk.contains("---") {
            if let Some(table) = render_markdown_table(registry, content_width, chunk)? {
                elements.push(Element::Table(table));
            }
            continue;
        }
        for line in chunk.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let style = if is_heading_line(line) {
                styles::ATTACHMENT_BODY
            } else {
                styles::BODY
            };
            elements.push(Element::Paragraph(registry.apply(style, line)?));
        }
    }
    Ok(elements)
}

fn split_table_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|c| c.trim().to_string()).collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    cells.iter().all(|c| {
        !c.is_empty() && c.contains('-') && c.chars().all(|ch| matches!(ch, '-' | ':' | ' '))
    })
}

/// Header and data rows of a pipe table. Data rows whose cell count differs
/// from the header are dropped.
pub fn parse_markdown_table(content: &str) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && l.contains('|'));

    let header = split_table_row(lines.next()?);
    if header.iter().all(String::is_empty) {
        return None;
    }

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let cells = split_table_row(line);
        if i == 0 && is_separator_row(&cells) {
            continue;
        }
        if cells.len() != header.len() {
            log::debug!(
                "markdown table row {} has {} cells, header has {}; skipped",
                i + 1,
                cells.len(),
                header.len()
            );
            continue;
        }
        rows.push(cells);
    }
    Some((header, rows))
}

/// Native bordered table from a markdown pipe table; header cells are bold.
pub fn render_markdown_table(
    registry: &StyleRegistry,
    content_width: f32,
    content: &str,
) -> Result<Option<Table>, Error> {
    let Some((header, data)) = parse_markdown_table(content) else {
        return Ok(None);
    };

    let cell = |text: &str, bold: bool| -> Result<TableCell, Error> {
        let mut run = registry.run(styles::BODY, text)?;
        run.bold = bold;
        Ok(TableCell::new(vec![Paragraph {
            runs: vec![run],
            ..Paragraph::default()
        }]))
    };

    let mut rows = Vec::with_capacity(data.len() + 1);
    for (ri, texts) in std::iter::once(&header).chain(data.iter()).enumerate() {
        let cells = texts
            .iter()
            .map(|t| cell(t, ri == 0))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(TableRow::new(cells));
    }

    let cols = header.len();
    Ok(Some(Table {
        col_widths: vec![content_width / cols as f32; cols],
        rows,
        bordered: true,
    }))
}
