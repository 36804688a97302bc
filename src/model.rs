use std::collections::{BTreeMap, BTreeSet};

use crate::error::Error;
use crate::package::BASE_NAMESPACES;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineSpacing {
    Auto(f32),    // multiplier (e.g. 1.0 = single)
    Exact(f32),   // fixed height in points
    AtLeast(f32), // minimum height in points
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldCode {
    Page,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Run {
    pub text: String,
    pub font_name: Option<String>,
    pub font_size: Option<f32>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<[u8; 3]>,
    pub line_break: bool,
    pub field_code: Option<FieldCode>,
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Paragraph {
    /// Registry name of the paragraph style, if any.
    pub style: Option<String>,
    pub runs: Vec<Run>,
    pub alignment: Option<Alignment>,
    pub space_before: Option<f32>,
    pub space_after: Option<f32>,
    pub indent_left: Option<f32>,
    pub indent_right: Option<f32>,
    pub indent_first_line: Option<f32>,
    pub indent_hanging: Option<f32>,
    pub line_spacing: Option<LineSpacing>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|r| if r.line_break { "\n" } else { r.text.as_str() })
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VMerge {
    None,
    Restart,
    Continue,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellVAlign {
    Top,
    Center,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellBorder {
    pub present: bool,
    pub color: Option<[u8; 3]>,
    pub width: f32,
}

impl Default for CellBorder {
    fn default() -> Self {
        Self {
            present: false,
            color: None,
            width: 0.5,
        }
    }
}

impl CellBorder {
    pub fn visible(color: Option<[u8; 3]>, width: f32) -> Self {
        Self {
            present: true,
            color,
            width,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellBorders {
    pub top: CellBorder,
    pub bottom: CellBorder,
    pub left: CellBorder,
    pub right: CellBorder,
}

impl CellBorders {
    pub fn any(&self) -> bool {
        self.top.present || self.bottom.present || self.left.present || self.right.present
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub col_widths: Vec<f32>, // points, from w:tblGrid
    pub rows: Vec<TableRow>,
    pub bordered: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub height: Option<f32>,
    pub height_exact: bool,
    /// Grid columns skipped before the first cell (`w:gridBefore`).
    pub grid_before: u16,
    /// Grid columns left empty after the last cell (`w:gridAfter`).
    pub grid_after: u16,
}

impl TableRow {
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            cells,
            ..Self::default()
        }
    }

    /// Number of grid columns this row occupies, skipped columns included.
    pub fn grid_width(&self) -> usize {
        let spans: usize = self.cells.iter().map(|c| c.grid_span.max(1) as usize).sum();
        spans + self.grid_before as usize + self.grid_after as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub width: Option<f32>, // points
    pub paragraphs: Vec<Paragraph>,
    pub borders: CellBorders,
    pub shading: Option<[u8; 3]>,
    pub grid_span: u16,
    pub v_merge: VMerge,
    pub v_align: CellVAlign,
}

impl TableCell {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            width: None,
            paragraphs,
            borders: CellBorders::default(),
            shading: None,
            grid_span: 1,
            v_merge: VMerge::None,
            v_align: CellVAlign::Top,
        }
    }

    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A foreign body element carried verbatim, e.g. a `<w:p>` or `<w:tbl>`
/// lifted out of an attachment's `document.xml`.
#[derive(Clone, Debug, PartialEq)]
pub struct RawXml {
    pub local_name: String,
    pub xml: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Paragraph(Paragraph),
    Table(Table),
    PageBreak,
    Raw(RawXml),
}

/// Append-only sequence of body elements plus the extra namespace
/// declarations that spliced raw elements rely on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentTree {
    elements: Vec<Element>,
    namespaces: BTreeMap<String, String>,
    ignorable: BTreeSet<String>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn extend(&mut self, elements: impl IntoIterator<Item = Element>) {
        self.elements.extend(elements);
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.elements.iter().filter_map(|e| match e {
            Element::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.elements.iter().filter_map(|e| match e {
            Element::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Extra `xmlns:prefix` declarations, beyond the package's base set.
    pub fn namespaces(&self) -> &BTreeMap<String, String> {
        &self.namespaces
    }

    pub fn ignorable(&self) -> &BTreeSet<String> {
        &self.ignorable
    }

    /// Fails if `prefix` is already bound to a different URI.
    pub fn check_namespace(&self, prefix: &str, uri: &str) -> Result<(), Error> {
        let bound = BASE_NAMESPACES
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, u)| *u)
            .or_else(|| self.namespaces.get(prefix).map(String::as_str));
        match bound {
            Some(existing) if existing != uri => Err(Error::Splice(format!(
                "namespace prefix '{prefix}' is bound to {existing}, attachment uses {uri}"
            ))),
            _ => Ok(()),
        }
    }

    /// Declare all of `decls` or none of them.
    pub fn declare_namespaces(
        &mut self,
        decls: &[(String, String)],
        ignorable: &[String],
    ) -> Result<(), Error> {
        for (prefix, uri) in decls {
            self.check_namespace(prefix, uri)?;
        }
        for (prefix, uri) in decls {
            if BASE_NAMESPACES.iter().any(|(p, _)| *p == prefix.as_str()) {
                continue;
            }
            self.namespaces.insert(prefix.clone(), uri.clone());
        }
        for prefix in ignorable {
            self.ignorable.insert(prefix.clone());
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Title,
    Header1,
    Header2,
    Header3,
    ListItem,
    Paragraph,
}

/// One classified unit of body text, before numbering and styling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    Word,
    Csv,
    Excel,
    Text,
    Markdown,
    Error,
}

impl AttachmentKind {
    pub fn is_tabular(self) -> bool {
        matches!(self, AttachmentKind::Csv | AttachmentKind::Excel)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    /// Original file name.
    pub name: String,
    /// Declared title (usually the cleaned file name).
    pub title: String,
    /// Title inferred from the attachment's own content.
    pub extracted_title: Option<String>,
    pub raw_bytes: Option<Vec<u8>>,
    pub markdown_body: Option<String>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind,
            title: String::new(),
            name,
            extracted_title: None,
            raw_bytes: None,
            markdown_body: None,
        }
    }

    /// Title shown in the reference block and on the attachment page:
    /// extracted title, declared title, file name, then `附件{order}`.
    pub fn display_title(&self, order: usize) -> String {
        self.extracted_title
            .as_deref()
            .into_iter()
            .chain([self.title.as_str(), self.name.as_str()])
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("附件{order}"))
    }
}
