//! Reader for attachment `.docx` packages.
//!
//! Produces two views of the same body: a parsed model (paragraphs and
//! tables with direct formatting resolved through the style chain) used for
//! reconstruction and title extraction, and the verbatim XML of every
//! top-level body child used for direct splicing.

mod styles;

use std::io::{Cursor, Read, Seek};

use crate::error::Error;
use crate::model::{
    CellBorder, CellBorders, CellVAlign, Element, Paragraph, Run, Table, TableCell, TableRow,
    VMerge,
};

use styles::{
    StylesInfo, TableBordersDef, ThemeFonts, parse_alignment, parse_cell_border,
    parse_side_border, parse_styles, parse_table_borders, parse_theme, resolve_font_from_node,
    spacing_line,
};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
pub(super) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub(super) fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

pub(super) fn parse_hex_color(val: &str) -> Option<[u8; 3]> {
    if val == "auto" || val.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Parse a WML boolean toggle element (e.g., w:b, w:i).
/// Present with no val or val != "0"/"false" means true.
pub(super) fn wml_bool(parent: roxmltree::Node, name: &str) -> Option<bool> {
    wml(parent, name).map(|n| {
        n.attribute((WML_NS, "val"))
            .is_none_or(|v| v != "0" && v != "false")
    })
}

pub(super) fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

pub(super) fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

pub(super) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

pub(super) fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<f32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(twips_to_pts)
}

pub(super) fn read_zip_text<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
    name: &str,
) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Flatten SDT wrappers: descend into w:sdtContent and collect effective children.
fn collect_block_nodes<'a>(parent: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if is_wml(child, "sdt") {
            if let Some(content) = wml(child, "sdtContent") {
                nodes.extend(collect_block_nodes(content));
            }
        } else {
            nodes.push(child);
        }
    }
    nodes
}

/// Verbatim XML of one top-level `w:body` child.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyFragment {
    pub local_name: String,
    pub xml: String,
    /// Carries `r:id`, `r:embed` or similar references into the source
    /// package's relationship table.
    pub references_relationships: bool,
    /// Contains a `w:sectPr` (a mid-document section break).
    pub nested_section: bool,
}

/// A parsed attachment document.
#[derive(Clone, Debug)]
pub struct SourceDocument {
    elements: Vec<Element>,
    fragments: Vec<BodyFragment>,
    namespaces: Vec<(String, String)>,
    default_namespace: Option<String>,
    ignorable: Vec<String>,
}

impl SourceDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|_| Error::InvalidDocx("attachment is not a ZIP archive".into()))?;

        let theme = parse_theme(&mut zip);
        let styles = parse_styles(&mut zip, &theme);

        let mut xml_content = String::new();
        zip.by_name("word/document.xml")
            .map_err(|_| Error::InvalidDocx("missing word/document.xml (is this a DOCX file?)".into()))?
            .read_to_string(&mut xml_content)?;

        Self::from_document_xml(&xml_content, &styles, &theme)
    }

    fn from_document_xml(
        xml_content: &str,
        styles: &StylesInfo,
        theme: &ThemeFonts,
    ) -> Result<Self, Error> {
        let xml = roxmltree::Document::parse(xml_content)?;
        let root = xml.root_element();
        let body = wml(root, "body").ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;

        let mut namespaces = Vec::new();
        let mut default_namespace = None;
        for ns in root.namespaces() {
            match ns.name() {
                Some(_) if ns.uri() == XML_NS => {}
                Some(prefix) => namespaces.push((prefix.to_string(), ns.uri().to_string())),
                None => default_namespace = Some(ns.uri().to_string()),
            }
        }
        let ignorable = root
            .attribute((MC_NS, "Ignorable"))
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let fragments: Vec<BodyFragment> = body
            .children()
            .filter(|n| n.is_element() && !is_wml(*n, "sectPr"))
            .map(|node| BodyFragment {
                local_name: node.tag_name().name().to_string(),
                xml: xml_content[node.range()].to_string(),
                references_relationships: node
                    .descendants()
                    .any(|d| d.attributes().any(|a| a.namespace() == Some(REL_NS))),
                nested_section: node.descendants().any(|d| is_wml(d, "sectPr")),
            })
            .collect();

        let ctx = ParseContext { styles, theme };
        let mut elements = Vec::new();
        for node in collect_block_nodes(body) {
            if node.tag_name().namespace() != Some(WML_NS) {
                continue;
            }
            match node.tag_name().name() {
                "p" => {
                    let (para, page_break) = ctx.paragraph(node);
                    if page_break {
                        elements.push(Element::PageBreak);
                    }
                    elements.push(Element::Paragraph(para));
                }
                "tbl" => elements.push(Element::Table(ctx.table(node))),
                _ => {}
            }
        }

        log::debug!(
            "parsed attachment: {} elements, {} fragments, {} namespaces",
            elements.len(),
            fragments.len(),
            namespaces.len()
        );

        Ok(Self {
            elements,
            fragments,
            namespaces,
            default_namespace,
            ignorable,
        })
    }

    /// Body paragraphs and tables in document order. Page breaks found
    /// inside source paragraphs appear as [`Element::PageBreak`].
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.elements.iter().filter_map(|e| match e {
            Element::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.elements.iter().filter_map(|e| match e {
            Element::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Text of every top-level body paragraph, in order, blanks included.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs().map(Paragraph::text).collect()
    }

    pub fn fragments(&self) -> &[BodyFragment] {
        &self.fragments
    }

    /// Prefixed namespace declarations on the source root element.
    pub fn namespaces(&self) -> &[(String, String)] {
        &self.namespaces
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Prefixes listed in the root's `mc:Ignorable`.
    pub fn ignorable(&self) -> &[String] {
        &self.ignorable
    }
}

#[derive(Clone, Copy, PartialEq)]
enum FieldState {
    Outside,
    Instruction,
    Result,
}

struct ParsedRuns {
    runs: Vec<Run>,
    has_page_break: bool,
}

struct ParseContext<'a> {
    styles: &'a StylesInfo,
    theme: &'a ThemeFonts,
}

impl ParseContext<'_> {
    fn paragraph(&self, node: roxmltree::Node) -> (Paragraph, bool) {
        let ppr = wml(node, "pPr");
        let para_style_id = ppr
            .and_then(|ppr| wml_attr(ppr, "pStyle"))
            .unwrap_or("Normal");
        let para_style = self.styles.paragraph_styles.get(para_style_id);

        let spacing = ppr.and_then(|ppr| wml(ppr, "spacing"));
        let ind = ppr.and_then(|ppr| wml(ppr, "ind"));

        let alignment = ppr
            .and_then(|ppr| wml_attr(ppr, "jc"))
            .map(parse_alignment)
            .or_else(|| para_style.and_then(|s| s.alignment));
        let space_before = spacing
            .and_then(|n| twips_attr(n, "before"))
            .or_else(|| para_style.and_then(|s| s.space_before));
        let space_after = spacing
            .and_then(|n| twips_attr(n, "after"))
            .or_else(|| para_style.and_then(|s| s.space_after));
        let line_spacing = spacing
            .and_then(spacing_line)
            .or_else(|| para_style.and_then(|s| s.line_spacing));

        let indent = |attrs: &[&str], inherited: Option<f32>| {
            ind.and_then(|n| attrs.iter().find_map(|a| twips_attr(n, a)))
                .or(inherited)
        };
        let indent_left = indent(&["left", "start"], para_style.and_then(|s| s.indent_left));
        let indent_right = indent(&["right", "end"], para_style.and_then(|s| s.indent_right));
        let indent_first_line =
            indent(&["firstLine"], para_style.and_then(|s| s.indent_first_line));
        let indent_hanging = indent(&["hanging"], para_style.and_then(|s| s.indent_hanging));

        let parsed = self.runs(node);
        let para = Paragraph {
            style: None,
            runs: parsed.runs,
            alignment,
            space_before,
            space_after,
            indent_left,
            indent_right,
            indent_first_line,
            indent_hanging,
            line_spacing,
        };
        (para, parsed.has_page_break)
    }

    fn runs(&self, para_node: roxmltree::Node) -> ParsedRuns {
        let para_style_id = wml(para_node, "pPr")
            .and_then(|ppr| wml_attr(ppr, "pStyle"))
            .unwrap_or("Normal");
        let para_style = self.styles.paragraph_styles.get(para_style_id);

        let style_font_size = para_style
            .and_then(|s| s.font_size)
            .unwrap_or(self.styles.defaults.font_size);
        let style_font_name = para_style
            .and_then(|s| s.font_name.as_deref())
            .unwrap_or(&self.styles.defaults.font_name)
            .to_string();
        let style_bold = para_style.and_then(|s| s.bold).unwrap_or(false);
        let style_italic = para_style.and_then(|s| s.italic).unwrap_or(false);
        let style_color = para_style.and_then(|s| s.color);

        fn collect_run_nodes<'a>(
            parent: roxmltree::Node<'a, 'a>,
            out: &mut Vec<roxmltree::Node<'a, 'a>>,
        ) {
            for child in parent.children() {
                if child.tag_name().namespace() != Some(WML_NS) {
                    continue;
                }
                match child.tag_name().name() {
                    "r" => out.push(child),
                    "hyperlink" | "ins" | "smartTag" | "fldSimple" => collect_run_nodes(child, out),
                    "sdt" => {
                        if let Some(content) = wml(child, "sdtContent") {
                            collect_run_nodes(content, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        let mut run_nodes = Vec::new();
        collect_run_nodes(para_node, &mut run_nodes);

        let mut runs = Vec::new();
        let mut has_page_break = false;
        let mut field = FieldState::Outside;

        for run_node in run_nodes {
            let rpr = wml(run_node, "rPr");
            let char_style = rpr
                .and_then(|n| wml_attr(n, "rStyle"))
                .and_then(|id| self.styles.character_styles.get(id));

            let template = Run {
                text: String::new(),
                font_size: Some(
                    rpr.and_then(|n| wml_attr(n, "sz").or_else(|| wml_attr(n, "szCs")))
                        .and_then(|v| v.parse::<f32>().ok())
                        .map(|hp| hp / 2.0)
                        .or_else(|| char_style.and_then(|cs| cs.font_size))
                        .unwrap_or(style_font_size),
                ),
                font_name: Some(
                    rpr.and_then(|n| wml(n, "rFonts"))
                        .map(|rfonts| resolve_font_from_node(rfonts, self.theme, &style_font_name))
                        .or_else(|| char_style.and_then(|cs| cs.font_name.clone()))
                        .unwrap_or_else(|| style_font_name.clone()),
                ),
                bold: rpr
                    .and_then(|n| wml_bool(n, "b"))
                    .or_else(|| char_style.and_then(|cs| cs.bold))
                    .unwrap_or(style_bold),
                italic: rpr
                    .and_then(|n| wml_bool(n, "i"))
                    .or_else(|| char_style.and_then(|cs| cs.italic))
                    .unwrap_or(style_italic),
                underline: rpr
                    .and_then(|n| wml_attr(n, "u"))
                    .map(|v| v != "none")
                    .or_else(|| char_style.and_then(|cs| cs.underline))
                    .unwrap_or(false),
                color: rpr
                    .and_then(|n| wml_attr(n, "color"))
                    .and_then(parse_hex_color)
                    .or_else(|| char_style.and_then(|cs| cs.color))
                    .or(style_color),
                line_break: false,
                field_code: None,
            };

            let mut pending_text = String::new();
            let flush = |pending: &mut String, runs: &mut Vec<Run>| {
                if !pending.is_empty() {
                    runs.push(Run {
                        text: std::mem::take(pending),
                        ..template.clone()
                    });
                }
            };

            for child in run_node.children() {
                if child.tag_name().namespace() != Some(WML_NS) {
                    continue;
                }
                match child.tag_name().name() {
                    "fldChar" => match child.attribute((WML_NS, "fldCharType")) {
                        Some("begin") => field = FieldState::Instruction,
                        Some("separate") => field = FieldState::Result,
                        Some("end") => field = FieldState::Outside,
                        _ => {}
                    },
                    "t" if field != FieldState::Instruction => {
                        if let Some(t) = child.text() {
                            // Word treats newlines in w:t as whitespace; only w:br breaks lines
                            pending_text.push_str(&t.replace('\n', " "));
                        }
                    }
                    "tab" if field != FieldState::Instruction => pending_text.push('\t'),
                    "br" => {
                        if child.attribute((WML_NS, "type")) == Some("page") {
                            has_page_break = true;
                        } else {
                            flush(&mut pending_text, &mut runs);
                            runs.push(Run {
                                line_break: true,
                                ..template.clone()
                            });
                        }
                    }
                    "cr" => {
                        flush(&mut pending_text, &mut runs);
                        runs.push(Run {
                            line_break: true,
                            ..template.clone()
                        });
                    }
                    _ => {}
                }
            }
            flush(&mut pending_text, &mut runs);
        }

        ParsedRuns {
            runs,
            has_page_break,
        }
    }

    fn table(&self, node: roxmltree::Node) -> Table {
        let col_widths: Vec<f32> = wml(node, "tblGrid")
            .into_iter()
            .flat_map(|grid| grid.children())
            .filter(|n| is_wml(*n, "gridCol"))
            .map(|n| twips_attr(n, "w").unwrap_or(0.0))
            .collect();

        let tbl_pr = wml(node, "tblPr");
        let inline_borders = tbl_pr
            .and_then(|pr| wml(pr, "tblBorders"))
            .map(parse_table_borders);
        let style_borders = tbl_pr
            .and_then(|pr| wml_attr(pr, "tblStyle"))
            .and_then(|id| self.styles.table_border_styles.get(id));
        let table_borders: Option<&TableBordersDef> = inline_borders.as_ref().or(style_borders);

        let tbl_rows: Vec<_> = collect_block_nodes(node)
            .into_iter()
            .filter(|n| is_wml(*n, "tr"))
            .collect();
        let num_rows = tbl_rows.len();
        let num_cols = col_widths.len();

        let mut rows = Vec::with_capacity(num_rows);
        for (ri, tr) in tbl_rows.iter().enumerate() {
            let tr_pr = wml(*tr, "trPr");
            let grid_skip = |name: &str| {
                tr_pr
                    .and_then(|pr| wml_attr(pr, name))
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(0)
            };
            let grid_before = grid_skip("gridBefore");
            let grid_after = grid_skip("gridAfter");
            let (height, height_exact) = tr_pr
                .and_then(|pr| wml(pr, "trHeight"))
                .map(|h| {
                    let val = twips_attr(h, "val");
                    let exact = h.attribute((WML_NS, "hRule")) == Some("exact");
                    (val, exact)
                })
                .unwrap_or((None, false));

            let mut cells = Vec::new();
            let mut grid_col = grid_before as usize;
            for tc in collect_block_nodes(*tr)
                .into_iter()
                .filter(|n| is_wml(*n, "tc"))
            {
                let ci = grid_col;
                let tc_pr = wml(tc, "tcPr");

                let grid_span = tc_pr
                    .and_then(|pr| wml_attr(pr, "gridSpan"))
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(1)
                    .max(1);

                let v_merge = tc_pr
                    .and_then(|pr| wml(pr, "vMerge"))
                    .map(|n| match n.attribute((WML_NS, "val")) {
                        Some("restart") => VMerge::Restart,
                        _ => VMerge::Continue,
                    })
                    .unwrap_or(VMerge::None);

                let v_align = tc_pr
                    .and_then(|pr| wml_attr(pr, "vAlign"))
                    .map(|v| match v {
                        "center" => CellVAlign::Center,
                        "bottom" => CellVAlign::Bottom,
                        _ => CellVAlign::Top,
                    })
                    .unwrap_or(CellVAlign::Top);

                let width = tc_pr
                    .and_then(|pr| wml(pr, "tcW"))
                    .filter(|w| w.attribute((WML_NS, "type")).is_none_or(|t| t == "dxa"))
                    .and_then(|w| twips_attr(w, "w"))
                    .filter(|w| *w > 0.0)
                    .or_else(|| {
                        let span = col_widths.get(ci..ci + grid_span as usize)?;
                        Some(span.iter().sum::<f32>()).filter(|w| *w > 0.0)
                    });

                let span_end = ci + grid_span as usize;
                let fallback = table_borders
                    .map(|tb| CellBorders {
                        top: if ri == 0 { tb.top } else { tb.inside_h },
                        bottom: if ri + 1 == num_rows { tb.bottom } else { tb.inside_h },
                        left: if ci == 0 { tb.left } else { tb.inside_v },
                        right: if span_end >= num_cols { tb.right } else { tb.inside_v },
                    })
                    .unwrap_or_default();
                let borders = tc_pr
                    .and_then(|pr| wml(pr, "tcBorders"))
                    .map(|bdr| {
                        let pick = |b: CellBorder, f| if b.present { b } else { f };
                        CellBorders {
                            top: pick(parse_cell_border(bdr, "top"), fallback.top),
                            bottom: pick(parse_cell_border(bdr, "bottom"), fallback.bottom),
                            left: pick(parse_side_border(bdr, "left", "start"), fallback.left),
                            right: pick(parse_side_border(bdr, "right", "end"), fallback.right),
                        }
                    })
                    .unwrap_or(fallback);

                let shading = tc_pr
                    .and_then(|pr| wml(pr, "shd"))
                    .and_then(|shd| shd.attribute((WML_NS, "fill")))
                    .filter(|f| *f != "auto" && *f != "none")
                    .and_then(parse_hex_color);

                let paragraphs = tc
                    .children()
                    .filter(|n| is_wml(*n, "p"))
                    .map(|p| self.paragraph(p).0)
                    .collect();

                cells.push(TableCell {
                    width,
                    paragraphs,
                    borders,
                    shading,
                    grid_span,
                    v_merge,
                    v_align,
                });
                grid_col += grid_span as usize;
            }

            rows.push(TableRow {
                cells,
                height,
                height_exact,
                grid_before,
                grid_after,
            });
        }

        let bordered = table_borders.is_some_and(TableBordersDef::any)
            || rows
                .iter()
                .flat_map(|r| r.cells.iter())
                .any(|c| c.borders.any());

        Table {
            col_widths,
            rows,
            bordered,
        }
    }
}
