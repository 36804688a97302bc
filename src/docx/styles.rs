use std::collections::HashMap;
use std::io::{Read, Seek};

use crate::model::{Alignment, CellBorder, LineSpacing};

use super::{DML_NS, WML_NS, parse_hex_color, read_zip_text, twips_attr, wml, wml_attr, wml_bool};

fn dml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(DML_NS))
}

fn typeface<'a>(node: roxmltree::Node<'a, 'a>, script: &str) -> Option<&'a str> {
    dml(node, script)
        .and_then(|n| n.attribute("typeface"))
        .filter(|tf| !tf.is_empty())
}

pub(super) struct ThemeFonts {
    pub(super) major: String,
    pub(super) minor: String,
    pub(super) major_east_asia: Option<String>,
    pub(super) minor_east_asia: Option<String>,
}

pub(super) struct StyleDefaults {
    pub(super) font_size: f32,
    pub(super) font_name: String,
}

#[derive(Default)]
pub(super) struct ParagraphStyle {
    pub(super) font_size: Option<f32>,
    pub(super) font_name: Option<String>,
    pub(super) bold: Option<bool>,
    pub(super) italic: Option<bool>,
    pub(super) color: Option<[u8; 3]>,
    pub(super) space_before: Option<f32>,
    pub(super) space_after: Option<f32>,
    pub(super) alignment: Option<Alignment>,
    pub(super) line_spacing: Option<LineSpacing>,
    pub(super) indent_left: Option<f32>,
    pub(super) indent_right: Option<f32>,
    pub(super) indent_first_line: Option<f32>,
    pub(super) indent_hanging: Option<f32>,
    pub(super) based_on: Option<String>,
}

pub(super) struct CharacterStyle {
    pub(super) font_size: Option<f32>,
    pub(super) font_name: Option<String>,
    pub(super) bold: Option<bool>,
    pub(super) italic: Option<bool>,
    pub(super) underline: Option<bool>,
    pub(super) color: Option<[u8; 3]>,
}

pub(super) struct TableBordersDef {
    pub(super) top: CellBorder,
    pub(super) bottom: CellBorder,
    pub(super) left: CellBorder,
    pub(super) right: CellBorder,
    pub(super) inside_h: CellBorder,
    pub(super) inside_v: CellBorder,
}

impl TableBordersDef {
    pub(super) fn any(&self) -> bool {
        [
            self.top,
            self.bottom,
            self.left,
            self.right,
            self.inside_h,
            self.inside_v,
        ]
        .iter()
        .any(|b| b.present)
    }
}

pub(super) struct StylesInfo {
    pub(super) defaults: StyleDefaults,
    pub(super) paragraph_styles: HashMap<String, ParagraphStyle>,
    pub(super) character_styles: HashMap<String, CharacterStyle>,
    pub(super) table_border_styles: HashMap<String, TableBordersDef>,
}

pub(super) fn parse_alignment(val: &str) -> Alignment {
    match val {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        "both" | "distribute" => Alignment::Justify,
        _ => Alignment::Left,
    }
}

/// `w:spacing/@line` with its `lineRule`: exact and atLeast are twips,
/// auto is 240ths of a line.
pub(super) fn parse_line_spacing(spacing: roxmltree::Node, line_val: f32) -> LineSpacing {
    match spacing.attribute((WML_NS, "lineRule")) {
        Some("exact") => LineSpacing::Exact(line_val / 20.0),
        Some("atLeast") => LineSpacing::AtLeast(line_val / 20.0),
        _ => LineSpacing::Auto(line_val / 240.0),
    }
}

pub(super) fn spacing_line(spacing: roxmltree::Node) -> Option<LineSpacing> {
    spacing
        .attribute((WML_NS, "line"))
        .and_then(|v| v.parse::<f32>().ok())
        .map(|val| parse_line_spacing(spacing, val))
}

pub(super) fn parse_cell_border(parent: roxmltree::Node, name: &str) -> CellBorder {
    let Some(n) = wml(parent, name) else {
        return CellBorder::default();
    };
    let val = n.attribute((WML_NS, "val")).unwrap_or("none");
    if val == "nil" || val == "none" {
        return CellBorder::default();
    }
    let width = n
        .attribute((WML_NS, "sz"))
        .and_then(|v| v.parse::<f32>().ok())
        .map(|v| v / 8.0)
        .unwrap_or(0.5);
    let color = n.attribute((WML_NS, "color")).and_then(parse_hex_color);
    CellBorder::visible(color, width)
}

/// Left/right borders may be spelled start/end.
pub(super) fn parse_side_border(parent: roxmltree::Node, name: &str, alt: &str) -> CellBorder {
    let border = parse_cell_border(parent, name);
    if border.present {
        border
    } else {
        parse_cell_border(parent, alt)
    }
}

pub(super) fn parse_table_borders(tbl_borders: roxmltree::Node) -> TableBordersDef {
    TableBordersDef {
        top: parse_cell_border(tbl_borders, "top"),
        bottom: parse_cell_border(tbl_borders, "bottom"),
        left: parse_side_border(tbl_borders, "left", "start"),
        right: parse_side_border(tbl_borders, "right", "end"),
        inside_h: parse_cell_border(tbl_borders, "insideH"),
        inside_v: parse_cell_border(tbl_borders, "insideV"),
    }
}

pub(super) fn parse_theme<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> ThemeFonts {
    let mut fonts = ThemeFonts {
        major: String::from("Calibri Light"),
        minor: String::from("Calibri"),
        major_east_asia: None,
        minor_east_asia: None,
    };

    let names: Vec<String> = zip.file_names().map(|s| s.to_string()).collect();
    let theme_name = names
        .iter()
        .find(|n| n.starts_with("word/theme/") && n.ends_with(".xml"));
    let Some(xml_content) = theme_name.and_then(|name| read_zip_text(zip, name)) else {
        return fonts;
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        return fonts;
    };

    for node in xml.descendants() {
        if node.tag_name().namespace() != Some(DML_NS) {
            continue;
        }
        match node.tag_name().name() {
            "majorFont" => {
                if let Some(tf) = typeface(node, "latin") {
                    fonts.major = tf.to_string();
                }
                fonts.major_east_asia = typeface(node, "ea").map(str::to_string);
            }
            "minorFont" => {
                if let Some(tf) = typeface(node, "latin") {
                    fonts.minor = tf.to_string();
                }
                fonts.minor_east_asia = typeface(node, "ea").map(str::to_string);
            }
            _ => {}
        }
    }

    fonts
}

/// Pick the font a CJK document actually shows: explicit East Asian face,
/// then the East Asian theme face, then the Latin face, then the Latin theme.
pub(super) fn resolve_font_from_node(
    rfonts: roxmltree::Node,
    theme: &ThemeFonts,
    default_font: &str,
) -> String {
    if let Some(f) = rfonts
        .attribute((WML_NS, "eastAsia"))
        .filter(|f| !f.is_empty())
    {
        return f.to_string();
    }
    let east_asia_theme = match rfonts.attribute((WML_NS, "eastAsiaTheme")) {
        Some("majorEastAsia") => theme.major_east_asia.clone(),
        Some("minorEastAsia") => theme.minor_east_asia.clone(),
        _ => None,
    };
    if let Some(f) = east_asia_theme {
        return f;
    }
    if let Some(f) = rfonts.attribute((WML_NS, "ascii")).filter(|f| !f.is_empty()) {
        return f.to_string();
    }
    match rfonts.attribute((WML_NS, "asciiTheme")) {
        Some("majorHAnsi") => theme.major.clone(),
        Some("minorHAnsi") => theme.minor.clone(),
        _ => default_font.to_string(),
    }
}

fn styles_of_type<'a>(
    root: roxmltree::Node<'a, 'a>,
    kind: &'a str,
) -> impl Iterator<Item = (&'a str, roxmltree::Node<'a, 'a>)> {
    root.children()
        .filter(|n| n.tag_name().name() == "style" && n.tag_name().namespace() == Some(WML_NS))
        .filter(move |n| n.attribute((WML_NS, "type")) == Some(kind))
        .filter_map(|n| n.attribute((WML_NS, "styleId")).map(|id| (id, n)))
}

pub(super) fn parse_styles<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
    theme: &ThemeFonts,
) -> StylesInfo {
    let mut info = StylesInfo {
        defaults: StyleDefaults {
            font_size: 10.5,
            font_name: theme.minor_east_asia.clone().unwrap_or_else(|| theme.minor.clone()),
        },
        paragraph_styles: HashMap::new(),
        character_styles: HashMap::new(),
        table_border_styles: HashMap::new(),
    };

    let Some(xml_content) = read_zip_text(zip, "word/styles.xml") else {
        return info;
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        return info;
    };
    let root = xml.root_element();

    if let Some(rpr) = wml(root, "docDefaults")
        .and_then(|n| wml(n, "rPrDefault"))
        .and_then(|n| wml(n, "rPr"))
    {
        if let Some(sz_val) = wml_attr(rpr, "sz").and_then(|v| v.parse::<f32>().ok()) {
            info.defaults.font_size = sz_val / 2.0;
        }
        if let Some(rfonts) = wml(rpr, "rFonts") {
            info.defaults.font_name =
                resolve_font_from_node(rfonts, theme, &info.defaults.font_name);
        }
    }

    for (style_id, style_node) in styles_of_type(root, "paragraph") {
        let ppr = wml(style_node, "pPr");
        let spacing = ppr.and_then(|n| wml(n, "spacing"));
        let ind = ppr.and_then(|n| wml(n, "ind"));
        let rpr = wml(style_node, "rPr");

        let style = ParagraphStyle {
            font_size: rpr
                .and_then(|n| wml_attr(n, "sz"))
                .and_then(|v| v.parse::<f32>().ok())
                .map(|hp| hp / 2.0),
            font_name: rpr
                .and_then(|n| wml(n, "rFonts"))
                .map(|rfonts| resolve_font_from_node(rfonts, theme, &info.defaults.font_name)),
            bold: rpr.and_then(|n| wml_bool(n, "b")),
            italic: rpr.and_then(|n| wml_bool(n, "i")),
            color: rpr
                .and_then(|n| wml_attr(n, "color"))
                .and_then(parse_hex_color),
            space_before: spacing.and_then(|n| twips_attr(n, "before")),
            space_after: spacing.and_then(|n| twips_attr(n, "after")),
            alignment: ppr.and_then(|n| wml_attr(n, "jc")).map(parse_alignment),
            line_spacing: spacing.and_then(spacing_line),
            indent_left: ind.and_then(|n| twips_attr(n, "left").or_else(|| twips_attr(n, "start"))),
            indent_right: ind.and_then(|n| twips_attr(n, "right").or_else(|| twips_attr(n, "end"))),
            indent_first_line: ind.and_then(|n| twips_attr(n, "firstLine")),
            indent_hanging: ind.and_then(|n| twips_attr(n, "hanging")),
            based_on: wml_attr(style_node, "basedOn").map(str::to_string),
        };
        info.paragraph_styles.insert(style_id.to_string(), style);
    }

    resolve_based_on(&mut info.paragraph_styles);

    for (style_id, style_node) in styles_of_type(root, "character") {
        let Some(rpr) = wml(style_node, "rPr") else {
            continue;
        };
        info.character_styles.insert(
            style_id.to_string(),
            CharacterStyle {
                font_size: wml_attr(rpr, "sz")
                    .and_then(|v| v.parse::<f32>().ok())
                    .map(|hp| hp / 2.0),
                font_name: wml(rpr, "rFonts")
                    .map(|rfonts| resolve_font_from_node(rfonts, theme, &info.defaults.font_name)),
                bold: wml_bool(rpr, "b"),
                italic: wml_bool(rpr, "i"),
                underline: wml(rpr, "u")
                    .and_then(|n| n.attribute((WML_NS, "val")))
                    .map(|v| v != "none"),
                color: wml_attr(rpr, "color").and_then(parse_hex_color),
            },
        );
    }

    for (style_id, style_node) in styles_of_type(root, "table") {
        if let Some(tbl_borders) = wml(style_node, "tblPr").and_then(|pr| wml(pr, "tblBorders")) {
            info.table_border_styles
                .insert(style_id.to_string(), parse_table_borders(tbl_borders));
        }
    }

    info
}

fn resolve_based_on(styles: &mut HashMap<String, ParagraphStyle>) {
    let ids: Vec<String> = styles.keys().cloned().collect();
    for id in ids {
        let mut chain: Vec<String> = Vec::new();
        let mut current = id.clone();
        loop {
            if chain.contains(&current) {
                break;
            }
            chain.push(current.clone());
            match styles.get(&current).and_then(|s| s.based_on.clone()) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Walk ancestors from furthest to closest; closer ones override.
        macro_rules! inherit {
            ($field:ident, $inherited:expr, $s:expr) => {
                if $s.$field.is_some() {
                    $inherited.$field = $s.$field.clone();
                }
            };
        }

        let mut inh = ParagraphStyle::default();
        for ancestor_id in chain.iter().rev() {
            if let Some(s) = styles.get(ancestor_id) {
                inherit!(font_name, inh, s);
                inherit!(font_size, inh, s);
                inherit!(bold, inh, s);
                inherit!(italic, inh, s);
                inherit!(color, inh, s);
                inherit!(alignment, inh, s);
                inherit!(space_before, inh, s);
                inherit!(space_after, inh, s);
                inherit!(line_spacing, inh, s);
                inherit!(indent_left, inh, s);
                inherit!(indent_right, inh, s);
                inherit!(indent_first_line, inh, s);
                inherit!(indent_hanging, inh, s);
            }
        }

        if let Some(s) = styles.get_mut(&id) {
            s.font_name = s.font_name.take().or(inh.font_name);
            s.font_size = s.font_size.or(inh.font_size);
            s.bold = s.bold.or(inh.bold);
            s.italic = s.italic.or(inh.italic);
            s.color = s.color.or(inh.color);
            s.alignment = s.alignment.or(inh.alignment);
            s.space_before = s.space_before.or(inh.space_before);
            s.space_after = s.space_after.or(inh.space_after);
            s.line_spacing = s.line_spacing.or(inh.line_spacing);
            s.indent_left = s.indent_left.or(inh.indent_left);
            s.indent_right = s.indent_right.or(inh.indent_right);
            s.indent_first_line = s.indent_first_line.or(inh.indent_first_line);
            s.indent_hanging = s.indent_hanging.or(inh.indent_hanging);
        }
    }
}
