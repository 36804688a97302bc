//! OOXML package writer.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::{AssembleOptions, pts_to_twips};
use crate::docx::{MC_NS, REL_NS, WML_NS};
use crate::error::Error;
use crate::model::{
    Alignment, CellBorder, CellVAlign, DocumentTree, Element, FieldCode, LineSpacing, Paragraph,
    Run, Table, TableCell, VMerge,
};
use crate::styles::{self, StyleRegistry, StyleSpec};

/// Prefixes always declared on the `w:document` root.
pub const BASE_NAMESPACES: &[(&str, &str)] = &[
    ("wpc", "http://schemas.microsoft.com/office/word/2010/wordprocessingCanvas"),
    ("mc", MC_NS),
    ("o", "urn:schemas-microsoft-com:office:office"),
    ("r", REL_NS),
    ("m", "http://schemas.openxmlformats.org/officeDocument/2006/math"),
    ("v", "urn:schemas-microsoft-com:vml"),
    ("wp14", "http://schemas.microsoft.com/office/word/2010/wordprocessingDrawing"),
    ("wp", "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"),
    ("w10", "urn:schemas-microsoft-com:office:word"),
    ("w", WML_NS),
    ("w14", "http://schemas.microsoft.com/office/word/2010/wordml"),
    ("w15", "http://schemas.microsoft.com/office/word/2012/wordml"),
    ("wpg", "http://schemas.microsoft.com/office/word/2010/wordprocessingGroup"),
    ("wpi", "http://schemas.microsoft.com/office/word/2010/wordprocessingInk"),
    ("wne", "http://schemas.microsoft.com/office/word/2006/wordml"),
    ("wps", "http://schemas.microsoft.com/office/word/2010/wordprocessingShape"),
];

const BASE_IGNORABLE: &[&str] = &["w14", "w15", "wp14"];

const FOOTER_REL_ID: &str = "rIdFooter1";

/// Descriptive properties for `docProps/core.xml`.
pub struct DocumentMeta<'a> {
    pub title: &'a str,
    pub author: &'a str,
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Not allowed in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            '\u{FFFE}' | '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

fn hex(color: [u8; 3]) -> String {
    format!("{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}

fn half_points(size: f32) -> i64 {
    (size * 2.0).round() as i64
}

fn alignment_val(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

fn write_run_props(out: &mut String, run: &Run) {
    let mut props = String::new();
    if let Some(font) = &run.font_name {
        let f = escape(font);
        let _ = write!(
            props,
            r#"<w:rFonts w:ascii="{f}" w:hAnsi="{f}" w:eastAsia="{f}" w:cs="{f}"/>"#
        );
    }
    if run.bold {
        props.push_str("<w:b/><w:bCs/>");
    }
    if run.italic {
        props.push_str("<w:i/><w:iCs/>");
    }
    if let Some(color) = run.color {
        let _ = write!(props, r#"<w:color w:val="{}"/>"#, hex(color));
    }
    if let Some(size) = run.font_size {
        let hp = half_points(size);
        let _ = write!(props, r#"<w:sz w:val="{hp}"/><w:szCs w:val="{hp}"/>"#);
    }
    if run.underline {
        props.push_str(r#"<w:u w:val="single"/>"#);
    }
    if !props.is_empty() {
        let _ = write!(out, "<w:rPr>{props}</w:rPr>");
    }
}

fn write_run(out: &mut String, run: &Run) {
    if let Some(FieldCode::Page) = run.field_code {
        let mut field_run = |body: &str| {
            out.push_str("<w:r>");
            write_run_props(out, run);
            out.push_str(body);
            out.push_str("</w:r>");
        };
        field_run(r#"<w:fldChar w:fldCharType="begin"/>"#);
        field_run(r#"<w:instrText xml:space="preserve"> PAGE </w:instrText>"#);
        field_run(r#"<w:fldChar w:fldCharType="separate"/>"#);
        field_run("<w:t>1</w:t>");
        field_run(r#"<w:fldChar w:fldCharType="end"/>"#);
        return;
    }

    out.push_str("<w:r>");
    write_run_props(out, run);
    if run.line_break {
        out.push_str("<w:br/>");
    }
    for (i, segment) in run.text.split('\t').enumerate() {
        if i > 0 {
            out.push_str("<w:tab/>");
        }
        if !segment.is_empty() {
            let _ = write!(out, r#"<w:t xml:space="preserve">{}</w:t>"#, escape(segment));
        }
    }
    out.push_str("</w:r>");
}

fn write_spacing(out: &mut String, before: Option<f32>, after: Option<f32>, line: Option<LineSpacing>) {
    if before.is_none() && after.is_none() && line.is_none() {
        return;
    }
    out.push_str("<w:spacing");
    if let Some(v) = before {
        let _ = write!(out, r#" w:before="{}""#, pts_to_twips(v));
    }
    if let Some(v) = after {
        let _ = write!(out, r#" w:after="{}""#, pts_to_twips(v));
    }
    match line {
        Some(LineSpacing::Exact(pt)) => {
            let _ = write!(out, r#" w:line="{}" w:lineRule="exact""#, pts_to_twips(pt));
        }
        Some(LineSpacing::AtLeast(pt)) => {
            let _ = write!(out, r#" w:line="{}" w:lineRule="atLeast""#, pts_to_twips(pt));
        }
        Some(LineSpacing::Auto(mult)) => {
            let _ = write!(out, r#" w:line="{}" w:lineRule="auto""#, (mult * 240.0).round() as i64);
        }
        None => {}
    }
    out.push_str("/>");
}

fn write_paragraph(out: &mut String, para: &Paragraph, registry: &StyleRegistry) -> Result<(), Error> {
    let mut ppr = String::new();
    if let Some(name) = para.style.as_deref() {
        let spec = registry.get(name)?;
        let _ = write!(ppr, r#"<w:pStyle w:val="{}"/>"#, spec.style_id());
    }
    write_spacing(&mut ppr, para.space_before, para.space_after, para.line_spacing);

    let indents = [
        ("left", para.indent_left),
        ("right", para.indent_right),
        ("hanging", para.indent_hanging),
        ("firstLine", para.indent_first_line.filter(|_| para.indent_hanging.is_none())),
    ];
    if indents.iter().any(|(_, v)| v.is_some()) {
        ppr.push_str("<w:ind");
        for (attr, value) in indents {
            if let Some(v) = value {
                let _ = write!(ppr, r#" w:{attr}="{}""#, pts_to_twips(v));
            }
        }
        ppr.push_str("/>");
    }
    if let Some(alignment) = para.alignment {
        let _ = write!(ppr, r#"<w:jc w:val="{}"/>"#, alignment_val(alignment));
    }

    out.push_str("<w:p>");
    if !ppr.is_empty() {
        let _ = write!(out, "<w:pPr>{ppr}</w:pPr>");
    }
    for run in &para.runs {
        write_run(out, run);
    }
    out.push_str("</w:p>");
    Ok(())
}

fn write_border(out: &mut String, side: &str, border: &CellBorder) {
    if !border.present {
        return;
    }
    let color = border.color.map(hex).unwrap_or_else(|| "auto".into());
    let size = (border.width * 8.0).round().max(2.0) as i64;
    let _ = write!(
        out,
        r#"<w:{side} w:val="single" w:sz="{size}" w:space="0" w:color="{color}"/>"#
    );
}

fn write_cell(out: &mut String, cell: &TableCell, registry: &StyleRegistry) -> Result<(), Error> {
    out.push_str("<w:tc><w:tcPr>");
    match cell.width {
        Some(w) => {
            let _ = write!(out, r#"<w:tcW w:w="{}" w:type="dxa"/>"#, pts_to_twips(w));
        }
        None => out.push_str(r#"<w:tcW w:w="0" w:type="auto"/>"#),
    }
    if cell.grid_span > 1 {
        let _ = write!(out, r#"<w:gridSpan w:val="{}"/>"#, cell.grid_span);
    }
    match cell.v_merge {
        VMerge::Restart => out.push_str(r#"<w:vMerge w:val="restart"/>"#),
        VMerge::Continue => out.push_str("<w:vMerge/>"),
        VMerge::None => {}
    }
    if cell.borders.any() {
        out.push_str("<w:tcBorders>");
        write_border(out, "top", &cell.borders.top);
        write_border(out, "left", &cell.borders.left);
        write_border(out, "bottom", &cell.borders.bottom);
        write_border(out, "right", &cell.borders.right);
        out.push_str("</w:tcBorders>");
    }
    if let Some(fill) = cell.shading {
        let _ = write!(out, r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#, hex(fill));
    }
    match cell.v_align {
        CellVAlign::Center => out.push_str(r#"<w:vAlign w:val="center"/>"#),
        CellVAlign::Bottom => out.push_str(r#"<w:vAlign w:val="bottom"/>"#),
        CellVAlign::Top => {}
    }
    out.push_str("</w:tcPr>");

    // A cell must end with a paragraph
    if cell.paragraphs.is_empty() {
        out.push_str("<w:p/>");
    }
    for para in &cell.paragraphs {
        write_paragraph(out, para, registry)?;
    }
    out.push_str("</w:tc>");
    Ok(())
}

fn write_table(out: &mut String, table: &Table, registry: &StyleRegistry) -> Result<(), Error> {
    out.push_str(r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:jc w:val="center"/>"#);
    if table.bordered {
        let line = CellBorder::visible(None, 0.5);
        out.push_str("<w:tblBorders>");
        for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            write_border(out, side, &line);
        }
        out.push_str("</w:tblBorders>");
    }
    out.push_str(r#"<w:tblLayout w:type="fixed"/><w:tblLook w:val="04A0"/></w:tblPr><w:tblGrid>"#);
    for w in &table.col_widths {
        let _ = write!(out, r#"<w:gridCol w:w="{}"/>"#, pts_to_twips(*w));
    }
    out.push_str("</w:tblGrid>");

    for row in &table.rows {
        out.push_str("<w:tr>");
        let mut tr_pr = String::new();
        if row.grid_before > 0 {
            let _ = write!(tr_pr, r#"<w:gridBefore w:val="{}"/>"#, row.grid_before);
        }
        if row.grid_after > 0 {
            let _ = write!(tr_pr, r#"<w:gridAfter w:val="{}"/>"#, row.grid_after);
        }
        if let Some(h) = row.height {
            let rule = if row.height_exact { "exact" } else { "atLeast" };
            let _ = write!(
                tr_pr,
                r#"<w:trHeight w:val="{}" w:hRule="{rule}"/>"#,
                pts_to_twips(h)
            );
        }
        if !tr_pr.is_empty() {
            let _ = write!(out, "<w:trPr>{tr_pr}</w:trPr>");
        }
        for cell in &row.cells {
            write_cell(out, cell, registry)?;
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
    Ok(())
}

fn write_element(out: &mut String, element: &Element, registry: &StyleRegistry) -> Result<(), Error> {
    match element {
        Element::Paragraph(p) => write_paragraph(out, p, registry)?,
        Element::Table(t) => write_table(out, t, registry)?,
        Element::PageBreak => out.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#),
        Element::Raw(raw) => out.push_str(&raw.xml),
    }
    Ok(())
}

fn root_declarations(tree: &DocumentTree) -> String {
    let mut decls = String::new();
    for (prefix, uri) in BASE_NAMESPACES {
        let _ = write!(decls, r#" xmlns:{prefix}="{uri}""#);
    }
    for (prefix, uri) in tree.namespaces() {
        let _ = write!(decls, r#" xmlns:{prefix}="{}""#, escape(uri));
    }

    let mut ignorable: Vec<&str> = BASE_IGNORABLE.to_vec();
    for prefix in tree.ignorable() {
        let declared = BASE_NAMESPACES.iter().any(|(p, _)| *p == prefix.as_str())
            || tree.namespaces().contains_key(prefix);
        if declared && !ignorable.contains(&prefix.as_str()) {
            ignorable.push(prefix.as_str());
        }
    }
    let _ = write!(decls, r#" mc:Ignorable="{}""#, ignorable.join(" "));
    decls
}

/// `word/document.xml`. Fails with [`Error::MissingStyle`] when a paragraph
/// names a style the registry does not hold.
pub fn document_xml(
    tree: &DocumentTree,
    registry: &StyleRegistry,
    options: &AssembleOptions,
) -> Result<String, Error> {
    let mut out = String::with_capacity(64 * 1024);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    let _ = write!(out, "\n<w:document{}><w:body>", root_declarations(tree));
    for element in tree.elements() {
        write_element(&mut out, element, registry)?;
    }

    let page = &options.page;
    let _ = write!(
        out,
        concat!(
            r#"<w:sectPr><w:footerReference w:type="default" r:id="{rel}"/>"#,
            r#"<w:pgSz w:w="{w}" w:h="{h}"/>"#,
            r#"<w:pgMar w:top="{top}" w:right="{right}" w:bottom="{bottom}" w:left="{left}" w:header="{header}" w:footer="{footer}" w:gutter="0"/>"#,
            r#"<w:pgNumType w:start="1"/><w:cols w:space="425"/><w:docGrid w:type="lines" w:linePitch="579"/></w:sectPr>"#,
        ),
        rel = FOOTER_REL_ID,
        w = pts_to_twips(page.page_width),
        h = pts_to_twips(page.page_height),
        top = pts_to_twips(page.margin_top),
        right = pts_to_twips(page.margin_right),
        bottom = pts_to_twips(page.margin_bottom),
        left = pts_to_twips(page.margin_left),
        header = pts_to_twips(page.header_margin),
        footer = pts_to_twips(page.footer_margin),
    );
    out.push_str("</w:body></w:document>");
    Ok(out)
}

fn style_xml(out: &mut String, spec: &StyleSpec) {
    let id = spec.style_id();
    let _ = write!(
        out,
        r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="{id}"><w:name w:val="{}"/><w:basedOn w:val="Normal"/><w:qFormat/><w:pPr>"#,
        spec.name
    );
    write_spacing(out, Some(0.0), Some(0.0), Some(LineSpacing::Exact(spec.line_spacing_pt)));
    let _ = write!(
        out,
        r#"<w:ind w:firstLine="{}"/><w:jc w:val="{}"/></w:pPr>"#,
        pts_to_twips(spec.first_line_indent_pt),
        alignment_val(spec.alignment)
    );
    write_run_props(
        out,
        &Run {
            font_name: Some(spec.font_family.to_string()),
            font_size: Some(spec.size_pt),
            bold: spec.bold,
            ..Run::default()
        },
    );
    out.push_str("</w:style>");
}

pub fn styles_xml(registry: &StyleRegistry) -> Result<String, Error> {
    let body = registry.get(styles::BODY)?;
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    let _ = write!(out, "\n<w:styles xmlns:w=\"{WML_NS}\"><w:docDefaults><w:rPrDefault>");
    write_run_props(
        &mut out,
        &Run {
            font_name: Some(body.font_family.to_string()),
            font_size: Some(body.size_pt),
            ..Run::default()
        },
    );
    out.push_str(concat!(
        r#"</w:rPrDefault><w:pPrDefault><w:pPr><w:jc w:val="both"/></w:pPr></w:pPrDefault></w:docDefaults>"#,
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
        r#"<w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/><w:uiPriority w:val="1"/><w:semiHidden/><w:unhideWhenUsed/></w:style>"#,
        r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:uiPriority w:val="99"/><w:semiHidden/><w:unhideWhenUsed/><w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>"#,
    ));
    for spec in registry.specs() {
        style_xml(&mut out, spec);
    }
    out.push_str("</w:styles>");
    Ok(out)
}

pub fn footer_xml(registry: &StyleRegistry, options: &AssembleOptions) -> Result<String, Error> {
    let body = registry.get(styles::BODY)?;
    let para = Paragraph {
        alignment: Some(Alignment::Center),
        runs: vec![Run {
            font_name: Some(body.font_family.to_string()),
            font_size: Some(options.footer_font_size),
            field_code: Some(FieldCode::Page),
            ..Run::default()
        }],
        ..Paragraph::default()
    };
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    let _ = write!(out, "\n<w:ftr xmlns:w=\"{WML_NS}\" xmlns:r=\"{REL_NS}\">");
    write_paragraph(&mut out, &para, registry)?;
    out.push_str("</w:ftr>");
    Ok(out)
}

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    r#"<Override PartName="/word/settings.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"/>"#,
    r#"<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#,
    r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
    "</Types>",
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#,
    "</Relationships>",
);

fn document_rels_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            r#"<Relationship Id="rIdSettings" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings" Target="settings.xml"/>"#,
            r#"<Relationship Id="{footer}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>"#,
            "</Relationships>",
        ),
        footer = FOOTER_REL_ID
    )
}

fn settings_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:settings xmlns:w="{w}"><w:zoom w:percent="100"/><w:defaultTabStop w:val="420"/>"#,
            r#"<w:characterSpacingControl w:val="compressPunctuation"/>"#,
            r#"<w:compat><w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/></w:compat>"#,
            "</w:settings>",
        ),
        w = WML_NS
    )
}

fn core_xml(meta: &DocumentMeta, options: &AssembleOptions) -> String {
    let created = options
        .timestamp
        .unwrap_or_else(chrono::Utc::now)
        .format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title><dc:creator>{author}</dc:creator><cp:lastModifiedBy>{author}</cp:lastModifiedBy>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{created}</dcterms:modified>"#,
            "</cp:coreProperties>",
        ),
        title = escape(meta.title),
        author = escape(meta.author),
        created = created,
    )
}

fn app_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            "<Application>gbdoc</Application><AppVersion>{version}</AppVersion>",
            "</Properties>",
        ),
        version = env!("CARGO_PKG_VERSION")
    )
}

/// Serialise `tree` into a complete `.docx` byte stream.
pub fn write_package(
    tree: &DocumentTree,
    registry: &StyleRegistry,
    meta: &DocumentMeta,
    options: &AssembleOptions,
) -> Result<Vec<u8>, Error> {
    let parts: [(&str, String); 9] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("docProps/core.xml", core_xml(meta, options)),
        ("docProps/app.xml", app_xml()),
        ("word/document.xml", document_xml(tree, registry, options)?),
        ("word/styles.xml", styles_xml(registry)?),
        ("word/settings.xml", settings_xml()),
        ("word/footer1.xml", footer_xml(registry, options)?),
        ("word/_rels/document.xml.rels", document_rels_xml()),
    ];

    let file_options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in &parts {
        zip.start_file(*name, file_options)?;
        zip.write_all(content.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}
