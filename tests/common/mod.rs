#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use gbdoc::model::{Element, Paragraph};
use gbdoc::{AssembleOptions, DocumentTree, Request};
use zip::write::SimpleFileOptions;

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A paragraph with a single run.
pub fn p(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>")
}

/// A table cell; `span` > 1 adds a gridSpan.
pub fn tc(text: &str, span: u16) -> String {
    let pr = if span > 1 {
        format!("<w:tcPr><w:gridSpan w:val=\"{span}\"/></w:tcPr>")
    } else {
        String::new()
    };
    format!("<w:tc>{pr}{}</w:tc>", p(text))
}

pub fn tr(cells: &[String]) -> String {
    format!("<w:tr>{}</w:tr>", cells.concat())
}

/// A bordered table with `cols` equal grid columns of 1 inch.
pub fn tbl(cols: usize, rows: &[String]) -> String {
    let grid = "<w:gridCol w:w=\"1440\"/>".repeat(cols);
    format!(
        "<w:tbl><w:tblPr><w:tblBorders><w:top w:val=\"single\" w:sz=\"4\"/><w:bottom w:val=\"single\" w:sz=\"4\"/></w:tblBorders></w:tblPr><w:tblGrid>{grid}</w:tblGrid>{}</w:tbl>",
        rows.concat()
    )
}

/// `word/document.xml` wrapping `body` with the given root attributes.
pub fn document_xml_with(root_attrs: &str, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"{W_NS}\" xmlns:r=\"{R_NS}\"{root_attrs}><w:body>{body}\
         <w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/></w:sectPr></w:body></w:document>"
    )
}

/// Zip the given parts into an in-memory package.
pub fn package(parts: &[(&str, &str)]) -> Vec<u8> {
    let options = SimpleFileOptions::default();
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(*name, options).expect("start zip entry");
        zip.write_all(content.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Minimal `.docx` whose body is `body`.
pub fn docx(body: &str) -> Vec<u8> {
    let document = document_xml_with("", body);
    package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("word/document.xml", &document),
    ])
}

pub fn read_part(docx: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).expect("output is a zip");
    let mut part = archive.by_name(name).expect("part present");
    let mut out = String::new();
    part.read_to_string(&mut out).expect("utf-8 part");
    out
}

pub fn part_names(docx: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(docx)).expect("output is a zip");
    archive.file_names().map(str::to_string).collect()
}

/// Text of every `w:p` directly under `w:body`, concatenating `w:t`.
pub fn body_paragraph_texts(document_xml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(document_xml).expect("document.xml parses");
    let body = doc
        .descendants()
        .find(|n| n.has_tag_name((W_NS, "body")))
        .expect("w:body");
    body.children()
        .filter(|n| n.has_tag_name((W_NS, "p")))
        .map(|p| {
            p.descendants()
                .filter(|n| n.has_tag_name((W_NS, "t")))
                .filter_map(|t| t.text())
                .collect()
        })
        .collect()
}

pub fn fixed_options() -> AssembleOptions {
    AssembleOptions {
        timestamp: chrono::DateTime::from_timestamp(1_750_000_000, 0),
        ..AssembleOptions::default()
    }
}

pub fn request(body: &str) -> Request {
    Request {
        title: "关于做好年度统计工作的通知".into(),
        issuing_department: "市统计局".into(),
        issue_date: "2025年7月11日".into(),
        body_markdown: body.into(),
        receiving_department: None,
        attachments: Vec::new(),
    }
}

pub fn paragraphs(elements: &[Element]) -> Vec<&Paragraph> {
    elements
        .iter()
        .filter_map(|e| match e {
            Element::Paragraph(p) => Some(p),
            _ => None,
        })
        .collect()
}

pub fn tree_texts(tree: &DocumentTree) -> Vec<String> {
    tree.paragraphs().map(Paragraph::text).collect()
}
