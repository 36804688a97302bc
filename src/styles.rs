use std::collections::HashMap;

use crate::error::Error;
use crate::model::{Alignment, LineSpacing, Paragraph, Run};

pub const TITLE: &str = "title";
pub const HEADING1: &str = "heading1";
pub const HEADING2: &str = "heading2";
pub const HEADING3: &str = "heading3";
pub const BODY: &str = "body";
pub const ATTACHMENT_BODY: &str = "attachment-body";
pub const ATTACHMENT_TITLE: &str = "attachment-title";
pub const ATTACHMENT_CONTENT_TITLE: &str = "attachment-content-title";

/// A named paragraph style. Frozen once registered.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleSpec {
    pub name: &'static str,
    pub font_family: &'static str,
    pub size_pt: f32,
    pub bold: bool,
    pub alignment: Alignment,
    /// Exact line height.
    pub line_spacing_pt: f32,
    pub first_line_indent_pt: f32,
}

impl StyleSpec {
    /// `styleId` used in `word/styles.xml`, e.g. `attachment-title` ->
    /// `AttachmentTitle`.
    pub fn style_id(&self) -> String {
        self.name
            .split('-')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect()
    }
}

const fn spec(
    name: &'static str,
    font_family: &'static str,
    size_pt: f32,
    bold: bool,
    alignment: Alignment,
    line_spacing_pt: f32,
    first_line_indent_pt: f32,
) -> StyleSpec {
    StyleSpec {
        name,
        font_family,
        size_pt,
        bold,
        alignment,
        line_spacing_pt,
        first_line_indent_pt,
    }
}

pub static STANDARD_STYLES: [StyleSpec; 8] = [
    spec(TITLE, "方正小标宋简体", 22.0, false, Alignment::Center, 35.0, 0.0),
    spec(HEADING1, "黑体", 16.0, false, Alignment::Left, 30.0, 32.0),
    spec(HEADING2, "楷体_GB2312", 16.0, false, Alignment::Left, 30.0, 32.0),
    spec(HEADING3, "仿宋_GB2312", 16.0, true, Alignment::Left, 30.0, 32.0),
    spec(BODY, "仿宋_GB2312", 16.0, false, Alignment::Left, 30.0, 32.0),
    spec(ATTACHMENT_BODY, "黑体", 16.0, false, Alignment::Left, 30.0, 0.0),
    spec(ATTACHMENT_TITLE, "黑体", 16.0, true, Alignment::Left, 30.0, 0.0),
    spec(ATTACHMENT_CONTENT_TITLE, "黑体", 16.0, true, Alignment::Center, 30.0, 0.0),
];

/// Per-document style table. Every run and paragraph the builder emits is
/// formatted through here.
#[derive(Clone, Debug, Default)]
pub struct StyleRegistry {
    specs: Vec<StyleSpec>,
    index: HashMap<&'static str, usize>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the eight GB/T 9704 styles.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for spec in &STANDARD_STYLES {
            registry.register(spec.clone());
        }
        registry
    }

    /// Returns false when a style of that name already exists; the existing
    /// spec is kept.
    pub fn register(&mut self, spec: StyleSpec) -> bool {
        if self.index.contains_key(spec.name) {
            return false;
        }
        self.index.insert(spec.name, self.specs.len());
        self.specs.push(spec);
        true
    }

    pub fn get(&self, name: &str) -> Result<&StyleSpec, Error> {
        self.index
            .get(name)
            .map(|&i| &self.specs[i])
            .ok_or_else(|| Error::MissingStyle(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered specs in registration order.
    pub fn specs(&self) -> &[StyleSpec] {
        &self.specs
    }

    pub fn run(&self, name: &str, text: &str) -> Result<Run, Error> {
        let spec = self.get(name)?;
        Ok(Run {
            text: text.to_string(),
            font_name: Some(spec.font_family.to_string()),
            font_size: Some(spec.size_pt),
            bold: spec.bold,
            ..Run::default()
        })
    }

    /// A one-run paragraph carrying the style's paragraph formatting.
    pub fn apply(&self, name: &str, text: &str) -> Result<Paragraph, Error> {
        let run = self.run(name, text)?;
        let mut para = self.empty(name)?;
        para.runs.push(run);
        Ok(para)
    }

    /// A paragraph with the style's formatting and no runs.
    pub fn empty(&self, name: &str) -> Result<Paragraph, Error> {
        let spec = self.get(name)?;
        Ok(Paragraph {
            style: Some(spec.name.to_string()),
            alignment: Some(spec.alignment),
            line_spacing: Some(LineSpacing::Exact(spec.line_spacing_pt)),
            indent_first_line: Some(spec.first_line_indent_pt),
            ..Paragraph::default()
        })
    }
}
