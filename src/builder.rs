use crate::config::AssembleOptions;
use crate::error::Error;
use crate::model::{Alignment, Attachment, Block, BlockKind, DocumentTree, Element, Paragraph, Run};
use crate::styles::{self, StyleRegistry};

const CHINESE_NUMERALS: [&str; 20] = [
    "一", "二", "三", "四", "五", "六", "七", "八", "九", "十", "十一", "十二", "十三", "十四",
    "十五", "十六", "十七", "十八", "十九", "二十",
];

const TITLE_CONNECTIVES: [char; 4] = ['的', '和', '与', '及'];

/// Chinese numeral for 1..=20, Arabic digits beyond.
pub fn chinese_numeral(n: usize) -> String {
    match n {
        1..=20 => CHINESE_NUMERALS[n - 1].to_string(),
        _ => n.to_string(),
    }
}

/// `一、` style marker for a level-1 heading.
pub fn header1_marker(n: usize) -> String {
    format!("{}、", chinese_numeral(n))
}

/// `（一）` style marker for a level-2 heading.
pub fn header2_marker(n: usize) -> String {
    format!("（{}）", chinese_numeral(n))
}

/// Split a long title into two lines near its midpoint.
///
/// Titles of at most `max_chars` characters come back as a single line.
/// Otherwise the window `mid-3..=mid+3` is scanned for a connective
/// (`的`, `和`, `与`, `及`, or `关于`) and the title is split right after the
/// first one found; with no connective the split falls on the midpoint.
pub fn wrap_title(title: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = title.chars().collect();
    let len = chars.len();
    if len <= max_chars {
        return vec![title.to_string()];
    }

    let mid = len / 2;
    let mut split = mid;
    for i in mid.saturating_sub(3)..=(mid + 3) {
        if i >= len {
            break;
        }
        if TITLE_CONNECTIVES.contains(&chars[i]) {
            split = i + 1;
            break;
        }
        if chars[i] == '关' && chars.get(i + 1) == Some(&'于') {
            split = i + 2;
            break;
        }
    }
    if split >= len {
        return vec![title.to_string()];
    }

    vec![
        chars[..split].iter().collect(),
        chars[split..].iter().collect(),
    ]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuilderState {
    Empty,
    TitleAdded,
    BodyAdded,
    ReferencesAdded,
    SignatureAdded,
    AttachmentsAdded,
    Finalized,
}

impl BuilderState {
    pub fn name(self) -> &'static str {
        match self {
            BuilderState::Empty => "Empty",
            BuilderState::TitleAdded => "TitleAdded",
            BuilderState::BodyAdded => "BodyAdded",
            BuilderState::ReferencesAdded => "ReferencesAdded",
            BuilderState::SignatureAdded => "SignatureAdded",
            BuilderState::AttachmentsAdded => "AttachmentsAdded",
            BuilderState::Finalized => "Finalized",
        }
    }
}

/// Assembles the document tree section by section.
///
/// Sections must be added in order: title, body, optional attachment
/// references, signature, then zero or more attachments. Calling a step out
/// of order returns [`Error::BuilderState`] and leaves the tree untouched.
pub struct DocumentBuilder {
    registry: StyleRegistry,
    options: AssembleOptions,
    tree: DocumentTree,
    state: BuilderState,
    attachments_begun: usize,
}

impl DocumentBuilder {
    pub fn new(options: AssembleOptions) -> Self {
        Self::with_registry(StyleRegistry::standard(), options)
    }

    pub fn with_registry(registry: StyleRegistry, options: AssembleOptions) -> Self {
        Self {
            registry,
            options,
            tree: DocumentTree::new(),
            state: BuilderState::Empty,
            attachments_begun: 0,
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn options(&self) -> &AssembleOptions {
        &self.options
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    /// Number of attachment sections opened so far.
    pub fn attachment_count(&self) -> usize {
        self.attachments_begun
    }

    fn expect_state(&self, operation: &'static str, allowed: &[BuilderState]) -> Result<(), Error> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::BuilderState {
                operation,
                state: self.state.name(),
            })
        }
    }

    fn blank(&self, style: &str) -> Result<Element, Error> {
        Ok(Element::Paragraph(self.registry.apply(style, "")?))
    }

    pub fn add_title(&mut self, title: &str) -> Result<(), Error> {
        self.expect_state("add title", &[BuilderState::Empty])?;

        let lines = wrap_title(title.trim(), self.options.title_wrap_chars);
        let mut para = self.registry.empty(styles::TITLE)?;
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                para.runs.push(Run {
                    line_break: true,
                    ..self.registry.run(styles::TITLE, "")?
                });
            }
            para.runs.push(self.registry.run(styles::TITLE, line)?);
        }
        if lines.len() > 1 {
            log::debug!("title wrapped after {} chars", lines[0].chars().count());
        }

        let blank = self.blank(styles::BODY)?;
        self.tree.push(Element::Paragraph(para));
        self.tree.push(blank);
        self.state = BuilderState::TitleAdded;
        Ok(())
    }

    /// Render classified blocks with regenerated numbering. A level-1
    /// heading restarts levels 2 and 3; a level-2 heading restarts level 3.
    pub fn add_body(&mut self, blocks: &[Block]) -> Result<(), Error> {
        self.expect_state("add body", &[BuilderState::TitleAdded])?;

        let (mut h1, mut h2, mut h3) = (0usize, 0usize, 0usize);
        let mut rendered = Vec::with_capacity(blocks.len());
        for block in blocks {
            let para = match block.kind {
                BlockKind::Header1 => {
                    h1 += 1;
                    h2 = 0;
                    h3 = 0;
                    let text = format!("{}{}", header1_marker(h1), block.text);
                    self.registry.apply(styles::HEADING1, &text)?
                }
                BlockKind::Header2 => {
                    h2 += 1;
                    h3 = 0;
                    let text = format!("{}{}", header2_marker(h2), block.text);
                    self.registry.apply(styles::HEADING2, &text)?
                }
                BlockKind::Header3 => {
                    h3 += 1;
                    let text = format!("{h3}.{}", block.text);
                    self.registry.apply(styles::HEADING3, &text)?
                }
                BlockKind::Title => self.registry.apply(styles::TITLE, &block.text)?,
                BlockKind::ListItem | BlockKind::Paragraph => {
                    self.registry.apply(styles::BODY, &block.text)?
                }
            };
            rendered.push(Element::Paragraph(para));
        }

        log::debug!("rendered {} body blocks", rendered.len());
        self.tree.extend(rendered);
        self.state = BuilderState::BodyAdded;
        Ok(())
    }

    /// The `附件：` block listing attachments by display title. Adds nothing
    /// for an empty list.
    pub fn add_references(&mut self, attachments: &[Attachment]) -> Result<(), Error> {
        self.expect_state("add references", &[BuilderState::BodyAdded])?;

        let mut paras = Vec::new();
        if !attachments.is_empty() {
            paras.push(self.registry.apply(styles::BODY, "")?);
            if let [only] = attachments {
                paras.push(self.reference_line(
                    "附件：附件1、",
                    &only.display_title(1),
                    self.options.reference_indent_pt,
                )?);
            } else {
                paras.push(self.reference_line("附件：", "", self.options.reference_indent_pt)?);
                for (i, attachment) in attachments.iter().enumerate() {
                    let order = i + 1;
                    paras.push(self.reference_line(
                        &format!("附件{order}、"),
                        &attachment.display_title(order),
                        self.options.reference_item_indent_pt,
                    )?);
                }
            }
        }

        self.tree.extend(paras.into_iter().map(Element::Paragraph));
        self.state = BuilderState::ReferencesAdded;
        Ok(())
    }

    fn reference_line(&self, label: &str, title: &str, indent: f32) -> Result<Paragraph, Error> {
        let mut para = self.registry.empty(styles::BODY)?;
        para.alignment = Some(Alignment::Left);
        para.indent_first_line = Some(indent);
        para.runs.push(Run {
            bold: true,
            ..self.registry.run(styles::BODY, label)?
        });
        if !title.is_empty() {
            para.runs.push(self.registry.run(styles::BODY, title)?);
        }
        Ok(para)
    }

    pub fn add_signature(&mut self, department: &str, date: &str) -> Result<(), Error> {
        self.expect_state(
            "add signature",
            &[BuilderState::BodyAdded, BuilderState::ReferencesAdded],
        )?;

        let mut elements = vec![self.blank(styles::BODY)?, self.blank(styles::BODY)?];
        for line in [department.trim(), date.trim()] {
            let mut para = self.registry.apply(styles::BODY, line)?;
            para.alignment = Some(Alignment::Right);
            para.indent_first_line = Some(0.0);
            elements.push(Element::Paragraph(para));
        }

        self.tree.extend(elements);
        self.state = BuilderState::SignatureAdded;
        Ok(())
    }

    /// Open attachment section `order` (1-based, consecutive): page break,
    /// the `附件N` label, then a blank line.
    pub fn begin_attachment(&mut self, order: usize) -> Result<(), Error> {
        self.expect_state(
            "begin attachment",
            &[BuilderState::SignatureAdded, BuilderState::AttachmentsAdded],
        )?;
        if order != self.attachments_begun + 1 {
            return Err(Error::BuilderState {
                operation: "begin attachment out of sequence",
                state: self.state.name(),
            });
        }

        let label = self
            .registry
            .apply(styles::ATTACHMENT_TITLE, &format!("附件{order}"))?;
        let blank = self.blank(styles::BODY)?;
        self.tree.push(Element::PageBreak);
        self.tree.push(Element::Paragraph(label));
        self.tree.push(blank);

        self.attachments_begun = order;
        self.state = BuilderState::AttachmentsAdded;
        Ok(())
    }

    /// Append content to the currently open attachment section.
    pub fn append(&mut self, elements: Vec<Element>) -> Result<(), Error> {
        self.expect_state("append attachment content", &[BuilderState::AttachmentsAdded])?;
        self.tree.extend(elements);
        Ok(())
    }

    /// Record namespace declarations needed by spliced content. All or nothing.
    pub fn declare_namespaces(
        &mut self,
        decls: &[(String, String)],
        ignorable: &[String],
    ) -> Result<(), Error> {
        self.expect_state("declare namespaces", &[BuilderState::AttachmentsAdded])?;
        self.tree.declare_namespaces(decls, ignorable)
    }

    pub fn finish(&mut self) -> Result<DocumentTree, Error> {
        self.expect_state(
            "finish",
            &[BuilderState::SignatureAdded, BuilderState::AttachmentsAdded],
        )?;
        self.state = BuilderState::Finalized;
        Ok(std::mem::take(&mut self.tree))
    }
}
